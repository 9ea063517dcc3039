//! Command line parsing
//!
//! The grammar is the traditional X11-flavored one:
//!
//! ```text
//! terminator [--help | --version] [-xrm <resource-string>]...
//!            [[-n <name>] [--working-directory <dir>] [<command>]]...
//! ```
//!
//! `-n` and `--working-directory` apply to the next `<command>` and then
//! reset. We can't hope to imitate the shell's parsing of a command
//! string, so each `<command>` is passed along unmolested for the user's
//! shell to interpret.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CliError {
    #[error("option \"{0}\" requires an argument")]
    MissingArgument(String),
}

/// One terminal to open: a command (or the default shell) plus its
/// per-session decorations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSpec {
    pub name: Option<String>,
    pub working_directory: Option<PathBuf>,
    pub command: Option<String>,
}

/// The parsed command line.
#[derive(Debug, Default, PartialEq)]
pub struct Invocation {
    pub show_help: bool,
    pub show_version: bool,
    pub resources: Vec<String>,
    pub sessions: Vec<SessionSpec>,
}

pub fn parse_arguments(args: &[String]) -> Result<Invocation, CliError> {
    let mut invocation = Invocation::default();
    let mut name: Option<String> = None;
    let mut working_directory: Option<PathBuf> = None;

    let mut words = args.iter();
    while let Some(word) = words.next() {
        match word.as_str() {
            "-h" | "-help" | "--help" => invocation.show_help = true,
            "--version" => invocation.show_version = true,
            "-xrm" => {
                let resource = words
                    .next()
                    .ok_or_else(|| CliError::MissingArgument("-xrm".to_string()))?;
                invocation.resources.push(resource.clone());
            }
            "-n" => {
                let value = words
                    .next()
                    .ok_or_else(|| CliError::MissingArgument("-n".to_string()))?;
                name = Some(value.clone());
            }
            "--working-directory" => {
                let value = words.next().ok_or_else(|| {
                    CliError::MissingArgument("--working-directory".to_string())
                })?;
                working_directory = Some(PathBuf::from(value));
            }
            command => {
                invocation.sessions.push(SessionSpec {
                    name: name.take(),
                    working_directory: working_directory.take(),
                    command: Some(command.to_string()),
                });
            }
        }
    }

    // No commands: one shell, still honoring a trailing -n or
    // --working-directory.
    if invocation.sessions.is_empty() {
        invocation.sessions.push(SessionSpec {
            name,
            working_directory,
            command: None,
        });
    }

    Ok(invocation)
}
