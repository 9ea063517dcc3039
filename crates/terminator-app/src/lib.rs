//! terminator-app: the application around the terminal core
//!
//! Settings, command line, session wiring, and the per-display command
//! server. The widget layer plugs in through the `TerminalPane` capability;
//! without one, sessions run against the bundled headless pane.

pub mod cli;
pub mod server;
pub mod session;
pub mod settings;

use std::sync::Arc;

use parking_lot::Mutex;

use terminator_core::dispatch::ui_channel;

use crate::cli::SessionSpec;
use crate::session::{Session, SessionTracker};
use crate::settings::Settings;

/// Run the application. Returns the process exit code: 0 on normal
/// shutdown, 1 on fatal initialization failure.
pub fn run() -> i32 {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match cli::parse_arguments(&args) {
        Ok(invocation) => invocation,
        Err(err) => {
            eprintln!("terminator: {}", err);
            return 1;
        }
    };

    let mut settings = Settings::new();
    if let Err(err) = settings.load_user_file() {
        log::warn!("Couldn't read settings file: {}", err);
    }
    for resource in &invocation.resources {
        // Bad resources are reported and ignored.
        if let Err(err) = settings.apply_resource(resource) {
            eprintln!("terminator: {}", err);
        }
    }

    if invocation.show_version {
        println!("terminator {}", env!("CARGO_PKG_VERSION"));
        return 0;
    }
    if invocation.show_help {
        print_usage(&settings);
        return 0;
    }

    // This thread is the UI thread: the only mutator of screen buffers.
    let (dispatcher, event_loop) = ui_channel(2);
    let tracker = SessionTracker::new(dispatcher.clone());
    let sessions: Arc<Mutex<Vec<Session>>> = Arc::new(Mutex::new(Vec::new()));

    for spec in &invocation.sessions {
        match Session::spawn(spec, &settings, dispatcher.clone(), tracker.clone()) {
            Ok(session) => sessions.lock().push(session),
            Err(err) => {
                eprintln!("terminator: couldn't start session: {}", err);
                return 1;
            }
        }
    }

    start_command_server(&settings, &dispatcher, &tracker, &sessions);

    while tracker.active_count() > 0 {
        if !event_loop.run_one() {
            break;
        }
    }
    0
}

/// Serve "open new tab" requests from other invocations on this display.
/// Best-effort: a failure to bind only costs us the server.
fn start_command_server(
    settings: &Settings,
    dispatcher: &terminator_core::dispatch::UiDispatcher,
    tracker: &SessionTracker,
    sessions: &Arc<Mutex<Vec<Session>>>,
) {
    let path = server::socket_path(&settings.log_directory());
    let handler: server::CommandHandler = {
        let settings = settings.clone();
        let dispatcher = dispatcher.clone();
        let tracker = tracker.clone();
        let sessions = sessions.clone();
        Arc::new(move |command| {
            let spec = if command == "open-shell" {
                SessionSpec::default()
            } else if let Some(rest) = command.strip_prefix("open ") {
                SessionSpec {
                    command: Some(rest.to_string()),
                    ..Default::default()
                }
            } else {
                return Err(format!("unknown command \"{}\"", command));
            };
            match Session::spawn(&spec, &settings, dispatcher.clone(), tracker.clone()) {
                Ok(session) => {
                    sessions.lock().push(session);
                    Ok(())
                }
                Err(err) => Err(err.to_string()),
            }
        })
    };
    if let Err(err) = server::start(path, handler) {
        log::warn!("Couldn't start the command server: {}", err);
    }
}

fn print_usage(settings: &Settings) {
    println!(
        "Usage: terminator [--help | --version] [-xrm <resource-string>]... \
         [[-n <name>] [--working-directory <directory>] [<command>]]..."
    );
    println!();
    println!("Current resource settings:");
    let mut stdout = std::io::stdout();
    if let Err(err) = settings.show_options(&mut stdout, true) {
        log::warn!("Couldn't show the resource settings: {}", err);
    }
}
