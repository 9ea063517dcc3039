//! Terminal sessions
//!
//! A session ties one screen buffer to one child process via a
//! `TerminalControl`, with a pane observer that reports back to the
//! application. The bundled pane is headless: it logs what a widget layer
//! would render and closes the session when the child is done.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use terminator_core::buffer::{BufferConfig, TextBuffer};
use terminator_core::control::{TerminalControl, TerminalPane};
use terminator_core::dispatch::UiDispatcher;
use terminator_core::pty::{PtyError, PtySize};

use crate::cli::SessionSpec;
use crate::settings::Settings;

/// Counts live sessions and wakes the UI loop when one goes away, so the
/// application knows when to exit.
#[derive(Clone)]
pub struct SessionTracker {
    active: Arc<AtomicUsize>,
    dispatcher: UiDispatcher,
}

impl SessionTracker {
    pub fn new(dispatcher: UiDispatcher) -> SessionTracker {
        SessionTracker {
            active: Arc::new(AtomicUsize::new(0)),
            dispatcher,
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    fn register(&self) {
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    fn session_closed(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
        // Nudge the UI loop so it re-checks the count.
        let _ = self.dispatcher.invoke_and_wait(|| {});
    }
}

/// One terminal tab: buffer, control, and a display name.
pub struct Session {
    pub buffer: Arc<Mutex<TextBuffer>>,
    pub control: TerminalControl,
    pub title: String,
}

impl Session {
    /// Spawn the session described by `spec` and start consuming output.
    pub fn spawn(
        spec: &SessionSpec,
        settings: &Settings,
        dispatcher: UiDispatcher,
        tracker: SessionTracker,
    ) -> Result<Session, PtyError> {
        let cols = settings.initial_column_count();
        let rows = settings.initial_row_count();
        let command = shell_command(spec.command.as_deref(), settings.is_login_shell());
        let title = spec
            .name
            .clone()
            .or_else(|| spec.command.clone())
            .unwrap_or_else(|| command[0].clone());

        let buffer = Arc::new(Mutex::new(TextBuffer::new(
            cols,
            rows,
            BufferConfig {
                scroll_tty_output: settings.is_scroll_tty_output(),
                ..Default::default()
            },
        )));

        let pane = Arc::new(HeadlessPane {
            label: title.clone(),
            tracker: tracker.clone(),
            closed: AtomicBool::new(false),
        });

        let control = TerminalControl::spawn(
            &command,
            spec.working_directory.as_deref(),
            PtySize {
                rows: rows as u16,
                cols: cols as u16,
                ..Default::default()
            },
            buffer.clone(),
            pane,
            dispatcher,
            &settings.log_directory(),
        )?;

        tracker.register();
        control.start();

        Ok(Session {
            buffer,
            control,
            title,
        })
    }
}

/// The argv for a session. A command string goes to the user's shell
/// unparsed; without one we start the shell itself, as a login shell when
/// configured.
fn shell_command(command: Option<&str>, login_shell: bool) -> Vec<String> {
    let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
    shell_command_with(shell, command, login_shell)
}

fn shell_command_with(shell: String, command: Option<&str>, login_shell: bool) -> Vec<String> {
    match command {
        Some(command) => vec![shell, "-c".to_string(), command.to_string()],
        None if login_shell => vec![shell, "-l".to_string()],
        None => vec![shell],
    }
}

/// A pane with no widgets behind it. Bell, title, and cursor changes are
/// logged; a finished child closes the session.
struct HeadlessPane {
    label: String,
    tracker: SessionTracker,
    closed: AtomicBool,
}

impl TerminalPane for HeadlessPane {
    fn flash(&self) {
        log::debug!("Bell in session \"{}\"", self.label);
    }

    fn set_cursor_visible(&self, visible: bool) {
        log::trace!("Session \"{}\" cursor visible: {}", self.label, visible);
    }

    fn set_window_title(&self, title: &str) {
        log::info!("Session \"{}\" retitled to \"{}\"", self.label, title);
    }

    fn should_hold_on_exit(&self, _exit_status: i32) -> bool {
        // Without a widget layer there's nobody to look at a held pane.
        false
    }

    fn close_session(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.tracker.session_closed();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_command_forms() {
        let zsh = || "/bin/zsh".to_string();
        assert_eq!(
            shell_command_with(zsh(), Some("make -j4"), true),
            vec!["/bin/zsh", "-c", "make -j4"]
        );
        assert_eq!(shell_command_with(zsh(), None, true), vec!["/bin/zsh", "-l"]);
        assert_eq!(shell_command_with(zsh(), None, false), vec!["/bin/zsh"]);
    }

    #[test]
    fn test_session_runs_command_to_completion() {
        use terminator_core::dispatch::ui_channel;

        std::env::set_var("SHELL", "/bin/sh");
        let (dispatcher, event_loop) = ui_channel(2);
        let tracker = SessionTracker::new(dispatcher.clone());
        let settings = Settings::new();
        let spec = SessionSpec {
            name: Some("probe".to_string()),
            working_directory: None,
            command: Some("printf session-probe-output".to_string()),
        };

        let session = Session::spawn(&spec, &settings, dispatcher, tracker.clone()).unwrap();
        assert_eq!(session.title, "probe");
        assert_eq!(tracker.active_count(), 1);

        while tracker.active_count() > 0 {
            assert!(event_loop.run_one());
        }
        assert!(session
            .buffer
            .lock()
            .row_text(0)
            .contains("session-probe-output"));
    }
}
