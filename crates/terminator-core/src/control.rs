//! Terminal stream control
//!
//! `TerminalControl` sits between the PTY and the screen model: it owns the
//! reader thread that decodes child output into action batches, the
//! single-threaded writer that feeds user input back to the child, and the
//! connection-loss protocol that reports how the child ended.
//!
//! Threading per session: the reader blocks on the master fd and is the
//! only thread that submits to the UI dispatch; the writer drains a queue
//! so writes never interleave; fork and waitpid happen on the process-wide
//! forker/reaper thread (see the pty module). The screen model itself is
//! only touched from the UI thread.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::action::{Mode, TerminalAction};
use crate::buffer::TextBuffer;
use crate::dispatch::{DispatchError, UiDispatcher};
use crate::log_writer::LogWriter;
use crate::parser::Parser;
use crate::pty::{PtyError, PtyProcess, PtySize};

/// On Mac OS this seems to be an optimal read size; any smaller and we do
/// more reads from chatty programs, larger doesn't reduce the count.
const INPUT_BUFFER_SIZE: usize = 8 * 1024;

/// The narrow capability the front-end hands to a session. The interpreter
/// only ever needs these five things from its pane.
pub trait TerminalPane: Send + Sync {
    /// Ring the bell (visually or audibly, the pane's choice).
    fn flash(&self);
    /// Show or hide the text cursor.
    fn set_cursor_visible(&self, visible: bool);
    /// The child retitled the window.
    fn set_window_title(&self, title: &str);
    /// After a normal exit, should the pane stay open showing the notice?
    fn should_hold_on_exit(&self, exit_status: i32) -> bool;
    /// The session is over and the pane should go away.
    fn close_session(&self);
}

struct ControlInner {
    pty: Arc<PtyProcess>,
    buffer: Arc<Mutex<TextBuffer>>,
    pane: Arc<dyn TerminalPane>,
    dispatcher: UiDispatcher,
    writer_tx: Sender<Vec<u8>>,
    process_running: Arc<AtomicBool>,
    destroyed: AtomicBool,
    started: AtomicBool,
    log: Mutex<LogWriter>,
}

/// One session's stream control object, from spawn to reap.
pub struct TerminalControl {
    inner: Arc<ControlInner>,
    writer_rx: Mutex<Option<Receiver<Vec<u8>>>>,
}

impl TerminalControl {
    /// Start `command` under a fresh PTY. `start` must be called afterwards
    /// to begin consuming output.
    pub fn spawn(
        command: &[String],
        working_directory: Option<&Path>,
        size: PtySize,
        buffer: Arc<Mutex<TextBuffer>>,
        pane: Arc<dyn TerminalPane>,
        dispatcher: UiDispatcher,
        log_directory: &Path,
    ) -> Result<TerminalControl, PtyError> {
        let log = LogWriter::new(command, log_directory);
        let pty = Arc::new(PtyProcess::spawn(command, working_directory, size)?);
        let (writer_tx, writer_rx) = std::sync::mpsc::channel();

        Ok(TerminalControl {
            inner: Arc::new(ControlInner {
                pty,
                buffer,
                pane,
                dispatcher,
                writer_tx,
                process_running: Arc::new(AtomicBool::new(true)),
                destroyed: AtomicBool::new(false),
                started: AtomicBool::new(false),
                log: Mutex::new(log),
            }),
            writer_rx: Mutex::new(Some(writer_rx)),
        })
    }

    /// Start the reader and writer threads. Idempotent: detaching a pane
    /// can call this again without effect.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(writer_rx) = self.writer_rx.lock().take() else {
            return;
        };

        {
            let pty = self.inner.pty.clone();
            let running = self.inner.process_running.clone();
            let _ = std::thread::Builder::new()
                .name(format!("pty writer for {}", pty.process_id()))
                .spawn(move || run_writer(writer_rx, pty, running));
        }

        {
            let inner = self.inner.clone();
            let name = format!(
                "process {} ({}) listener",
                inner.pty.process_id(),
                inner.pty.slave_name()
            );
            let _ = std::thread::Builder::new()
                .name(name)
                .spawn(move || run_reader(inner));
        }
    }

    /// Queue user input for the child, UTF-8 encoded. Writes are delivered
    /// in submission order; writes after the child died are dropped.
    pub fn send_utf8(&self, text: &str) {
        let _ = self.inner.writer_tx.send(text.as_bytes().to_vec());
    }

    /// The screen was resized. Must be called from the UI thread: applies
    /// the resize to the model, then tells the kernel via TIOCSWINSZ.
    pub fn size_changed(&self, size: PtySize) -> io::Result<()> {
        self.inner.buffer.lock().process_actions(&[TerminalAction::Resize {
            cols: size.cols as usize,
            rows: size.rows as usize,
        }]);
        self.inner.pty.resize(size)
    }

    /// Cancel the session: hang up the child. The reader sees EOF and
    /// finishes the termination protocol.
    pub fn destroy(&self) -> io::Result<()> {
        self.inner.destroyed.store(true, Ordering::SeqCst);
        self.inner.pty.destroy()
    }

    pub fn process_id(&self) -> i32 {
        self.inner.pty.process_id()
    }

    pub fn is_process_running(&self) -> bool {
        self.inner.process_running.load(Ordering::SeqCst)
    }

    pub fn buffer(&self) -> Arc<Mutex<TextBuffer>> {
        self.inner.buffer.clone()
    }

    /// The session log path, or why logging is off.
    pub fn log_info(&self) -> String {
        self.inner.log.lock().info().to_string()
    }

    pub fn set_log_suspended(&self, suspended: bool) {
        self.inner.log.lock().set_suspended(suspended);
    }
}

fn run_reader(inner: Arc<ControlInner>) {
    let mut parser = Parser::new();
    let mut buf = [0u8; INPUT_BUFFER_SIZE];
    loop {
        let count = match inner.pty.read(&mut buf) {
            Ok(0) => break,
            Ok(count) => count,
            Err(err) => {
                // Linux reports EIO on the master once the child is gone;
                // either way the connection is lost, not the program.
                log::info!("Read from {:?} finished: {}", inner.pty, err);
                break;
            }
        };
        inner.log.lock().append(&buf[..count]);
        let actions = parser.process(&buf[..count]);
        if flush_actions(&inner, actions).is_err() {
            // The UI is gone; nobody is left to show anything to.
            return;
        }
    }
    handle_process_termination(&inner, &mut parser);
    inner.log.lock().close();
}

/// Hand a batch to the UI thread and wait for it to be applied, then relay
/// the pane-visible side effects.
fn flush_actions(inner: &Arc<ControlInner>, actions: Vec<TerminalAction>) -> Result<(), DispatchError> {
    if actions.is_empty() {
        return Ok(());
    }

    let rang_bell = actions.iter().any(|a| matches!(a, TerminalAction::Bell));
    let new_title = actions.iter().rev().find_map(|a| match a {
        TerminalAction::WindowTitle(title) => Some(title.clone()),
        _ => None,
    });
    let cursor_visibility = actions.iter().rev().find_map(|a| match a {
        TerminalAction::SetMode {
            mode: Mode::ShowCursor,
            enabled,
        } => Some(*enabled),
        _ => None,
    });

    let buffer = inner.buffer.clone();
    inner
        .dispatcher
        .invoke_and_wait(move || buffer.lock().process_actions(&actions))?;

    if rang_bell {
        inner.pane.flash();
    }
    if let Some(title) = new_title {
        inner.pane.set_window_title(&title);
    }
    if let Some(visible) = cursor_visibility {
        inner.pane.set_cursor_visible(visible);
    }
    Ok(())
}

fn handle_process_termination(inner: &Arc<ControlInner>, parser: &mut Parser) {
    inner.process_running.store(false, Ordering::SeqCst);

    let status = match inner.pty.wait_for() {
        Ok(status) => status,
        Err(err) => {
            log::warn!("Problem waiting for {:?}: {}", inner.pty, err);
            announce_connection_lost(inner, parser, "\n\r[Problem waiting for process.]");
            return;
        }
    };

    if status.did_exit_normally {
        if inner.pane.should_hold_on_exit(status.exit_status) {
            announce_connection_lost(
                inner,
                parser,
                &format!("\n\r[Process exited with status {}.]", status.exit_status),
            );
            return;
        }
    } else if status.was_signaled {
        announce_connection_lost(
            inner,
            parser,
            &format!(
                "\n\r[Process killed by {}.]",
                inner.pty.signal_table().describe(&status)
            ),
        );
        return;
    }

    // If it wasn't a deliberate destroy that got us here, the pane closes.
    if !inner.destroyed.load(Ordering::SeqCst) {
        inner.pane.close_session();
    }
}

/// Report the end of the connection inline, through the normal parse path
/// so it lands in the buffer like child output, then hide the cursor.
fn announce_connection_lost(inner: &Arc<ControlInner>, parser: &mut Parser, message: &str) {
    let actions = parser.process(message.as_bytes());
    if flush_actions(inner, actions).is_err() {
        return;
    }
    inner.pane.set_cursor_visible(false);
}

fn run_writer(rx: Receiver<Vec<u8>>, pty: Arc<PtyProcess>, running: Arc<AtomicBool>) {
    let mut drop_logged = false;
    for message in rx {
        if !running.load(Ordering::SeqCst) {
            if !drop_logged {
                log::warn!("Dropping input for dead process {:?}", pty);
                drop_logged = true;
            }
            continue;
        }
        if let Err(err) = pty.write_all(&message) {
            log::warn!(
                "Couldn't send {} bytes to {:?}: {}",
                message.len(),
                pty,
                err
            );
        }
    }
}
