//! Per-display command server
//!
//! A running instance listens on a Unix socket named after `$DISPLAY`
//! under the log directory, so shell scripts (and later invocations) can
//! open tabs here instead of starting another process. The protocol is one
//! textual command per line:
//!
//! ```text
//! open <command>     run <command> in a new tab
//! open-shell         a new shell tab
//! ```
//!
//! Each line is answered with `ok` or `error: <reason>`.

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A handler turns one command line into a result. It runs on the server
/// thread.
pub type CommandHandler = Arc<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// The socket path for this display.
pub fn socket_path(log_directory: &Path) -> PathBuf {
    let display = std::env::var("DISPLAY").unwrap_or_default();
    log_directory.join(format!(".terminator-server-port{}", display))
}

/// Bind the socket and serve commands on a background thread. A stale
/// socket from a dead instance is replaced.
pub fn start(path: PathBuf, handler: CommandHandler) -> std::io::Result<()> {
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    let listener = UnixListener::bind(&path)?;
    log::info!("Serving commands on {}", path.display());

    std::thread::Builder::new()
        .name("command server".to_string())
        .spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => serve_connection(stream, &handler),
                    Err(err) => log::warn!("Server accept failed: {}", err),
                }
            }
        })?;
    Ok(())
}

fn serve_connection(stream: UnixStream, handler: &CommandHandler) {
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(err) => {
            log::warn!("Couldn't clone server connection: {}", err);
            return;
        }
    };
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => return,
        };
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        let reply = match handler(command) {
            Ok(()) => "ok\n".to_string(),
            Err(reason) => format!("error: {}\n", reason),
        };
        if writer.write_all(reply.as_bytes()).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn temp_socket(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "terminator-server-test-{}-{}",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_socket_path_embeds_display() {
        std::env::set_var("DISPLAY", ":7");
        let path = socket_path(Path::new("/logs"));
        assert_eq!(path, PathBuf::from("/logs/.terminator-server-port:7"));
    }

    #[test]
    fn test_commands_get_replies() {
        let path = temp_socket("replies");
        let opened = Arc::new(AtomicUsize::new(0));
        let handler: CommandHandler = {
            let opened = opened.clone();
            Arc::new(move |command| {
                if command.starts_with("open") {
                    opened.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                } else {
                    Err(format!("unknown command \"{}\"", command))
                }
            })
        };
        start(path.clone(), handler).unwrap();

        let mut stream = UnixStream::connect(&path).unwrap();
        stream.write_all(b"open-shell\nbogus\n").unwrap();
        stream.shutdown(std::net::Shutdown::Write).unwrap();

        let mut replies = String::new();
        stream.read_to_string(&mut replies).unwrap();
        assert_eq!(replies, "ok\nerror: unknown command \"bogus\"\n");
        assert_eq!(opened.load(Ordering::SeqCst), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_stale_socket_is_replaced() {
        let path = temp_socket("stale");
        std::fs::write(&path, b"stale").unwrap();
        let handler: CommandHandler = Arc::new(|_| Ok(()));
        start(path.clone(), handler).unwrap();
        assert!(UnixStream::connect(&path).is_ok());
        let _ = std::fs::remove_file(&path);
    }
}
