//! Per-session output logging
//!
//! Each session appends the raw bytes the child wrote, untouched, to a file
//! named after the command and start time in the configured log directory.
//! Logging can be suspended temporarily; if the log directory doesn't exist
//! or the file can't be opened, logging is suspended permanently and the
//! reason is kept for display in the UI.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct LogWriter {
    info: String,
    stream: Option<BufWriter<File>>,
    suspended: AtomicBool,
}

impl LogWriter {
    /// Start logging for the given command. Never fails: any problem leaves
    /// the writer permanently suspended with the reason in `info()`.
    pub fn new(command: &[String], log_directory: &Path) -> LogWriter {
        match Self::open_stream(command, log_directory) {
            Ok((info, stream)) => LogWriter {
                info,
                stream: Some(stream),
                suspended: AtomicBool::new(false),
            },
            Err(info) => LogWriter {
                info,
                stream: None,
                suspended: AtomicBool::new(true),
            },
        }
    }

    fn open_stream(command: &[String], log_directory: &Path) -> Result<(String, BufWriter<File>), String> {
        if !log_directory.is_dir() {
            return Err(format!("({} does not exist)", log_directory.display()));
        }
        let prefix = urlencoding::encode(&command.join(" ")).into_owned();
        let timestamp = chrono::Local::now().format("%Y-%m-%d-%H%M%S%z");
        let path = log_directory.join(format!("{}-{}.txt", prefix, timestamp));
        match File::create(&path) {
            Ok(file) => Ok((path.display().to_string(), BufWriter::new(file))),
            Err(err) => Err(format!("(couldn't open {}: {})", path.display(), err)),
        }
    }

    /// Append raw child output. Buffered; flushed whenever the chunk
    /// contains a newline. A write failure suspends logging for good.
    pub fn append(&mut self, bytes: &[u8]) {
        if self.suspended.load(Ordering::Acquire) {
            return;
        }
        let Some(stream) = &mut self.stream else {
            return;
        };
        let result = stream.write_all(bytes).and_then(|()| {
            if bytes.contains(&b'\n') {
                stream.flush()
            } else {
                Ok(())
            }
        });
        if let Err(err) = result {
            log::warn!("Suspending session log \"{}\": {}", self.info, err);
            self.stream = None;
            self.suspended.store(true, Ordering::Release);
        }
    }

    /// Pause or resume logging without closing the file. Un-suspending is
    /// impossible once the stream is gone.
    pub fn set_suspended(&mut self, suspended: bool) {
        if let Some(stream) = &mut self.stream {
            if let Err(err) = stream.flush() {
                log::warn!("Couldn't flush session log \"{}\": {}", self.info, err);
            }
            self.suspended.store(suspended, Ordering::Release);
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    /// The log file path, or the reason logging is off.
    pub fn info(&self) -> &str {
        &self.info
    }

    pub fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            self.suspended.store(true, Ordering::Release);
            if let Err(err) = stream.flush() {
                log::warn!("Couldn't flush session log \"{}\": {}", self.info, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("terminator-log-test-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_logs_raw_bytes_and_flushes_on_newline() {
        let dir = temp_dir("raw");
        let mut writer = LogWriter::new(&["echo".into(), "hi".into()], &dir);
        assert!(!writer.is_suspended());

        writer.append(b"hello \x1b[31mred\x1b[0m\n");
        // The newline forced a flush; the escape bytes must be verbatim.
        let path = std::path::PathBuf::from(writer.info());
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents, b"hello \x1b[31mred\x1b[0m\n");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_file_name_encodes_command() {
        let dir = temp_dir("name");
        let writer = LogWriter::new(&["ssh".into(), "user@host".into()], &dir);
        let name = std::path::Path::new(writer.info())
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        assert!(name.starts_with("ssh%20user%40host-"));
        assert!(name.ends_with(".txt"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_suspends_permanently() {
        let dir = std::env::temp_dir().join("terminator-log-test-no-such-dir");
        let _ = std::fs::remove_dir_all(&dir);
        let mut writer = LogWriter::new(&["sh".into()], &dir);
        assert!(writer.is_suspended());
        assert!(writer.info().contains("does not exist"));
        // Suspension is permanent: toggling has no effect without a stream.
        writer.set_suspended(false);
        assert!(writer.is_suspended());
    }

    #[test]
    fn test_suspend_pauses_writes() {
        let dir = temp_dir("suspend");
        let mut writer = LogWriter::new(&["sh".into()], &dir);
        writer.append(b"kept\n");
        writer.set_suspended(true);
        writer.append(b"dropped\n");
        writer.set_suspended(false);
        writer.append(b"kept too\n");
        writer.close();

        let path = std::path::PathBuf::from(writer.info());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "kept\nkept too\n");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
