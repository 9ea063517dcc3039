//! PTY handling and child process control
//!
//! Opens the pseudo-terminal master, forks the child under a controlling
//! terminal on the slave side, and plumbs resize and reaping.
//!
//! `fork`/`exec` and `waitpid` for every child run on one dedicated worker
//! thread. Some kernels only let the LWP that forked a child wait for it,
//! so both halves must happen on the same thread for the lifetime of the
//! process.
//!
//! The child's post-fork path is a single critical sequence; any failure
//! writes a diagnostic to a pre-opened close-on-exec pipe and `_exit(1)`s,
//! which the parent reports as a start failure.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::fs::File;
use std::io::{self, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::{FromRawFd, RawFd};
use std::path::Path;
use std::sync::mpsc;
use std::sync::OnceLock;

use parking_lot::Mutex;
use thiserror::Error;

/// PTY size in character cells and pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PtySize {
    pub rows: u16,
    pub cols: u16,
    pub pixel_width: u16,
    pub pixel_height: u16,
}

/// Errors from PTY and child process operations.
#[derive(Error, Debug)]
pub enum PtyError {
    #[error("failed to open a pseudo-terminal: {0}")]
    OpenPty(#[source] io::Error),

    #[error("out of pseudo-terminal devices")]
    OutOfPtyDevices,

    #[error("failed to fork: {0}")]
    Fork(#[source] io::Error),

    #[error("child failed to start: {0}")]
    ChildStart(String),

    #[error("cannot spawn: {0}")]
    Spawn(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("the child forker/reaper thread is gone")]
    ReaperGone,
}

/// How a reaped child ended.
#[derive(Debug, Clone, Copy)]
pub struct ProcessStatus {
    pub did_exit_normally: bool,
    pub exit_status: i32,
    pub was_signaled: bool,
    pub signal_number: i32,
    pub did_dump_core: bool,
}

/// Signal names keyed by number, used when describing a killed child.
/// Starts with the POSIX set; entries can be replaced or extended.
#[derive(Debug, Clone)]
pub struct SignalTable {
    names: HashMap<i32, String>,
}

impl Default for SignalTable {
    fn default() -> Self {
        let posix = [
            (1, "SIGHUP"),
            (2, "SIGINT"),
            (3, "SIGQUIT"),
            (4, "SIGILL"),
            (5, "SIGTRAP"),
            (6, "SIGABRT"),
            (7, "SIGBUS"),
            (8, "SIGFPE"),
            (9, "SIGKILL"),
            (10, "SIGUSR1"),
            (11, "SIGSEGV"),
            (12, "SIGUSR2"),
            (13, "SIGPIPE"),
            (14, "SIGALRM"),
            (15, "SIGTERM"),
        ];
        SignalTable {
            names: posix
                .into_iter()
                .map(|(number, name)| (number, name.to_string()))
                .collect(),
        }
    }
}

impl SignalTable {
    pub fn name(&self, signal: i32) -> Option<&str> {
        self.names.get(&signal).map(String::as_str)
    }

    pub fn set_name(&mut self, signal: i32, name: impl Into<String>) {
        self.names.insert(signal, name.into());
    }

    /// e.g. "signal 11 (SIGSEGV) --- core dumped"
    pub fn describe(&self, status: &ProcessStatus) -> String {
        let mut description = format!("signal {}", status.signal_number);
        if let Some(name) = self.name(status.signal_number) {
            description.push_str(&format!(" ({})", name));
        }
        if status.did_dump_core {
            description.push_str(" --- core dumped");
        }
        description
    }
}

/// A child process running under a pseudo-terminal.
pub struct PtyProcess {
    master_fd: RawFd,
    pid: libc::pid_t,
    slave_name: String,
    status: Mutex<Option<ProcessStatus>>,
    signals: SignalTable,
}

impl PtyProcess {
    /// Open a PTY and start `command` (as `execvp(command[0], command)`)
    /// with the slave as its controlling terminal.
    pub fn spawn(
        command: &[String],
        working_directory: Option<&Path>,
        size: PtySize,
    ) -> Result<PtyProcess, PtyError> {
        if command.is_empty() {
            return Err(PtyError::Spawn("empty command".to_string()));
        }
        let command = command.to_vec();
        let cwd = working_directory.map(Path::to_path_buf);
        on_child_thread(move || unsafe { spawn_on_child_thread(&command, cwd.as_deref(), size) })?
    }

    pub fn process_id(&self) -> i32 {
        self.pid
    }

    pub fn slave_name(&self) -> &str {
        &self.slave_name
    }

    pub fn signal_table(&self) -> &SignalTable {
        &self.signals
    }

    pub fn set_signal_name(&mut self, signal: i32, name: impl Into<String>) {
        self.signals.set_name(signal, name);
    }

    /// Blocking read from the master. POSIX lets one thread read while
    /// another writes the same fd; the reader thread is the only caller.
    pub fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = unsafe {
                libc::read(
                    self.master_fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                )
            };
            if n >= 0 {
                return Ok(n as usize);
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(err);
            }
        }
    }

    /// Write the whole buffer to the master; the writer thread is the only
    /// caller.
    pub fn write_all(&self, mut bytes: &[u8]) -> io::Result<()> {
        while !bytes.is_empty() {
            let n = unsafe {
                libc::write(
                    self.master_fd,
                    bytes.as_ptr() as *const libc::c_void,
                    bytes.len(),
                )
            };
            if n < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }
            bytes = &bytes[n as usize..];
        }
        Ok(())
    }

    /// Tell the kernel (and through it, the child) about a new window size.
    pub fn resize(&self, size: PtySize) -> io::Result<()> {
        let winsize = libc::winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: size.pixel_width,
            ws_ypixel: size.pixel_height,
        };
        let rc = unsafe { libc::ioctl(self.master_fd, libc::TIOCSWINSZ, &winsize) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    /// Reap the child, blocking until it exits. Runs on the shared
    /// forker/reaper thread; the result is cached.
    pub fn wait_for(&self) -> Result<ProcessStatus, PtyError> {
        if let Some(status) = *self.status.lock() {
            return Ok(status);
        }
        let pid = self.pid;
        let status = on_child_thread(move || {
            let mut raw: libc::c_int = 0;
            let rc = unsafe { libc::waitpid(pid, &mut raw, 0) };
            if rc < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(decode_wait_status(raw))
            }
        })?
        .map_err(PtyError::Io)?;
        *self.status.lock() = Some(status);
        Ok(status)
    }

    /// Hang up the child. The reader observes EOF and runs the
    /// termination protocol.
    pub fn destroy(&self) -> io::Result<()> {
        let rc = unsafe { libc::kill(self.pid, libc::SIGHUP) };
        if rc < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        if self.status.lock().is_none() {
            let _ = self.destroy();
        }
        unsafe {
            libc::close(self.master_fd);
        }
    }
}

impl std::fmt::Debug for PtyProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtyProcess")
            .field("pid", &self.pid)
            .field("fd", &self.master_fd)
            .field("pty", &self.slave_name)
            .finish()
    }
}

fn decode_wait_status(raw: libc::c_int) -> ProcessStatus {
    if libc::WIFEXITED(raw) {
        ProcessStatus {
            did_exit_normally: true,
            exit_status: libc::WEXITSTATUS(raw),
            was_signaled: false,
            signal_number: 0,
            did_dump_core: false,
        }
    } else if libc::WIFSIGNALED(raw) {
        ProcessStatus {
            did_exit_normally: false,
            exit_status: -1,
            was_signaled: true,
            signal_number: libc::WTERMSIG(raw),
            did_dump_core: libc::WCOREDUMP(raw),
        }
    } else {
        ProcessStatus {
            did_exit_normally: false,
            exit_status: -1,
            was_signaled: false,
            signal_number: 0,
            did_dump_core: false,
        }
    }
}

// ----- the shared forker/reaper thread -----

type ChildJob = Box<dyn FnOnce() + Send>;

static CHILD_EXECUTOR: OnceLock<Mutex<mpsc::Sender<ChildJob>>> = OnceLock::new();

/// Run `task` on the dedicated child forker/reaper thread and wait for its
/// result. Every fork and every waitpid goes through here.
fn on_child_thread<T, F>(task: F) -> Result<T, PtyError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let sender = CHILD_EXECUTOR.get_or_init(|| {
        let (tx, rx) = mpsc::channel::<ChildJob>();
        std::thread::Builder::new()
            .name("child forker/reaper".to_string())
            .spawn(move || {
                for job in rx {
                    job();
                }
            })
            .expect("couldn't start the child forker/reaper thread");
        Mutex::new(tx)
    });

    let (result_tx, result_rx) = mpsc::channel();
    let job: ChildJob = Box::new(move || {
        let _ = result_tx.send(task());
    });
    sender.lock().send(job).map_err(|_| PtyError::ReaperGone)?;
    result_rx.recv().map_err(|_| PtyError::ReaperGone)
}

// ----- master-side setup -----

unsafe fn open_master() -> Result<(RawFd, String), PtyError> {
    let ptmx = b"/dev/ptmx\0";
    let fd = libc::open(ptmx.as_ptr() as *const libc::c_char, libc::O_RDWR);
    if fd < 0 {
        return search_for_bsd_pty();
    }
    if libc::grantpt(fd) != 0 {
        let err = io::Error::last_os_error();
        libc::close(fd);
        return Err(PtyError::OpenPty(err));
    }
    if libc::unlockpt(fd) != 0 {
        let err = io::Error::last_os_error();
        libc::close(fd);
        return Err(PtyError::OpenPty(err));
    }
    let name = libc::ptsname(fd);
    if name.is_null() {
        libc::close(fd);
        return Err(PtyError::OpenPty(io::Error::last_os_error()));
    }
    let slave_name = CStr::from_ptr(name).to_string_lossy().into_owned();
    Ok((fd, slave_name))
}

/// Old-style BSD pty scan, for systems without /dev/ptmx.
unsafe fn search_for_bsd_pty() -> Result<(RawFd, String), PtyError> {
    for group in "pqrstuvwxyzPQRST".chars() {
        for index in "0123456789abcdef".chars() {
            let master = format!("/dev/pty{}{}", group, index);
            let master_c = CString::new(master).expect("device paths contain no NUL");
            let fd = libc::open(master_c.as_ptr(), libc::O_RDWR);
            if fd >= 0 {
                return Ok((fd, format!("/dev/tty{}{}", group, index)));
            }
            // ENOENT means we've walked off the end of the device list.
            if io::Error::last_os_error().raw_os_error() == Some(libc::ENOENT) {
                return Err(PtyError::OutOfPtyDevices);
            }
        }
    }
    Err(PtyError::OutOfPtyDevices)
}

// ----- fork and the child critical path -----

struct ChildContext {
    master_fd: RawFd,
    error_fd: RawFd,
    slave_path: CString,
    cwd: Option<CString>,
    argv: Vec<*const libc::c_char>,
    uid: libc::uid_t,
    tty_gid: libc::gid_t,
    unset_vars: Vec<CString>,
}

unsafe fn spawn_on_child_thread(
    command: &[String],
    working_directory: Option<&Path>,
    size: PtySize,
) -> Result<PtyProcess, PtyError> {
    let (master_fd, slave_name) = open_master()?;

    // Everything the child needs is prepared before the fork; the child
    // side then sticks to raw libc calls.
    let argv_storage: Vec<CString> = match command
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(argv) => argv,
        Err(_) => {
            libc::close(master_fd);
            return Err(PtyError::Spawn("NUL byte in command".to_string()));
        }
    };
    let mut argv: Vec<*const libc::c_char> = argv_storage.iter().map(|arg| arg.as_ptr()).collect();
    argv.push(std::ptr::null());

    let cwd = match working_directory {
        Some(dir) => match CString::new(dir.as_os_str().as_bytes()) {
            Ok(dir) => Some(dir),
            Err(_) => {
                libc::close(master_fd);
                return Err(PtyError::Spawn(
                    "NUL byte in working directory".to_string(),
                ));
            }
        },
        None => None,
    };

    let slave_path = CString::new(slave_name.clone()).expect("pty names contain no NUL");
    let tty_group = CString::new("tty").expect("no NUL");
    let group = libc::getgrnam(tty_group.as_ptr());
    let tty_gid = if group.is_null() {
        libc::gid_t::MAX
    } else {
        (*group).gr_gid
    };

    let mut unset_vars: Vec<CString> = ["WINDOWID", "COLORTERM", "TERM_PROGRAM", "TERM_PROGRAM_VERSION"]
        .iter()
        .map(|name| CString::new(*name).expect("no NUL"))
        .collect();
    // On macOS the launcher exports per-process variables keyed by the
    // parent's pid, which is our pid at this point.
    #[cfg(target_os = "macos")]
    {
        let ppid = libc::getpid();
        for prefix in ["APP_ICON_", "APP_NAME_"] {
            if let Ok(var) = CString::new(format!("{}{}", prefix, ppid)) {
                unset_vars.push(var);
            }
        }
    }

    // Start-failure diagnostics travel over a close-on-exec pipe: EOF with
    // no data means exec succeeded.
    let mut pipe_fds = [0 as libc::c_int; 2];
    if libc::pipe(pipe_fds.as_mut_ptr()) < 0 {
        let err = io::Error::last_os_error();
        libc::close(master_fd);
        return Err(PtyError::OpenPty(err));
    }
    let (error_read, error_write) = (pipe_fds[0], pipe_fds[1]);
    libc::fcntl(error_read, libc::F_SETFD, libc::FD_CLOEXEC);
    libc::fcntl(error_write, libc::F_SETFD, libc::FD_CLOEXEC);

    // Initial window size, so the child sees sane dimensions from exec.
    let winsize = libc::winsize {
        ws_row: size.rows,
        ws_col: size.cols,
        ws_xpixel: size.pixel_width,
        ws_ypixel: size.pixel_height,
    };
    libc::ioctl(master_fd, libc::TIOCSWINSZ, &winsize);

    let context = ChildContext {
        master_fd,
        error_fd: error_write,
        slave_path,
        cwd,
        argv,
        uid: libc::getuid(),
        tty_gid,
        unset_vars,
    };

    let pid = libc::fork();
    if pid < 0 {
        let err = io::Error::last_os_error();
        libc::close(master_fd);
        libc::close(error_read);
        libc::close(error_write);
        return Err(PtyError::Fork(err));
    }
    if pid == 0 {
        run_child(&context); // never returns
    }

    libc::close(error_write);
    let mut diagnostic = String::new();
    let _ = File::from_raw_fd(error_read).read_to_string(&mut diagnostic);
    let diagnostic = diagnostic.trim().to_string();
    if !diagnostic.is_empty() {
        // The child never reached exec; reap it here, on the same thread
        // that forked it.
        let mut raw: libc::c_int = 0;
        libc::waitpid(pid, &mut raw, 0);
        libc::close(master_fd);
        return Err(PtyError::ChildStart(diagnostic));
    }

    Ok(PtyProcess {
        master_fd,
        pid,
        slave_name,
        status: Mutex::new(None),
        signals: SignalTable::default(),
    })
}

unsafe fn child_abort(error_fd: RawFd, message: &[u8]) -> ! {
    let _ = libc::write(
        error_fd,
        message.as_ptr() as *const libc::c_void,
        message.len(),
    );
    libc::_exit(1);
}

/// The post-fork critical path. Runs in the forked child; only raw libc
/// from here to exec.
unsafe fn run_child(context: &ChildContext) -> ! {
    let error_fd = context.error_fd;
    libc::close(context.master_fd);

    if let Some(cwd) = &context.cwd {
        if libc::chdir(cwd.as_ptr()) < 0 {
            child_abort(error_fd, b"chdir() to the working directory failed\n");
        }
    }

    if libc::setsid() < 0 {
        child_abort(error_fd, b"setsid() failed\n");
    }

    // The slave becomes ours: owned by our uid, group tty, mode 620.
    libc::chown(context.slave_path.as_ptr(), context.uid, context.tty_gid);
    libc::chmod(context.slave_path.as_ptr(), 0o620);
    let slave_fd = libc::open(context.slave_path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY);
    if slave_fd < 0 {
        child_abort(error_fd, b"open() of the slave pty failed\n");
    }

    if libc::ioctl(slave_fd, libc::TIOCSCTTY as libc::c_ulong, 0) < 0 {
        child_abort(error_fd, b"ioctl(TIOCSCTTY) failed\n");
    }

    // Solaris needs the STREAMS terminal modules pushed by hand.
    #[cfg(target_os = "solaris")]
    {
        for module in [&b"ptem\0"[..], &b"ldterm\0"[..], &b"ttcompat\0"[..]] {
            libc::ioctl(slave_fd, libc::I_PUSH, module.as_ptr());
        }
    }

    for fd in 0..=2 {
        if libc::dup2(slave_fd, fd) < 0 {
            child_abort(error_fd, b"dup2() of the slave pty failed\n");
        }
    }
    if slave_fd > 2 {
        libc::close(slave_fd);
    }

    close_unused_fds(error_fd);

    // Tell the world which terminfo entry to use, and stop claiming to be
    // whatever terminal we were started from.
    let term_name = b"TERM\0";
    let term_value = b"terminator\0";
    libc::setenv(
        term_name.as_ptr() as *const libc::c_char,
        term_value.as_ptr() as *const libc::c_char,
        1,
    );
    for var in &context.unset_vars {
        libc::unsetenv(var.as_ptr());
    }

    // rxvt resets these and so do we; an inherited non-default disposition
    // breaks ^C under some desktop launchers.
    libc::signal(libc::SIGINT, libc::SIG_DFL);
    libc::signal(libc::SIGQUIT, libc::SIG_DFL);
    libc::signal(libc::SIGCHLD, libc::SIG_DFL);

    libc::execvp(context.argv[0], context.argv.as_ptr());
    child_abort(error_fd, b"execvp() failed\n");
}

/// Close every inherited fd above stderr except the error pipe, so the
/// child doesn't pin our sockets and log files open.
unsafe fn close_unused_fds(keep_fd: RawFd) {
    let fd_directory = if cfg!(target_os = "macos") {
        "/dev/fd"
    } else {
        "/proc/self/fd"
    };
    // Two passes: the directory iterator holds an fd of its own, and we
    // must not close it while iterating.
    let mut fds: Vec<RawFd> = Vec::new();
    if let Ok(entries) = std::fs::read_dir(fd_directory) {
        for entry in entries.flatten() {
            if let Ok(fd) = entry.file_name().to_string_lossy().parse::<RawFd>() {
                if fd > 2 && fd != keep_fd {
                    fds.push(fd);
                }
            }
        }
    }
    for fd in fds {
        libc::close(fd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["/bin/sh".to_string(), "-c".to_string(), script.to_string()]
    }

    fn default_size() -> PtySize {
        PtySize {
            rows: 24,
            cols: 80,
            ..Default::default()
        }
    }

    /// Drain the master until the child hangs up. Linux reports EIO once
    /// the slave side is gone; treat it like EOF.
    fn read_all(pty: &PtyProcess) -> String {
        let mut output = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            match pty.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => output.extend_from_slice(&buf[..n]),
            }
        }
        String::from_utf8_lossy(&output).replace('\r', "")
    }

    #[test]
    fn test_spawn_and_reap() {
        let pty = PtyProcess::spawn(&sh("exit 0"), None, default_size()).unwrap();
        assert!(pty.process_id() > 0);
        assert!(!pty.slave_name().is_empty());
        let _ = read_all(&pty);
        let status = pty.wait_for().unwrap();
        assert!(status.did_exit_normally);
        assert_eq!(status.exit_status, 0);
        assert!(!status.was_signaled);
    }

    #[test]
    fn test_exit_status_is_reported() {
        let pty = PtyProcess::spawn(&sh("exit 42"), None, default_size()).unwrap();
        let _ = read_all(&pty);
        let status = pty.wait_for().unwrap();
        assert!(status.did_exit_normally);
        assert_eq!(status.exit_status, 42);
    }

    #[test]
    fn test_signaled_child() {
        let pty = PtyProcess::spawn(&sh("kill -9 $$"), None, default_size()).unwrap();
        let _ = read_all(&pty);
        let status = pty.wait_for().unwrap();
        assert!(!status.did_exit_normally);
        assert!(status.was_signaled);
        assert_eq!(status.signal_number, 9);
        let description = pty.signal_table().describe(&status);
        assert!(description.starts_with("signal 9 (SIGKILL)"));
    }

    #[test]
    fn test_child_sees_fixed_environment() {
        // These must be scrubbed even when the parent exports them.
        std::env::set_var("WINDOWID", "12345");
        std::env::set_var("COLORTERM", "truecolor");
        let pty = PtyProcess::spawn(
            &sh("echo TERM=$TERM.; echo WINDOWID=$WINDOWID.; echo COLORTERM=$COLORTERM."),
            None,
            default_size(),
        )
        .unwrap();
        let output = read_all(&pty);
        let _ = pty.wait_for();
        assert!(output.contains("TERM=terminator."), "output: {:?}", output);
        assert!(output.contains("WINDOWID=."), "output: {:?}", output);
        assert!(output.contains("COLORTERM=."), "output: {:?}", output);
    }

    #[test]
    fn test_working_directory() {
        let pty = PtyProcess::spawn(&sh("pwd"), Some(Path::new("/tmp")), default_size()).unwrap();
        let output = read_all(&pty);
        let _ = pty.wait_for();
        // macOS spells it /private/tmp.
        assert!(output.contains("/tmp"), "output: {:?}", output);
    }

    #[test]
    fn test_bad_working_directory_is_a_start_failure() {
        let result = PtyProcess::spawn(
            &sh("true"),
            Some(Path::new("/no/such/directory/at/all")),
            default_size(),
        );
        match result {
            Err(PtyError::ChildStart(message)) => {
                assert!(message.contains("chdir"), "message: {:?}", message);
            }
            other => panic!("expected ChildStart, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_write_reaches_child() {
        let pty = PtyProcess::spawn(&sh("read line; echo got:$line"), None, default_size()).unwrap();
        pty.write_all(b"hello\n").unwrap();
        let output = read_all(&pty);
        let _ = pty.wait_for();
        assert!(output.contains("got:hello"), "output: {:?}", output);
    }

    #[test]
    fn test_resize_succeeds() {
        let pty = PtyProcess::spawn(&sh("sleep 1"), None, default_size()).unwrap();
        pty.resize(PtySize {
            rows: 40,
            cols: 120,
            pixel_width: 960,
            pixel_height: 640,
        })
        .unwrap();
        let _ = pty.destroy();
        let _ = pty.wait_for();
    }

    #[test]
    fn test_destroy_hangs_up_child() {
        let pty = PtyProcess::spawn(&sh("sleep 30"), None, default_size()).unwrap();
        pty.destroy().unwrap();
        let status = pty.wait_for().unwrap();
        assert!(status.was_signaled);
        assert_eq!(status.signal_number, libc::SIGHUP);
    }

    #[test]
    fn test_signal_table_defaults_and_overrides() {
        let mut table = SignalTable::default();
        assert_eq!(table.name(11), Some("SIGSEGV"));
        assert_eq!(table.name(99), None);
        table.set_name(99, "SIGCUSTOM");
        assert_eq!(table.name(99), Some("SIGCUSTOM"));

        let status = ProcessStatus {
            did_exit_normally: false,
            exit_status: -1,
            was_signaled: true,
            signal_number: 11,
            did_dump_core: true,
        };
        assert_eq!(table.describe(&status), "signal 11 (SIGSEGV) --- core dumped");
    }
}
