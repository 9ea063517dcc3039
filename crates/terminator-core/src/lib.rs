//! terminator-core: terminal emulation core
//!
//! This crate provides the machinery behind a terminal pane:
//! - Styled character and line storage with tab-run encoding
//! - Screen model (grid, cursor, scroll regions, scrollback)
//! - VT100/xterm escape-sequence parsing into terminal actions
//! - PTY handling and per-session process control
//! - Per-session output logging

pub mod action;
pub mod buffer;
pub mod charset;
pub mod control;
pub mod dispatch;
pub mod line;
pub mod log_writer;
pub mod parser;
pub mod pty;
pub mod style;

pub use action::TerminalAction;
pub use buffer::{BufferConfig, TextBuffer};
pub use control::{TerminalControl, TerminalPane};
pub use dispatch::{ui_channel, UiDispatcher, UiEventLoop};
pub use line::TextLine;
pub use log_writer::LogWriter;
pub use parser::Parser;
pub use pty::{ProcessStatus, PtyProcess, PtySize};
pub use style::Style;
