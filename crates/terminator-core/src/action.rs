//! Terminal actions
//!
//! The escape parser reduces the byte stream to a closed set of tagged
//! actions; the screen model applies them through a single dispatch point.
//! Batches of actions are handed across the reader/UI thread boundary, so
//! every variant is plain owned data.

use crate::style::Style;

/// Control characters that survive as first-class actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialChar {
    LineFeed,
    CarriageReturn,
    Backspace,
    HorizontalTab,
    VerticalTab,
}

/// Which part of the display an erase covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayClear {
    /// Cursor to end of screen (ED 0)
    Below,
    /// Start of screen to cursor (ED 1)
    Above,
    /// Entire screen (ED 2); scrollback is never touched
    All,
}

/// Which part of the cursor line an erase covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClear {
    /// Cursor to end of line (EL 0)
    Right,
    /// Start of line to cursor, inclusive (EL 1)
    Left,
    /// Whole line (EL 2)
    All,
}

/// Tab stop clearing (TBC).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabClear {
    CurrentColumn,
    All,
}

/// Settable terminal modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// IRM: writes shift the tail right instead of overwriting
    Insert,
    /// DECAWM: writing past the last column wraps to the next line
    Autowrap,
    /// DECOM: cursor addressing is relative to the scroll region
    Origin,
    /// LNM: line feed implies carriage return
    AutomaticNewline,
    /// DECTCEM: cursor visibility
    ShowCursor,
    /// Alternate screen buffer (modes 47/1047/1049)
    AlternateScreen,
}

/// One mutation of the screen model.
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalAction {
    /// Translated plain text to write at the cursor
    PlainText(String),
    SpecialChar(SpecialChar),
    /// Subsequent writes use this style
    SetStyle(Style),
    /// Cursor motion; absolute coordinates are already 0-based, and `None`
    /// leaves that axis alone
    CursorMove {
        relative: bool,
        col: Option<i32>,
        row: Option<i32>,
    },
    EraseInDisplay(DisplayClear),
    EraseInLine(LineClear),
    InsertLines(usize),
    DeleteLines(usize),
    InsertChars(usize),
    DeleteChars(usize),
    /// Inclusive 0-based region bounds; a `bottom` past the screen is
    /// clamped to the last row
    SetScrollRegion { top: usize, bottom: usize },
    SaveCursor,
    RestoreCursor,
    SetMode { mode: Mode, enabled: bool },
    TabSet,
    TabClear(TabClear),
    DesignateCharset { index: usize, set: char },
    InvokeCharset(usize),
    Resize { cols: usize, rows: usize },
    Bell,
    WindowTitle(String),
    /// ESC M: cursor up, scrolling down at the top of the region
    ReverseIndex,
    /// ESC c: reset the terminal to its power-on state
    FullReset,
}
