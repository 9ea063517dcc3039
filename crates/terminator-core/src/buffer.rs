//! Screen model
//!
//! `TextBuffer` is the terminal's screen: a window of visible lines over a
//! scrollback sequence, a cursor, scroll regions, tab stops, and the
//! primary/alternate buffer pair. It consumes batches of
//! [`TerminalAction`]s; every mutation goes through [`TextBuffer::apply`].
//!
//! All methods must be invoked from the UI thread. The reader thread hands
//! batches over through the dispatch rendezvous and blocks until they have
//! been applied, so a renderer never observes a half-applied sequence.
//!
//! The primary buffer is a single ordered sequence of lines whose tail is
//! the visible screen; lines scrolled off a full-screen region simply stay
//! in the sequence and become scrollback, evicted FIFO past the configured
//! cap. The alternate buffer is fixed at screen size and has no scrollback.

use std::collections::VecDeque;

use crate::action::{
    DisplayClear, LineClear, Mode, SpecialChar, TabClear, TerminalAction,
};
use crate::line::TextLine;
use crate::style::Style;

/// Configuration for a screen buffer.
#[derive(Debug, Clone)]
pub struct BufferConfig {
    /// Maximum lines retained above the visible screen (0 = no scrollback)
    pub scrollback_lines: usize,
    /// Snap the view back to the bottom whenever output arrives
    pub scroll_tty_output: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            scrollback_lines: 10_000,
            scroll_tty_output: false,
        }
    }
}

/// Cursor state saved by DECSC. The charset half of the tuple is mirrored
/// here from the parser so the model's view stays complete.
#[derive(Debug, Clone, Copy)]
struct SavedCursor {
    col: usize,
    row: usize,
    style: Style,
    charset_index: usize,
    charsets: [char; 4],
    origin_mode: bool,
    autowrap: bool,
}

/// The terminal screen model.
#[derive(Debug)]
pub struct TextBuffer {
    cols: usize,
    rows: usize,
    config: BufferConfig,
    /// Scrollback plus visible rows; the visible screen is the tail.
    primary: VecDeque<TextLine>,
    /// Fixed-size alternate screen, active while `Some`.
    alternate: Option<Vec<TextLine>>,
    /// Cursor column; may equal `cols` while a wrap is pending.
    cursor_col: usize,
    cursor_row: usize,
    wrap_pending: bool,
    style: Style,
    saved_cursor: Option<SavedCursor>,
    /// Inclusive scroll region bounds.
    scroll_top: usize,
    scroll_bottom: usize,
    tab_stops: Vec<bool>,
    insert_mode: bool,
    autowrap: bool,
    origin_mode: bool,
    automatic_newline: bool,
    cursor_visible: bool,
    charset_index: usize,
    charsets: [char; 4],
    title: String,
    /// Lines of scrollback currently scrolled into view (0 = at bottom).
    scroll_offset: usize,
    /// Content changed since the front-end last redrew.
    pub dirty: bool,
    /// The child rang the bell; cleared by the front-end.
    pub bell: bool,
}

impl TextBuffer {
    pub fn new(cols: usize, rows: usize, config: BufferConfig) -> TextBuffer {
        let cols = cols.max(1);
        let rows = rows.max(1);
        TextBuffer {
            cols,
            rows,
            config,
            primary: blank_lines(rows).collect(),
            alternate: None,
            cursor_col: 0,
            cursor_row: 0,
            wrap_pending: false,
            style: Style::DEFAULT,
            saved_cursor: None,
            scroll_top: 0,
            scroll_bottom: rows - 1,
            tab_stops: default_tab_stops(cols),
            insert_mode: false,
            autowrap: true,
            origin_mode: false,
            automatic_newline: false,
            cursor_visible: true,
            charset_index: 0,
            charsets: ['B', '0', 'B', 'B'],
            title: String::new(),
            scroll_offset: 0,
            dirty: true,
            bell: false,
        }
    }

    /// Apply a batch of actions atomically, then flag for redraw.
    pub fn process_actions(&mut self, actions: &[TerminalAction]) {
        for action in actions {
            self.apply(action);
        }
        if self.config.scroll_tty_output {
            self.scroll_offset = 0;
        }
        self.scroll_offset = self.scroll_offset.min(self.scrollback_len());
        self.dirty = true;
    }

    /// The single mutation entry point.
    pub fn apply(&mut self, action: &TerminalAction) {
        match action {
            TerminalAction::PlainText(text) => self.write(text),
            TerminalAction::SpecialChar(ch) => self.special(*ch),
            TerminalAction::SetStyle(style) => self.style = *style,
            TerminalAction::CursorMove { relative, col, row } => {
                self.cursor_move(*relative, *col, *row)
            }
            TerminalAction::EraseInDisplay(clear) => self.erase_display(*clear),
            TerminalAction::EraseInLine(clear) => self.erase_line(*clear),
            TerminalAction::InsertLines(count) => self.insert_lines(*count),
            TerminalAction::DeleteLines(count) => self.delete_lines(*count),
            TerminalAction::InsertChars(count) => self.insert_chars(*count),
            TerminalAction::DeleteChars(count) => self.delete_chars(*count),
            TerminalAction::SetScrollRegion { top, bottom } => {
                self.set_scroll_region(*top, *bottom)
            }
            TerminalAction::SaveCursor => self.save_cursor(),
            TerminalAction::RestoreCursor => self.restore_cursor(),
            TerminalAction::SetMode { mode, enabled } => self.set_mode(*mode, *enabled),
            TerminalAction::TabSet => self.tab_set(),
            TerminalAction::TabClear(mode) => self.tab_clear(*mode),
            TerminalAction::DesignateCharset { index, set } => {
                if *index < 4 {
                    self.charsets[*index] = *set;
                }
            }
            TerminalAction::InvokeCharset(index) => self.charset_index = (*index).min(3),
            TerminalAction::Resize { cols, rows } => self.size_changed(*cols, *rows),
            TerminalAction::Bell => self.bell = true,
            TerminalAction::WindowTitle(title) => self.title = title.clone(),
            TerminalAction::ReverseIndex => self.reverse_index(),
            TerminalAction::FullReset => self.reset(),
        }
    }

    // ----- geometry and views -----

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Cursor position as (col, row); col may equal `cols` while a wrap is
    /// pending.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_col, self.cursor_row)
    }

    pub fn is_cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn set_cursor_visible(&mut self, visible: bool) {
        self.cursor_visible = visible;
        self.dirty = true;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_alternate_active(&self) -> bool {
        self.alternate.is_some()
    }

    /// Inclusive (top, bottom) scroll region bounds.
    pub fn scroll_region(&self) -> (usize, usize) {
        (self.scroll_top, self.scroll_bottom)
    }

    pub fn current_style(&self) -> Style {
        self.style
    }

    /// Lines retained above the visible screen.
    pub fn scrollback_len(&self) -> usize {
        self.primary.len() - self.rows
    }

    /// A scrollback line, 0 being the oldest retained line.
    pub fn scrollback_line(&self, index: usize) -> Option<&TextLine> {
        if index < self.scrollback_len() {
            self.primary.get(index)
        } else {
            None
        }
    }

    /// A visible line of the active buffer.
    pub fn visible_line(&self, row: usize) -> &TextLine {
        match &self.alternate {
            Some(alt) => &alt[row],
            None => &self.primary[self.visible_base() + row],
        }
    }

    /// Display text of a visible row, tab sentinels projected to spaces.
    pub fn row_text(&self, row: usize) -> String {
        self.visible_line(row).display_string()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll_offset = offset.min(self.scrollback_len());
        self.dirty = true;
    }

    fn visible_base(&self) -> usize {
        self.primary.len() - self.rows
    }

    fn line_mut(&mut self, row: usize) -> &mut TextLine {
        match &mut self.alternate {
            Some(alt) => &mut alt[row],
            None => {
                let base = self.primary.len() - self.rows;
                &mut self.primary[base + row]
            }
        }
    }

    // ----- writing -----

    /// Write plain text at the cursor, honoring insert mode and deferred
    /// autowrap.
    pub fn write(&mut self, text: &str) {
        for ch in text.chars() {
            if self.wrap_pending {
                self.wrap_pending = false;
                if self.autowrap {
                    self.cursor_col = 0;
                    self.line_feed();
                }
            }
            let col = self.cursor_col.min(self.cols - 1);
            let cols = self.cols;
            let style = self.style;
            let insert = self.insert_mode;
            let row = self.cursor_row;

            let mut utf8 = [0u8; 4];
            let piece: &str = ch.encode_utf8(&mut utf8);
            let line = self.line_mut(row);
            if insert {
                line.insert_text(col, piece, style);
                if line.len() > cols {
                    let len = line.len();
                    line.kill_text(cols, len);
                }
            } else {
                line.write_text(col, piece, style);
            }

            if col + 1 >= self.cols {
                if self.autowrap {
                    self.cursor_col = self.cols;
                    self.wrap_pending = true;
                } else {
                    self.cursor_col = self.cols - 1;
                }
            } else {
                self.cursor_col = col + 1;
            }
        }
    }

    /// Apply one of the special characters.
    pub fn special(&mut self, ch: SpecialChar) {
        match ch {
            SpecialChar::LineFeed | SpecialChar::VerticalTab => {
                self.line_feed();
                if self.automatic_newline {
                    self.cursor_col = 0;
                }
            }
            SpecialChar::CarriageReturn => {
                self.cursor_col = 0;
                self.wrap_pending = false;
            }
            SpecialChar::Backspace => {
                self.wrap_pending = false;
                if self.cursor_col > 0 {
                    self.cursor_col = (self.cursor_col - 1).min(self.cols - 1);
                }
            }
            SpecialChar::HorizontalTab => self.horizontal_tab(),
        }
    }

    fn line_feed(&mut self) {
        self.wrap_pending = false;
        self.cursor_col = self.cursor_col.min(self.cols - 1);
        if self.cursor_row == self.scroll_bottom {
            self.scroll_region_up_once(self.scroll_top, self.scroll_bottom, true);
        } else if self.cursor_row + 1 < self.rows {
            self.cursor_row += 1;
        }
    }

    fn reverse_index(&mut self) {
        self.wrap_pending = false;
        if self.cursor_row == self.scroll_top {
            self.scroll_region_down_once(self.scroll_top, self.scroll_bottom);
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
        }
    }

    fn horizontal_tab(&mut self) {
        self.wrap_pending = false;
        let col = self.cursor_col.min(self.cols - 1);
        let next = self.next_tab_stop(col);
        let width = next - col;
        if width > 0 {
            let style = self.style;
            let row = self.cursor_row;
            self.line_mut(row).write_tab(col, width, style);
            self.cursor_col = next;
        }
    }

    fn next_tab_stop(&self, col: usize) -> usize {
        for candidate in col + 1..self.cols {
            if self.tab_stops[candidate] {
                return candidate;
            }
        }
        self.cols - 1
    }

    // ----- scrolling -----

    /// Scroll the region `[top, bottom]` up one line. The evicted line
    /// migrates into scrollback only for a full-screen region on the
    /// primary buffer.
    fn scroll_region_up_once(&mut self, top: usize, bottom: usize, allow_scrollback: bool) {
        let full_screen = top == 0 && bottom == self.rows - 1;
        match &mut self.alternate {
            Some(alt) => {
                alt.remove(top);
                alt.insert(bottom, TextLine::new());
            }
            None if allow_scrollback && full_screen => {
                self.primary.push_back(TextLine::new());
                while self.primary.len() - self.rows > self.config.scrollback_lines {
                    self.primary.pop_front();
                }
            }
            None => {
                let base = self.visible_base();
                self.primary.remove(base + top);
                self.primary.insert(base + bottom, TextLine::new());
            }
        }
    }

    /// Scroll the region `[top, bottom]` down one line.
    fn scroll_region_down_once(&mut self, top: usize, bottom: usize) {
        match &mut self.alternate {
            Some(alt) => {
                alt.remove(bottom);
                alt.insert(top, TextLine::new());
            }
            None => {
                let base = self.visible_base();
                self.primary.remove(base + bottom);
                self.primary.insert(base + top, TextLine::new());
            }
        }
    }

    // ----- cursor -----

    fn cursor_move(&mut self, relative: bool, col: Option<i32>, row: Option<i32>) {
        self.wrap_pending = false;
        if relative {
            let dc = col.unwrap_or(0);
            let dr = row.unwrap_or(0);
            let current_col = self.cursor_col.min(self.cols - 1) as i32;
            self.cursor_col = (current_col + dc).clamp(0, self.cols as i32 - 1) as usize;
            self.cursor_row =
                (self.cursor_row as i32 + dr).clamp(0, self.rows as i32 - 1) as usize;
        } else {
            if let Some(row) = row {
                let row = row.max(0) as usize;
                self.cursor_row = if self.origin_mode {
                    (self.scroll_top + row).min(self.scroll_bottom)
                } else {
                    row.min(self.rows - 1)
                };
            }
            if let Some(col) = col {
                self.cursor_col = (col.max(0) as usize).min(self.cols - 1);
            }
        }
    }

    fn save_cursor(&mut self) {
        self.saved_cursor = Some(SavedCursor {
            col: self.cursor_col.min(self.cols - 1),
            row: self.cursor_row,
            style: self.style,
            charset_index: self.charset_index,
            charsets: self.charsets,
            origin_mode: self.origin_mode,
            autowrap: self.autowrap,
        });
    }

    fn restore_cursor(&mut self) {
        if let Some(saved) = self.saved_cursor {
            self.cursor_col = saved.col.min(self.cols - 1);
            self.cursor_row = saved.row.min(self.rows - 1);
            self.style = saved.style;
            self.charset_index = saved.charset_index;
            self.charsets = saved.charsets;
            self.origin_mode = saved.origin_mode;
            self.autowrap = saved.autowrap;
            self.wrap_pending = false;
        }
    }

    // ----- erasing -----

    fn erase_display(&mut self, clear: DisplayClear) {
        match clear {
            DisplayClear::Below => {
                self.erase_line(LineClear::Right);
                for row in self.cursor_row + 1..self.rows {
                    self.line_mut(row).clear();
                }
            }
            DisplayClear::Above => {
                for row in 0..self.cursor_row {
                    self.line_mut(row).clear();
                }
                self.erase_line(LineClear::Left);
            }
            DisplayClear::All => {
                for row in 0..self.rows {
                    self.line_mut(row).clear();
                }
            }
        }
    }

    fn erase_line(&mut self, clear: LineClear) {
        let col = self.cursor_col.min(self.cols - 1);
        let row = self.cursor_row;
        let line = self.line_mut(row);
        match clear {
            LineClear::Right => {
                let len = line.len();
                line.kill_text(col, len);
            }
            LineClear::Left => {
                let blanks = " ".repeat(col + 1);
                line.write_text(0, &blanks, Style::DEFAULT);
            }
            LineClear::All => line.clear(),
        }
    }

    // ----- line and character editing -----

    fn insert_lines(&mut self, count: usize) {
        if self.cursor_row < self.scroll_top || self.cursor_row > self.scroll_bottom {
            return;
        }
        let count = count.min(self.scroll_bottom - self.cursor_row + 1);
        for _ in 0..count {
            self.scroll_region_down_once(self.cursor_row, self.scroll_bottom);
        }
        self.cursor_col = 0;
        self.wrap_pending = false;
    }

    fn delete_lines(&mut self, count: usize) {
        if self.cursor_row < self.scroll_top || self.cursor_row > self.scroll_bottom {
            return;
        }
        let count = count.min(self.scroll_bottom - self.cursor_row + 1);
        for _ in 0..count {
            self.scroll_region_up_once(self.cursor_row, self.scroll_bottom, false);
        }
        self.cursor_col = 0;
        self.wrap_pending = false;
    }

    fn insert_chars(&mut self, count: usize) {
        let col = self.cursor_col.min(self.cols - 1);
        let count = count.min(self.cols - col);
        let cols = self.cols;
        let row = self.cursor_row;
        let line = self.line_mut(row);
        line.insert_text(col, &" ".repeat(count), Style::DEFAULT);
        if line.len() > cols {
            let len = line.len();
            line.kill_text(cols, len);
        }
    }

    fn delete_chars(&mut self, count: usize) {
        let col = self.cursor_col.min(self.cols - 1);
        let row = self.cursor_row;
        let line = self.line_mut(row);
        line.kill_text(col, col + count);
    }

    // ----- regions, tabs, modes -----

    fn set_scroll_region(&mut self, top: usize, bottom: usize) {
        let top = top.min(self.rows - 1);
        let bottom = bottom.min(self.rows - 1);
        if top >= bottom {
            self.scroll_top = 0;
            self.scroll_bottom = self.rows - 1;
        } else {
            self.scroll_top = top;
            self.scroll_bottom = bottom;
        }
        // DECSTBM homes the cursor (honoring origin mode).
        self.cursor_move(false, Some(0), Some(0));
    }

    fn tab_set(&mut self) {
        let col = self.cursor_col.min(self.cols - 1);
        self.tab_stops[col] = true;
    }

    fn tab_clear(&mut self, mode: TabClear) {
        match mode {
            TabClear::CurrentColumn => {
                let col = self.cursor_col.min(self.cols - 1);
                self.tab_stops[col] = false;
            }
            TabClear::All => self.tab_stops.iter_mut().for_each(|stop| *stop = false),
        }
    }

    fn set_mode(&mut self, mode: Mode, enabled: bool) {
        match mode {
            Mode::Insert => self.insert_mode = enabled,
            Mode::Autowrap => {
                self.autowrap = enabled;
                if !enabled {
                    self.wrap_pending = false;
                    self.cursor_col = self.cursor_col.min(self.cols - 1);
                }
            }
            Mode::Origin => {
                self.origin_mode = enabled;
                self.cursor_move(false, Some(0), Some(0));
            }
            Mode::AutomaticNewline => self.automatic_newline = enabled,
            Mode::ShowCursor => self.cursor_visible = enabled,
            Mode::AlternateScreen => {
                if enabled {
                    self.enter_alternate_screen();
                } else {
                    self.exit_alternate_screen();
                }
            }
        }
    }

    fn enter_alternate_screen(&mut self) {
        if self.alternate.is_none() {
            self.alternate = Some(blank_lines(self.rows).collect());
        }
    }

    fn exit_alternate_screen(&mut self) {
        self.alternate = None;
    }

    // ----- resize and reset -----

    /// Resize the screen. No reflow: lines keep their stored length, the
    /// cursor is clamped, the scroll region is reset to the full screen,
    /// and primary scrollback is preserved.
    pub fn size_changed(&mut self, cols: usize, rows: usize) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        if cols == self.cols && rows == self.rows {
            return;
        }
        let old_cols = self.cols;
        self.cols = cols;
        self.rows = rows;

        while self.primary.len() < rows {
            self.primary.push_back(TextLine::new());
        }
        if let Some(alt) = &mut self.alternate {
            alt.resize_with(rows, TextLine::new);
        }

        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.wrap_pending = false;
        self.cursor_col = self.cursor_col.min(cols - 1);
        self.cursor_row = self.cursor_row.min(rows - 1);

        self.tab_stops.resize(cols, false);
        for col in old_cols..cols {
            self.tab_stops[col] = col > 0 && col % 8 == 0;
        }

        self.scroll_offset = self.scroll_offset.min(self.scrollback_len());
        self.dirty = true;
    }

    /// RIS: back to the power-on state. Scrollback is discarded.
    pub fn reset(&mut self) {
        self.primary = blank_lines(self.rows).collect();
        self.alternate = None;
        self.cursor_col = 0;
        self.cursor_row = 0;
        self.wrap_pending = false;
        self.style = Style::DEFAULT;
        self.saved_cursor = None;
        self.scroll_top = 0;
        self.scroll_bottom = self.rows - 1;
        self.tab_stops = default_tab_stops(self.cols);
        self.insert_mode = false;
        self.autowrap = true;
        self.origin_mode = false;
        self.automatic_newline = false;
        self.cursor_visible = true;
        self.charset_index = 0;
        self.charsets = ['B', '0', 'B', 'B'];
        self.title.clear();
        self.scroll_offset = 0;
        self.dirty = true;
    }
}

fn blank_lines(count: usize) -> impl Iterator<Item = TextLine> {
    std::iter::repeat_with(TextLine::new).take(count)
}

fn default_tab_stops(cols: usize) -> Vec<bool> {
    (0..cols).map(|col| col > 0 && col % 8 == 0).collect()
}
