//! Styled line storage
//!
//! A `TextLine` holds the characters of one terminal line together with a
//! parallel style array, and provides the mutators a virtual terminal needs
//! for overwriting, inserting and removing text.
//!
//! Tabs are stored structurally: a tab occupies a run of cells beginning
//! with `TAB_START` followed by one `TAB_CONTINUE` per extra column the tab
//! spans. Tab stop positions can change at any time in the outside world,
//! but a line must keep its integrity once a tab has been drawn into it, so
//! the run length is frozen at write time. The sentinels are projected to
//! spaces for display and collapsed back to `\t` for the clipboard.

use crate::style::Style;

pub const TAB_START: char = '\t';
pub const TAB_CONTINUE: char = '\r';

/// One screen line: characters plus one style per character.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    chars: Vec<char>,
    styles: Vec<Style>,
}

/// A run of equally-styled characters, as produced by
/// [`TextLine::styled_segments`].
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    pub text: String,
    pub style: Style,
}

impl TextLine {
    pub fn new() -> TextLine {
        TextLine::default()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.styles.clear();
    }

    pub fn style_at(&self, index: usize) -> Style {
        self.styles.get(index).copied().unwrap_or(Style::DEFAULT)
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    /// The text of this line with the tab sentinels projected to spaces.
    pub fn display_string(&self) -> String {
        self.chars
            .iter()
            .map(|&ch| {
                if ch == TAB_START || ch == TAB_CONTINUE {
                    ' '
                } else {
                    ch
                }
            })
            .collect()
    }

    /// The text of `[start, end)` with tabs put back in, for the clipboard:
    /// `TAB_START` survives as a real `\t`, `TAB_CONTINUE`s are dropped.
    pub fn tabbed_string(&self, start: usize, end: usize) -> String {
        let end = end.min(self.chars.len());
        if start >= end {
            return String::new();
        }
        self.chars[start..end]
            .iter()
            .filter(|&&ch| ch != TAB_CONTINUE)
            .collect()
    }

    /// Lazily iterates over (text, style) runs, merging equal-style
    /// neighbours. Sentinels are projected to spaces as in
    /// [`display_string`](Self::display_string).
    pub fn styled_segments(&self) -> impl Iterator<Item = StyledRun> + '_ {
        SegmentIter { line: self, next: 0 }
    }

    /// The offset of the character containing `offset`: `offset` itself for
    /// most characters, but the start of the run when `offset` sits on a
    /// `TAB_CONTINUE`.
    pub fn effective_char_start(&self, offset: usize) -> usize {
        if offset >= self.chars.len() {
            return offset;
        }
        let mut i = offset;
        while i > 0 && self.chars[i] == TAB_CONTINUE {
            i -= 1;
        }
        i
    }

    /// The offset of the first character at or after `offset` that is not a
    /// `TAB_CONTINUE`, i.e. the first position past the run containing
    /// `offset`'s tail.
    pub fn effective_char_end(&self, offset: usize) -> usize {
        if offset >= self.chars.len() {
            return offset;
        }
        let mut i = offset;
        while i < self.chars.len() && self.chars[i] == TAB_CONTINUE {
            i += 1;
        }
        i
    }

    /// Inserts text at `offset`, moving anything already there to the right.
    pub fn insert_text(&mut self, offset: usize, text: &str, style: Style) {
        self.pad_to(offset);
        for (i, ch) in text.chars().enumerate() {
            self.chars.insert(offset + i, ch);
            self.styles.insert(offset + i, style);
        }
        self.repair_tab_at(offset + text.chars().count());
    }

    /// Writes text at `offset`, overwriting anything underneath and
    /// extending the line with default-styled spaces first if `offset` is
    /// past the current end.
    pub fn write_text(&mut self, offset: usize, text: &str, style: Style) {
        self.pad_to(offset);
        let mut i = offset;
        for ch in text.chars() {
            if i < self.chars.len() {
                self.chars[i] = ch;
                self.styles[i] = style;
            } else {
                self.chars.push(ch);
                self.styles.push(style);
            }
            i += 1;
        }
        self.repair_tab_at(i);
    }

    /// Removes the characters in `[start, end)`.
    pub fn kill_text(&mut self, start: usize, end: usize) {
        if start >= end || start >= self.chars.len() {
            return;
        }
        let end = end.min(self.chars.len());
        self.chars.drain(start..end);
        self.styles.drain(start..end);
        self.repair_tab_at(start);
    }

    /// Inserts a tab run of `width` columns at `offset`, shifting the rest
    /// of the line right.
    pub fn insert_tab(&mut self, offset: usize, width: usize, style: Style) {
        if width == 0 {
            return;
        }
        self.insert_text(offset, &tab_run(width), style);
    }

    /// Writes a tab run of `width` columns at `offset`, overwriting.
    /// If the cell just past the new run was the continuation of an
    /// existing tab, it is promoted to a `TAB_START` so the remnant remains
    /// a shorter tab rather than dangling continuations.
    pub fn write_tab(&mut self, offset: usize, width: usize, style: Style) {
        if width == 0 {
            return;
        }
        self.write_text(offset, &tab_run(width), style);
    }

    fn pad_to(&mut self, offset: usize) {
        while self.chars.len() < offset {
            self.chars.push(' ');
            self.styles.push(Style::DEFAULT);
        }
    }

    /// A mutation that cut the line at `offset` may have left a tab run
    /// starting with a bare `TAB_CONTINUE` there; promote it so every run
    /// still begins with `TAB_START`.
    fn repair_tab_at(&mut self, offset: usize) {
        if offset < self.chars.len() && self.chars[offset] == TAB_CONTINUE {
            self.chars[offset] = TAB_START;
        }
    }
}

fn tab_run(width: usize) -> String {
    let mut run = String::with_capacity(width);
    run.push(TAB_START);
    for _ in 1..width {
        run.push(TAB_CONTINUE);
    }
    run
}

struct SegmentIter<'a> {
    line: &'a TextLine,
    next: usize,
}

impl Iterator for SegmentIter<'_> {
    type Item = StyledRun;

    fn next(&mut self) -> Option<StyledRun> {
        if self.next >= self.line.chars.len() {
            return None;
        }
        let start = self.next;
        let style = self.line.styles[start];
        let mut end = start + 1;
        while end < self.line.chars.len() && self.line.styles[end] == style {
            end += 1;
        }
        self.next = end;
        let text = self.line.chars[start..end]
            .iter()
            .map(|&ch| {
                if ch == TAB_START || ch == TAB_CONTINUE {
                    ' '
                } else {
                    ch
                }
            })
            .collect();
        Some(StyledRun { text, style })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> Style {
        let mut style = Style::DEFAULT;
        style.set_bold(true);
        style
    }

    fn assert_parity(line: &TextLine) {
        assert_eq!(line.chars.len(), line.styles.len());
    }

    fn assert_well_formed_tabs(line: &TextLine) {
        for i in 0..line.len() {
            if line.chars[i] == TAB_CONTINUE {
                assert!(i > 0, "TAB_CONTINUE at line start");
                let prev = line.chars[i - 1];
                assert!(
                    prev == TAB_START || prev == TAB_CONTINUE,
                    "TAB_CONTINUE at {} not preceded by a tab cell",
                    i
                );
            }
        }
    }

    #[test]
    fn test_write_and_display() {
        let mut line = TextLine::new();
        line.write_text(0, "hello", Style::DEFAULT);
        assert_eq!(line.display_string(), "hello");
        assert_eq!(line.len(), 5);
        assert_parity(&line);
    }

    #[test]
    fn test_write_past_end_pads_with_default_spaces() {
        let mut line = TextLine::new();
        line.write_text(3, "x", bold());
        assert_eq!(line.display_string(), "   x");
        assert_eq!(line.style_at(0), Style::DEFAULT);
        assert_eq!(line.style_at(3), bold());
        assert_parity(&line);
    }

    #[test]
    fn test_overwrite_keeps_tail() {
        let mut line = TextLine::new();
        line.write_text(0, "abcdef", Style::DEFAULT);
        line.write_text(1, "XY", bold());
        assert_eq!(line.display_string(), "aXYdef");
        assert_eq!(line.style_at(1), bold());
        assert_eq!(line.style_at(3), Style::DEFAULT);
    }

    #[test]
    fn test_insert_shifts_right() {
        let mut line = TextLine::new();
        line.write_text(0, "abc", Style::DEFAULT);
        line.insert_text(1, "XY", bold());
        assert_eq!(line.display_string(), "aXYbc");
        assert_parity(&line);
    }

    #[test]
    fn test_kill_text() {
        let mut line = TextLine::new();
        line.write_text(0, "abcdef", Style::DEFAULT);
        line.kill_text(2, 4);
        assert_eq!(line.display_string(), "abef");

        // Out-of-range and inverted ranges are no-ops.
        line.kill_text(10, 20);
        line.kill_text(3, 3);
        assert_eq!(line.display_string(), "abef");
    }

    #[test]
    fn test_tab_run_shape() {
        let mut line = TextLine::new();
        line.write_tab(0, 4, Style::DEFAULT);
        assert_eq!(line.len(), 4);
        assert_eq!(line.char_at(0), Some(TAB_START));
        assert_eq!(line.char_at(3), Some(TAB_CONTINUE));
        assert_eq!(line.display_string(), "    ");
        assert_well_formed_tabs(&line);
    }

    #[test]
    fn test_write_tab_promotes_partially_overwritten_tab() {
        let mut line = TextLine::new();
        line.write_tab(0, 8, Style::DEFAULT);
        // Overwrite the first half with a shorter tab: the remnant must
        // become a tab of its own, not a headless run of continuations.
        line.write_tab(0, 4, Style::DEFAULT);
        assert_eq!(line.char_at(4), Some(TAB_START));
        assert_well_formed_tabs(&line);
        assert_eq!(line.tabbed_string(0, line.len()), "\t\t");
    }

    #[test]
    fn test_write_text_over_tab_head_promotes_remnant() {
        let mut line = TextLine::new();
        line.write_tab(0, 4, Style::DEFAULT);
        line.write_text(0, "ab", Style::DEFAULT);
        assert_eq!(line.char_at(2), Some(TAB_START));
        assert_well_formed_tabs(&line);
    }

    #[test]
    fn test_kill_inside_tab_promotes_remnant() {
        let mut line = TextLine::new();
        line.write_text(0, "ab", Style::DEFAULT);
        line.write_tab(2, 4, Style::DEFAULT);
        line.kill_text(1, 3);
        assert_well_formed_tabs(&line);
    }

    #[test]
    fn test_effective_offsets() {
        let mut line = TextLine::new();
        line.write_text(0, "ab", Style::DEFAULT);
        line.write_tab(2, 4, Style::DEFAULT);
        line.write_text(6, "c", Style::DEFAULT);
        // Positions: a b TAB_START x3 continues c
        assert_eq!(line.effective_char_start(1), 1);
        assert_eq!(line.effective_char_start(4), 2);
        assert_eq!(line.effective_char_end(4), 6);
        assert_eq!(line.effective_char_end(6), 6);
        assert_eq!(line.effective_char_start(99), 99);
    }

    #[test]
    fn test_tabbed_string_has_no_continuations() {
        let mut line = TextLine::new();
        line.write_text(0, "a", Style::DEFAULT);
        line.write_tab(1, 7, Style::DEFAULT);
        line.write_text(8, "b", Style::DEFAULT);
        let clip = line.tabbed_string(0, line.len());
        assert_eq!(clip, "a\tb");
        assert!(!clip.contains(TAB_CONTINUE));
    }

    #[test]
    fn test_styled_segments_merge_neighbours() {
        let mut line = TextLine::new();
        line.write_text(0, "aa", Style::DEFAULT);
        line.write_text(2, "bb", bold());
        line.write_text(4, "cc", bold());
        line.write_text(6, "d", Style::DEFAULT);
        let segments: Vec<StyledRun> = line.styled_segments().collect();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].text, "aa");
        assert_eq!(segments[1].text, "bbcc");
        assert_eq!(segments[1].style, bold());
        assert_eq!(segments[2].text, "d");
    }

    #[test]
    fn test_clear() {
        let mut line = TextLine::new();
        line.write_text(0, "abc", bold());
        line.clear();
        assert!(line.is_empty());
        assert_eq!(line.display_string(), "");
    }
}
