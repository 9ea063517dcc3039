//! VT100/xterm sequence parsing
//!
//! Uses the `vte` crate for UTF-8 decoding and escape-sequence recognition.
//! Unlike a parser that mutates a screen directly, this one reduces each
//! chunk of child output to a batch of [`TerminalAction`]s; the batch is
//! applied to the screen model atomically on the UI thread.
//!
//! Charset state lives here rather than in the screen model because it has
//! to affect the translation of the very next decoded character, before any
//! batch is applied. DECSC/DECRC snapshot the charset half of the saved
//! cursor on this side; the screen model keeps the positional half.

use vte::Params;

use crate::action::{
    DisplayClear, LineClear, Mode, SpecialChar, TabClear, TerminalAction,
};
use crate::charset::Charsets;
use crate::style::Style;

/// Streaming parser: feed raw PTY bytes in, take action batches out.
pub struct Parser {
    machine: vte::Parser,
    performer: Performer,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            machine: vte::Parser::new(),
            performer: Performer::new(),
        }
    }

    /// Parse a chunk of bytes from the child, returning the actions it
    /// produced. Escape sequences split across chunks are carried over in
    /// the state machine, so the resulting screen state is independent of
    /// how the byte stream is chunked.
    pub fn process(&mut self, bytes: &[u8]) -> Vec<TerminalAction> {
        for &byte in bytes {
            self.machine.advance(&mut self.performer, byte);
        }
        self.performer.flush_text();
        std::mem::take(&mut self.performer.actions)
    }
}

struct Performer {
    actions: Vec<TerminalAction>,
    pending_text: String,
    style: Style,
    charsets: Charsets,
    saved_charsets: Option<([char; 4], usize)>,
}

impl Performer {
    fn new() -> Performer {
        Performer {
            actions: Vec::new(),
            pending_text: String::new(),
            style: Style::DEFAULT,
            charsets: Charsets::new(),
            saved_charsets: None,
        }
    }

    fn flush_text(&mut self) {
        if !self.pending_text.is_empty() {
            let text = std::mem::take(&mut self.pending_text);
            self.actions.push(TerminalAction::PlainText(text));
        }
    }

    fn emit(&mut self, action: TerminalAction) {
        self.flush_text();
        self.actions.push(action);
    }

    fn save_cursor(&mut self) {
        self.saved_charsets = Some((self.charsets.designations(), self.charsets.invoked()));
        self.emit(TerminalAction::SaveCursor);
    }

    fn restore_cursor(&mut self) {
        if let Some((designations, invoked)) = self.saved_charsets {
            self.charsets.restore(designations, invoked);
        }
        self.emit(TerminalAction::RestoreCursor);
    }

    fn full_reset(&mut self) {
        self.style = Style::DEFAULT;
        self.charsets = Charsets::new();
        self.saved_charsets = None;
        self.emit(TerminalAction::FullReset);
    }

    fn handle_sgr(&mut self, params: &[u16]) {
        if params.is_empty() {
            self.style.reset();
        }
        for &param in params {
            match param {
                0 => self.style.reset(),
                1 => self.style.set_bold(true),
                4 => self.style.set_underlined(true),
                7 => self.style.set_reverse_video(true),
                22 => self.style.set_bold(false),
                24 => self.style.set_underlined(false),
                27 => self.style.set_reverse_video(false),
                30..=37 => self.style.set_foreground(Some((param - 30) as u8)),
                39 => self.style.set_foreground(None),
                40..=47 => self.style.set_background(Some((param - 40) as u8)),
                49 => self.style.set_background(None),
                _ => {
                    log::debug!("Ignoring unknown SGR parameter: {}", param);
                }
            }
        }
        self.emit(TerminalAction::SetStyle(self.style));
    }

    fn handle_dec_mode(&mut self, mode: u16, enabled: bool) {
        match mode {
            // DECOM - origin mode
            6 => self.emit(TerminalAction::SetMode {
                mode: Mode::Origin,
                enabled,
            }),
            // DECAWM - autowrap
            7 => self.emit(TerminalAction::SetMode {
                mode: Mode::Autowrap,
                enabled,
            }),
            // DECTCEM - cursor visibility
            25 => self.emit(TerminalAction::SetMode {
                mode: Mode::ShowCursor,
                enabled,
            }),
            // Alternate screen
            47 | 1047 => self.emit(TerminalAction::SetMode {
                mode: Mode::AlternateScreen,
                enabled,
            }),
            // Save/restore cursor as a mode
            1048 => {
                if enabled {
                    self.save_cursor();
                } else {
                    self.restore_cursor();
                }
            }
            // Alternate screen with save/restore and clear
            1049 => {
                if enabled {
                    self.save_cursor();
                    self.emit(TerminalAction::SetMode {
                        mode: Mode::AlternateScreen,
                        enabled: true,
                    });
                    self.emit(TerminalAction::EraseInDisplay(DisplayClear::All));
                } else {
                    self.emit(TerminalAction::SetMode {
                        mode: Mode::AlternateScreen,
                        enabled: false,
                    });
                    self.restore_cursor();
                }
            }
            _ => {
                log::debug!("Ignoring unknown DEC private mode: {} = {}", mode, enabled);
            }
        }
    }

    fn handle_ansi_mode(&mut self, mode: u16, enabled: bool) {
        match mode {
            // IRM - insert mode
            4 => self.emit(TerminalAction::SetMode {
                mode: Mode::Insert,
                enabled,
            }),
            // LNM - automatic newline
            20 => self.emit(TerminalAction::SetMode {
                mode: Mode::AutomaticNewline,
                enabled,
            }),
            _ => {
                log::debug!("Ignoring unknown ANSI mode: {} = {}", mode, enabled);
            }
        }
    }
}

impl vte::Perform for Performer {
    fn print(&mut self, ch: char) {
        self.pending_text.push(self.charsets.translate(ch));
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            // Most telnetds shipped a trailing NUL with their C strings;
            // swallow it rather than render a replacement glyph.
            0x00 => {}
            // BEL
            0x07 => self.emit(TerminalAction::Bell),
            // BS
            0x08 => self.emit(TerminalAction::SpecialChar(SpecialChar::Backspace)),
            // HT
            0x09 => self.emit(TerminalAction::SpecialChar(SpecialChar::HorizontalTab)),
            // LF; FF has no action of its own and behaves as LF
            0x0a | 0x0c => self.emit(TerminalAction::SpecialChar(SpecialChar::LineFeed)),
            // VT
            0x0b => self.emit(TerminalAction::SpecialChar(SpecialChar::VerticalTab)),
            // CR
            0x0d => self.emit(TerminalAction::SpecialChar(SpecialChar::CarriageReturn)),
            // SO - invoke G1
            0x0e => {
                self.flush_text();
                self.charsets.invoke(1);
                self.actions.push(TerminalAction::InvokeCharset(1));
            }
            // SI - invoke G0
            0x0f => {
                self.flush_text();
                self.charsets.invoke(0);
                self.actions.push(TerminalAction::InvokeCharset(0));
            }
            _ => {
                log::debug!("Discarding unhandled control byte: 0x{:02x}", byte);
            }
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], _ignore: bool, byte: u8) {
        match (byte, intermediates) {
            // IND - index, same motion as a line feed
            (b'D', []) => self.emit(TerminalAction::SpecialChar(SpecialChar::LineFeed)),
            // NEL - next line
            (b'E', []) => {
                self.emit(TerminalAction::SpecialChar(SpecialChar::CarriageReturn));
                self.actions
                    .push(TerminalAction::SpecialChar(SpecialChar::LineFeed));
            }
            // RI - reverse index
            (b'M', []) => self.emit(TerminalAction::ReverseIndex),
            // HTS - set tab stop at the current column
            (b'H', []) => self.emit(TerminalAction::TabSet),
            // DECSC / DECRC
            (b'7', []) => self.save_cursor(),
            (b'8', []) => self.restore_cursor(),
            // RIS - full reset
            (b'c', []) => self.full_reset(),
            // SCS - designate G0-G3
            (set, [designator @ (b'(' | b')' | b'*' | b'+')]) => {
                let index = match designator {
                    b'(' => 0,
                    b')' => 1,
                    b'*' => 2,
                    _ => 3,
                };
                self.flush_text();
                self.charsets.designate(index, set as char);
                self.actions.push(TerminalAction::DesignateCharset {
                    index,
                    set: set as char,
                });
            }
            _ => {
                log::debug!(
                    "Discarding unhandled ESC sequence: byte=0x{:02x}, intermediates={:?}",
                    byte,
                    intermediates
                );
            }
        }
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, action: char) {
        let params = params_to_vec(params);

        match (action, intermediates) {
            // CUU / CUD / CUF / CUB - relative cursor motion
            ('A', []) => self.emit(cursor_by(0, -(first_param(&params, 1) as i32))),
            ('B', []) => self.emit(cursor_by(0, first_param(&params, 1) as i32)),
            ('C', []) => self.emit(cursor_by(first_param(&params, 1) as i32, 0)),
            ('D', []) => self.emit(cursor_by(-(first_param(&params, 1) as i32), 0)),
            // CUP / HVP - absolute position, 1-based on the wire
            ('H', []) | ('f', []) => {
                let row = first_param(&params, 1).saturating_sub(1);
                let col = second_param(&params, 1).saturating_sub(1);
                self.emit(TerminalAction::CursorMove {
                    relative: false,
                    col: Some(col as i32),
                    row: Some(row as i32),
                });
            }
            // ED - erase in display
            ('J', []) => {
                let clear = match first_param(&params, 0) {
                    0 => DisplayClear::Below,
                    1 => DisplayClear::Above,
                    2 => DisplayClear::All,
                    mode => {
                        log::debug!("Discarding unknown erase-in-display mode: {}", mode);
                        return;
                    }
                };
                self.emit(TerminalAction::EraseInDisplay(clear));
            }
            // EL - erase in line
            ('K', []) => {
                let clear = match first_param(&params, 0) {
                    0 => LineClear::Right,
                    1 => LineClear::Left,
                    2 => LineClear::All,
                    mode => {
                        log::debug!("Discarding unknown erase-in-line mode: {}", mode);
                        return;
                    }
                };
                self.emit(TerminalAction::EraseInLine(clear));
            }
            // IL / DL - insert/delete lines
            ('L', []) => self.emit(TerminalAction::InsertLines(first_param(&params, 1) as usize)),
            ('M', []) => self.emit(TerminalAction::DeleteLines(first_param(&params, 1) as usize)),
            // DCH / ICH - delete/insert characters
            ('P', []) => self.emit(TerminalAction::DeleteChars(first_param(&params, 1) as usize)),
            ('@', []) => self.emit(TerminalAction::InsertChars(first_param(&params, 1) as usize)),
            // DECSTBM - scroll region, 1-based inclusive on the wire
            ('r', []) => {
                let top = first_param(&params, 1).saturating_sub(1) as usize;
                let bottom = match params.get(1).copied().filter(|&v| v != 0) {
                    Some(b) => (b as usize).saturating_sub(1),
                    // Missing bottom means the last row; the screen clamps.
                    None => usize::MAX,
                };
                self.emit(TerminalAction::SetScrollRegion { top, bottom });
            }
            // SGR
            ('m', []) => {
                self.flush_text();
                self.handle_sgr(&params);
            }
            // SM / RM with the DEC private marker
            ('h', [b'?']) | ('l', [b'?']) => {
                self.flush_text();
                let enabled = action == 'h';
                for &param in &params {
                    self.handle_dec_mode(param, enabled);
                }
            }
            // SM / RM, ANSI modes
            ('h', []) | ('l', []) => {
                self.flush_text();
                let enabled = action == 'h';
                for &param in &params {
                    self.handle_ansi_mode(param, enabled);
                }
            }
            // Save/restore cursor
            ('s', []) => self.save_cursor(),
            ('u', []) => self.restore_cursor(),
            // TBC - tab clear
            ('g', []) => match first_param(&params, 0) {
                0 => self.emit(TerminalAction::TabClear(TabClear::CurrentColumn)),
                3 => self.emit(TerminalAction::TabClear(TabClear::All)),
                mode => {
                    log::debug!("Discarding unknown tab clear mode: {}", mode);
                }
            },
            _ => {
                log::debug!(
                    "Discarding unhandled CSI sequence: action={:?}, intermediates={:?}, params={:?}",
                    action,
                    intermediates,
                    params
                );
            }
        }
    }

    fn osc_dispatch(&mut self, params: &[&[u8]], _bell_terminated: bool) {
        if params.len() < 2 {
            return;
        }
        match params[0] {
            // Set icon name and window title / set window title
            b"0" | b"2" => {
                if let Ok(title) = std::str::from_utf8(params[1]) {
                    self.emit(TerminalAction::WindowTitle(title.to_string()));
                }
            }
            command => {
                log::debug!(
                    "Discarding unhandled OSC: {:?}",
                    String::from_utf8_lossy(command)
                );
            }
        }
    }

    fn hook(&mut self, _params: &Params, _intermediates: &[u8], _ignore: bool, action: char) {
        log::debug!("Discarding unhandled DCS sequence: {:?}", action);
    }

    fn put(&mut self, _byte: u8) {}

    fn unhook(&mut self) {}
}

fn cursor_by(cols: i32, rows: i32) -> TerminalAction {
    TerminalAction::CursorMove {
        relative: true,
        col: Some(cols),
        row: Some(rows),
    }
}

fn params_to_vec(params: &Params) -> Vec<u16> {
    params
        .iter()
        .flat_map(|subparams| subparams.iter().copied())
        .collect()
}

fn first_param(params: &[u16], default: u16) -> u16 {
    params
        .first()
        .copied()
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

fn second_param(params: &[u16], default: u16) -> u16 {
    params
        .get(1)
        .copied()
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(bytes: &[u8]) -> Vec<TerminalAction> {
        Parser::new().process(bytes)
    }

    #[test]
    fn test_plain_text_is_one_segment() {
        let actions = parse(b"hello");
        assert_eq!(actions, vec![TerminalAction::PlainText("hello".into())]);
    }

    #[test]
    fn test_escape_flushes_pending_text() {
        let actions = parse(b"ab\x1b[2Dcd");
        assert_eq!(
            actions,
            vec![
                TerminalAction::PlainText("ab".into()),
                TerminalAction::CursorMove {
                    relative: true,
                    col: Some(-2),
                    row: Some(0),
                },
                TerminalAction::PlainText("cd".into()),
            ]
        );
    }

    #[test]
    fn test_cursor_position_is_normalized_to_zero_based() {
        let actions = parse(b"\x1b[6;11H");
        assert_eq!(
            actions,
            vec![TerminalAction::CursorMove {
                relative: false,
                col: Some(10),
                row: Some(5),
            }]
        );
    }

    #[test]
    fn test_empty_params_default() {
        // Bare CSI H homes the cursor.
        let actions = parse(b"\x1b[H");
        assert_eq!(
            actions,
            vec![TerminalAction::CursorMove {
                relative: false,
                col: Some(0),
                row: Some(0),
            }]
        );
    }

    #[test]
    fn test_sgr_red_then_reset() {
        let actions = parse(b"\x1b[31mRED\x1b[0m");
        let mut red = Style::DEFAULT;
        red.set_foreground(Some(1));
        assert_eq!(
            actions,
            vec![
                TerminalAction::SetStyle(red),
                TerminalAction::PlainText("RED".into()),
                TerminalAction::SetStyle(Style::DEFAULT),
            ]
        );
    }

    #[test]
    fn test_sgr_combined_params() {
        let actions = parse(b"\x1b[1;4;44m");
        let mut style = Style::DEFAULT;
        style.set_bold(true);
        style.set_underlined(true);
        style.set_background(Some(4));
        assert_eq!(actions, vec![TerminalAction::SetStyle(style)]);
    }

    #[test]
    fn test_sgr_unknown_params_ignored() {
        let actions = parse(b"\x1b[95m");
        assert_eq!(actions, vec![TerminalAction::SetStyle(Style::DEFAULT)]);
    }

    #[test]
    fn test_erase_modes() {
        assert_eq!(
            parse(b"\x1b[J"),
            vec![TerminalAction::EraseInDisplay(DisplayClear::Below)]
        );
        assert_eq!(
            parse(b"\x1b[2J"),
            vec![TerminalAction::EraseInDisplay(DisplayClear::All)]
        );
        assert_eq!(
            parse(b"\x1b[1K"),
            vec![TerminalAction::EraseInLine(LineClear::Left)]
        );
    }

    #[test]
    fn test_scroll_region() {
        assert_eq!(
            parse(b"\x1b[1;2r"),
            vec![TerminalAction::SetScrollRegion { top: 0, bottom: 1 }]
        );
        // No parameters: full screen.
        assert_eq!(
            parse(b"\x1b[r"),
            vec![TerminalAction::SetScrollRegion {
                top: 0,
                bottom: usize::MAX,
            }]
        );
    }

    #[test]
    fn test_modes() {
        assert_eq!(
            parse(b"\x1b[4h"),
            vec![TerminalAction::SetMode {
                mode: Mode::Insert,
                enabled: true,
            }]
        );
        assert_eq!(
            parse(b"\x1b[?7l"),
            vec![TerminalAction::SetMode {
                mode: Mode::Autowrap,
                enabled: false,
            }]
        );
        assert_eq!(
            parse(b"\x1b[?1049h"),
            vec![
                TerminalAction::SaveCursor,
                TerminalAction::SetMode {
                    mode: Mode::AlternateScreen,
                    enabled: true,
                },
                TerminalAction::EraseInDisplay(DisplayClear::All),
            ]
        );
    }

    #[test]
    fn test_osc_title_bel_and_st_terminated() {
        assert_eq!(
            parse(b"\x1b]0;my title\x07"),
            vec![TerminalAction::WindowTitle("my title".into())]
        );
        assert_eq!(
            parse(b"\x1b]2;other\x1b\\"),
            vec![TerminalAction::WindowTitle("other".into())]
        );
    }

    #[test]
    fn test_charset_translation_of_print() {
        let actions = parse(b"\x1b(0lqk\x1b(B");
        assert_eq!(
            actions,
            vec![
                TerminalAction::DesignateCharset { index: 0, set: '0' },
                TerminalAction::PlainText("┌─┐".into()),
                TerminalAction::DesignateCharset { index: 0, set: 'B' },
            ]
        );
    }

    #[test]
    fn test_shift_out_uses_default_g1_line_drawing() {
        let actions = parse(b"\x0eq\x0fq");
        assert_eq!(
            actions,
            vec![
                TerminalAction::InvokeCharset(1),
                TerminalAction::PlainText("─".into()),
                TerminalAction::InvokeCharset(0),
                TerminalAction::PlainText("q".into()),
            ]
        );
    }

    #[test]
    fn test_controls_bypass_inside_csi() {
        // Per vttest, CR takes effect even in the middle of a sequence and
        // the sequence still completes.
        let actions = parse(b"\x1b[\x0d2DX");
        assert_eq!(
            actions,
            vec![
                TerminalAction::SpecialChar(SpecialChar::CarriageReturn),
                TerminalAction::CursorMove {
                    relative: true,
                    col: Some(-2),
                    row: Some(0),
                },
                TerminalAction::PlainText("X".into()),
            ]
        );
    }

    #[test]
    fn test_chunk_split_mid_sequence() {
        let mut parser = Parser::new();
        let mut actions = parser.process(b"\x1b[3");
        assert!(actions.is_empty());
        actions = parser.process(b"1m");
        let mut red = Style::DEFAULT;
        red.set_foreground(Some(1));
        assert_eq!(actions, vec![TerminalAction::SetStyle(red)]);
    }

    #[test]
    fn test_utf8_decoding() {
        let mut parser = Parser::new();
        // Split a multi-byte scalar across chunks.
        let bytes = "héllo".as_bytes();
        let mut actions = parser.process(&bytes[..2]);
        actions.extend(parser.process(&bytes[2..]));
        let text: String = actions
            .iter()
            .filter_map(|a| match a {
                TerminalAction::PlainText(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(text, "héllo");
    }

    #[test]
    fn test_save_restore_round_trip() {
        assert_eq!(
            parse(b"\x1b7\x1b8"),
            vec![TerminalAction::SaveCursor, TerminalAction::RestoreCursor]
        );
        assert_eq!(
            parse(b"\x1b[s\x1b[u"),
            vec![TerminalAction::SaveCursor, TerminalAction::RestoreCursor]
        );
    }

    #[test]
    fn test_decrc_restores_charsets() {
        // Designate line drawing, save, back to ASCII, restore: the final
        // 'q' must translate through the restored line-drawing set.
        let actions = parse(b"\x1b(0\x1b7\x1b(Bq\x1b8q");
        let texts: Vec<&str> = actions
            .iter()
            .filter_map(|a| match a {
                TerminalAction::PlainText(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["q", "─"]);
    }

    #[test]
    fn test_full_reset() {
        let actions = parse(b"\x1b[31m\x1bcq");
        assert_eq!(
            actions,
            vec![
                TerminalAction::SetStyle({
                    let mut s = Style::DEFAULT;
                    s.set_foreground(Some(1));
                    s
                }),
                TerminalAction::FullReset,
                TerminalAction::PlainText("q".into()),
            ]
        );
    }

    #[test]
    fn test_bell_and_specials() {
        let actions = parse(b"a\x07b\x08\x09");
        assert_eq!(
            actions,
            vec![
                TerminalAction::PlainText("a".into()),
                TerminalAction::Bell,
                TerminalAction::PlainText("b".into()),
                TerminalAction::SpecialChar(SpecialChar::Backspace),
                TerminalAction::SpecialChar(SpecialChar::HorizontalTab),
            ]
        );
    }

    #[test]
    fn test_nul_is_swallowed() {
        assert_eq!(
            parse(b"a\x00b"),
            vec![TerminalAction::PlainText("ab".into())]
        );
    }
}
