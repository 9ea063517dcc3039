//! Packed text styles
//!
//! A style is a 16-bit word carrying the foreground and background color
//! indices plus the rendering attributes for one character cell. Keeping
//! the whole thing in a `u16` lets a line store one style per character
//! without the parallel array dominating memory.

use bitflags::bitflags;

bitflags! {
    /// Attribute and presence bits of a style word
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u16 {
        /// A foreground color index is present
        const HAS_FOREGROUND = 1 << 6;
        /// A background color index is present
        const HAS_BACKGROUND = 1 << 7;
        /// Bold/bright text
        const BOLD = 1 << 8;
        /// Underlined text
        const UNDERLINE = 1 << 9;
        /// Reverse video (swap fg/bg)
        const REVERSE = 1 << 10;
    }
}

const FOREGROUND_MASK: u16 = 0b0000_0111;
const BACKGROUND_MASK: u16 = 0b0011_1000;
const BACKGROUND_SHIFT: u16 = 3;

/// A 16-bit style word: fg index in bits 0-2, bg index in bits 3-5,
/// flag bits per [`StyleFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style(u16);

impl Style {
    /// The well-known default style: no explicit colors, no attributes.
    pub const DEFAULT: Style = Style(0);

    pub fn bits(self) -> u16 {
        self.0
    }

    pub fn from_bits(bits: u16) -> Style {
        Style(bits)
    }

    fn flags(self) -> StyleFlags {
        StyleFlags::from_bits_truncate(self.0)
    }

    fn set_flag(&mut self, flag: StyleFlags, on: bool) {
        if on {
            self.0 |= flag.bits();
        } else {
            self.0 &= !flag.bits();
        }
    }

    /// Foreground color index (0-7), if one has been set.
    pub fn foreground(self) -> Option<u8> {
        if self.flags().contains(StyleFlags::HAS_FOREGROUND) {
            Some((self.0 & FOREGROUND_MASK) as u8)
        } else {
            None
        }
    }

    /// Background color index (0-7), if one has been set.
    pub fn background(self) -> Option<u8> {
        if self.flags().contains(StyleFlags::HAS_BACKGROUND) {
            Some(((self.0 & BACKGROUND_MASK) >> BACKGROUND_SHIFT) as u8)
        } else {
            None
        }
    }

    pub fn set_foreground(&mut self, index: Option<u8>) {
        self.0 &= !FOREGROUND_MASK;
        match index {
            Some(i) => {
                self.0 |= u16::from(i & 0b111);
                self.set_flag(StyleFlags::HAS_FOREGROUND, true);
            }
            None => self.set_flag(StyleFlags::HAS_FOREGROUND, false),
        }
    }

    pub fn set_background(&mut self, index: Option<u8>) {
        self.0 &= !BACKGROUND_MASK;
        match index {
            Some(i) => {
                self.0 |= u16::from(i & 0b111) << BACKGROUND_SHIFT;
                self.set_flag(StyleFlags::HAS_BACKGROUND, true);
            }
            None => self.set_flag(StyleFlags::HAS_BACKGROUND, false),
        }
    }

    pub fn is_bold(self) -> bool {
        self.flags().contains(StyleFlags::BOLD)
    }

    pub fn set_bold(&mut self, on: bool) {
        self.set_flag(StyleFlags::BOLD, on);
    }

    pub fn is_underlined(self) -> bool {
        self.flags().contains(StyleFlags::UNDERLINE)
    }

    pub fn set_underlined(&mut self, on: bool) {
        self.set_flag(StyleFlags::UNDERLINE, on);
    }

    pub fn is_reverse_video(self) -> bool {
        self.flags().contains(StyleFlags::REVERSE)
    }

    pub fn set_reverse_video(&mut self, on: bool) {
        self.set_flag(StyleFlags::REVERSE, on);
    }

    /// Reset to the default style.
    pub fn reset(&mut self) {
        *self = Style::DEFAULT;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = Style::DEFAULT;
        assert_eq!(style.foreground(), None);
        assert_eq!(style.background(), None);
        assert!(!style.is_bold());
        assert!(!style.is_underlined());
        assert!(!style.is_reverse_video());
    }

    #[test]
    fn test_colors_round_trip() {
        let mut style = Style::DEFAULT;
        style.set_foreground(Some(1));
        style.set_background(Some(4));
        assert_eq!(style.foreground(), Some(1));
        assert_eq!(style.background(), Some(4));

        style.set_foreground(None);
        assert_eq!(style.foreground(), None);
        assert_eq!(style.background(), Some(4));
    }

    #[test]
    fn test_attributes_independent_of_colors() {
        let mut style = Style::DEFAULT;
        style.set_foreground(Some(7));
        style.set_bold(true);
        style.set_underlined(true);
        assert_eq!(style.foreground(), Some(7));
        assert!(style.is_bold());

        style.set_bold(false);
        assert!(!style.is_bold());
        assert!(style.is_underlined());
        assert_eq!(style.foreground(), Some(7));
    }

    #[test]
    fn test_reset() {
        let mut style = Style::DEFAULT;
        style.set_foreground(Some(2));
        style.set_reverse_video(true);
        style.reset();
        assert_eq!(style, Style::DEFAULT);
    }
}
