//! User settings
//!
//! Reads X-resource style settings and makes them conveniently available.
//! There's a grand tradition amongst Unix terminal emulators of pretending
//! to be XTerm; we only borrow the configuration syntax:
//!
//! ```text
//! Terminator*loginShell: false
//! ! comments start with '!' or '#'
//! ```
//!
//! Every setting has a typed default, so `--help` can show the complete
//! set. Overrides come from `~/.terminator-settings` and from `-xrm`
//! arguments, and are persisted back to the same file.

use std::collections::HashMap;
use std::io::{self, Write};
use std::path::PathBuf;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("unknown setting \"{0}\"")]
    UnknownKey(String),

    #[error("malformed resource \"{0}\"")]
    Malformed(String),

    #[error("bad value \"{value}\" for setting \"{key}\"")]
    BadValue { key: String, value: String },

    #[error("couldn't read settings: {0}")]
    Io(#[from] io::Error),
}

/// An RGB color, written as `#rrggbb` in resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Parse "#rrggbb" (or bare "rrggbb").
    pub fn from_hex(hex: &str) -> Option<Rgb> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Rgb { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// A typed setting value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i32),
    Str(String),
    Color(Rgb),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Str(v) => write!(f, "{}", v),
            Value::Color(v) => write!(f, "{}", v.to_hex()),
        }
    }
}

/// The bright counterparts of color0..color7, used by the colorBD
/// heuristic.
const BRIGHT_COLORS: [Rgb; 8] = [
    Rgb::new(0x7f, 0x7f, 0x7f),
    Rgb::new(0xff, 0x00, 0x00),
    Rgb::new(0x00, 0xff, 0x00),
    Rgb::new(0xff, 0xff, 0x00),
    Rgb::new(0x5c, 0x5c, 0xff),
    Rgb::new(0xff, 0x00, 0xff),
    Rgb::new(0x00, 0xff, 0xff),
    Rgb::new(0xff, 0xff, 0xff),
];

fn default_table() -> Vec<(&'static str, Value, &'static str)> {
    vec![
        ("antiAlias", Value::Boolean(false), "Whether or not to anti-alias text"),
        ("blockCursor", Value::Boolean(false), "Whether to use a block cursor instead of an underline cursor"),
        ("cursorBlink", Value::Boolean(true), "Whether or not to blink the cursor"),
        ("fancyBell", Value::Boolean(true), "Whether to use the nicer-looking but more expensive bell rendition"),
        ("visualBell", Value::Boolean(true), "Whether the bell flashes instead of beeping"),
        ("fontName", Value::Str("monospace".to_string()), "The name of the terminal font"),
        ("fontSize", Value::Integer(12), "The size of the terminal font, in points"),
        ("initialColumnCount", Value::Integer(80), "How many columns a new window should have"),
        ("initialRowCount", Value::Integer(24), "How many rows a new window should have"),
        ("internalBorder", Value::Integer(2), "The number of pixels spacing the text from the window edge"),
        ("loginShell", Value::Boolean(true), "Whether shells we start should be login shells"),
        ("scrollKey", Value::Boolean(true), "Whether pressing a key should scroll to the bottom"),
        ("scrollTtyOutput", Value::Boolean(false), "Whether output should scroll to the bottom"),
        ("useMenuBar", Value::Boolean(false), "Whether to use a menu bar"),
        ("color0", Value::Color(Rgb::new(0x00, 0x00, 0x00)), "Black"),
        ("color1", Value::Color(Rgb::new(0xcd, 0x00, 0x00)), "Red"),
        ("color2", Value::Color(Rgb::new(0x00, 0xcd, 0x00)), "Green"),
        ("color3", Value::Color(Rgb::new(0xcd, 0xcd, 0x00)), "Yellow"),
        ("color4", Value::Color(Rgb::new(0x00, 0x00, 0xcd)), "Blue"),
        ("color5", Value::Color(Rgb::new(0xcd, 0x00, 0xcd)), "Magenta"),
        ("color6", Value::Color(Rgb::new(0x00, 0xcd, 0xcd)), "Cyan"),
        ("color7", Value::Color(Rgb::new(0xe5, 0xe5, 0xe5)), "White"),
        ("background", Value::Color(Rgb::new(0xff, 0xff, 0xff)), "The background color"),
        ("foreground", Value::Color(Rgb::new(0x00, 0x00, 0x00)), "The text color"),
        ("cursorColor", Value::Color(Rgb::new(0x00, 0xff, 0x00)), "The cursor color"),
        ("selectionColor", Value::Color(Rgb::new(0xc0, 0xc0, 0xff)), "The selection highlight color"),
    ]
}

/// colorBD has no fixed default; absent an override it is derived from the
/// foreground (see `color_bd`).
const COLOR_BD: &str = "colorBD";

#[derive(Clone)]
pub struct Settings {
    defaults: HashMap<String, Value>,
    descriptions: HashMap<String, &'static str>,
    overrides: HashMap<String, Value>,
    x11_colors: HashMap<String, Rgb>,
    resource_pattern: Regex,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new()
    }
}

impl Settings {
    pub fn new() -> Settings {
        let mut defaults = HashMap::new();
        let mut descriptions = HashMap::new();
        for (key, value, description) in default_table() {
            defaults.insert(key.to_string(), value);
            descriptions.insert(key.to_string(), description);
        }
        descriptions.insert(
            COLOR_BD.to_string(),
            "The bold text color; derived from the foreground unless set",
        );
        Settings {
            defaults,
            descriptions,
            overrides: HashMap::new(),
            x11_colors: load_x11_colors(),
            resource_pattern: Regex::new(r"^(?:Terminator(?:\*|\.))?(\S+):\s*(.+)$")
                .expect("the resource pattern is a valid regex"),
        }
    }

    /// `~/.terminator-settings`, if a home directory can be found.
    pub fn settings_path() -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(".terminator-settings"))
    }

    /// Where session logs go.
    pub fn log_directory(&self) -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".terminal-logs"))
            .unwrap_or_else(|| PathBuf::from(".terminal-logs"))
    }

    /// Load overrides from the settings file, if present. Unknown keys and
    /// bad values are reported and ignored.
    pub fn load_user_file(&mut self) -> io::Result<()> {
        let Some(path) = Self::settings_path() else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }
        let contents = std::fs::read_to_string(&path)?;
        for line in contents.lines() {
            if let Err(err) = self.parse_resource_line(line) {
                log::warn!("{}: {}", path.display(), err);
            }
        }
        Ok(())
    }

    /// Apply one `-xrm` resource string.
    pub fn apply_resource(&mut self, resource: &str) -> Result<(), SettingsError> {
        self.parse_resource_line(resource)
    }

    /// Parse a single settings line. Blank lines and comments are fine.
    pub fn parse_resource_line(&mut self, line: &str) -> Result<(), SettingsError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            return Ok(());
        }
        let captures = self
            .resource_pattern
            .captures(line)
            .ok_or_else(|| SettingsError::Malformed(line.to_string()))?;
        let key = captures[1].to_string();
        let value = captures[2].trim().to_string();
        self.set(&key, &value)
    }

    fn set(&mut self, key: &str, text: &str) -> Result<(), SettingsError> {
        let parsed = if key == COLOR_BD {
            self.parse_color(text).map(Value::Color)
        } else {
            match self.defaults.get(key) {
                None => return Err(SettingsError::UnknownKey(key.to_string())),
                Some(Value::Boolean(_)) => match text.to_ascii_lowercase().as_str() {
                    "true" => Some(Value::Boolean(true)),
                    "false" => Some(Value::Boolean(false)),
                    _ => None,
                },
                Some(Value::Integer(_)) => text.parse::<i32>().ok().map(Value::Integer),
                Some(Value::Str(_)) => Some(Value::Str(text.to_string())),
                Some(Value::Color(_)) => self.parse_color(text).map(Value::Color),
            }
        };
        match parsed {
            Some(value) => {
                self.overrides.insert(key.to_string(), value);
                Ok(())
            }
            None => Err(SettingsError::BadValue {
                key: key.to_string(),
                value: text.to_string(),
            }),
        }
    }

    /// `#rrggbb`, or a lowercase X11 rgb.txt name.
    fn parse_color(&self, text: &str) -> Option<Rgb> {
        if text.starts_with('#') {
            Rgb::from_hex(text)
        } else {
            self.x11_colors.get(&text.to_lowercase()).copied()
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.overrides.get(key).or_else(|| self.defaults.get(key))
    }

    fn boolean_resource(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Boolean(true)))
    }

    fn integer_resource(&self, key: &str) -> i32 {
        match self.get(key) {
            Some(Value::Integer(v)) => *v,
            _ => 0,
        }
    }

    fn string_resource(&self, key: &str) -> String {
        match self.get(key) {
            Some(Value::Str(v)) => v.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    fn color_resource(&self, key: &str) -> Rgb {
        match self.get(key) {
            Some(Value::Color(v)) => *v,
            _ => Rgb::new(0, 0, 0),
        }
    }

    // ----- typed accessors -----

    pub fn is_login_shell(&self) -> bool {
        self.boolean_resource("loginShell")
    }

    pub fn is_scroll_key(&self) -> bool {
        self.boolean_resource("scrollKey")
    }

    pub fn is_scroll_tty_output(&self) -> bool {
        self.boolean_resource("scrollTtyOutput")
    }

    pub fn is_anti_aliased(&self) -> bool {
        self.boolean_resource("antiAlias")
    }

    pub fn is_block_cursor(&self) -> bool {
        self.boolean_resource("blockCursor")
    }

    pub fn is_fancy_bell(&self) -> bool {
        self.boolean_resource("fancyBell")
    }

    pub fn is_visual_bell(&self) -> bool {
        self.boolean_resource("visualBell")
    }

    pub fn should_cursor_blink(&self) -> bool {
        self.boolean_resource("cursorBlink")
    }

    pub fn should_use_menu_bar(&self) -> bool {
        self.boolean_resource("useMenuBar")
    }

    pub fn internal_border(&self) -> i32 {
        self.integer_resource("internalBorder")
    }

    pub fn initial_row_count(&self) -> usize {
        self.integer_resource("initialRowCount").max(1) as usize
    }

    pub fn initial_column_count(&self) -> usize {
        self.integer_resource("initialColumnCount").max(1) as usize
    }

    pub fn font_name(&self) -> String {
        self.string_resource("fontName")
    }

    pub fn font_size(&self) -> i32 {
        self.integer_resource("fontSize")
    }

    /// One of the eight ANSI colors, by index.
    pub fn ansi_color(&self, index: usize) -> Rgb {
        self.color_resource(&format!("color{}", index.min(7)))
    }

    pub fn foreground(&self) -> Rgb {
        self.color_resource("foreground")
    }

    pub fn background(&self) -> Rgb {
        self.color_resource("background")
    }

    pub fn cursor_color(&self) -> Rgb {
        self.color_resource("cursorColor")
    }

    pub fn selection_color(&self) -> Rgb {
        self.color_resource("selectionColor")
    }

    /// The bold text color. Explicit override wins; otherwise, if the
    /// foreground matches one of color0..color7, the corresponding bright
    /// color; otherwise the foreground itself.
    pub fn color_bd(&self) -> Rgb {
        if let Some(Value::Color(color)) = self.overrides.get(COLOR_BD) {
            return *color;
        }
        let foreground = self.foreground();
        for index in 0..8 {
            if self.ansi_color(index) == foreground {
                return BRIGHT_COLORS[index];
            }
        }
        foreground
    }

    /// Write the resource set, optionally skipping values still at their
    /// defaults. This is what `--help` and the settings file share.
    pub fn show_options(&self, out: &mut dyn Write, show_even_if_default: bool) -> io::Result<()> {
        let mut keys: Vec<&String> = self.defaults.keys().collect();
        keys.sort();
        for key in keys {
            let value = self.get(key).expect("defaults cover every key");
            if !show_even_if_default && !self.overrides.contains_key(key) {
                continue;
            }
            if let Some(description) = self.descriptions.get(key) {
                writeln!(out, "\n# {}", description)?;
            }
            writeln!(out, "Terminator*{}: {}", key, value)?;
        }
        if show_even_if_default || self.overrides.contains_key(COLOR_BD) {
            if let Some(description) = self.descriptions.get(COLOR_BD) {
                writeln!(out, "\n# {}", description)?;
            }
            writeln!(out, "Terminator*{}: {}", COLOR_BD, self.color_bd().to_hex())?;
        }
        Ok(())
    }

    /// Persist the overridden settings to `~/.terminator-settings`.
    pub fn save(&self) -> io::Result<()> {
        let Some(path) = Self::settings_path() else {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "no home directory for settings",
            ));
        };
        let mut contents = Vec::new();
        self.show_options(&mut contents, false)?;
        std::fs::write(path, contents)
    }
}

/// The color names we accept. The system rgb.txt is used when one can be
/// found, topped up with a built-in table of the common names.
fn load_x11_colors() -> HashMap<String, Rgb> {
    let mut colors: HashMap<String, Rgb> = builtin_x11_colors()
        .into_iter()
        .map(|(name, rgb)| (name.to_string(), rgb))
        .collect();
    for path in [
        "/usr/share/X11/rgb.txt",
        "/etc/X11/rgb.txt",
        "/usr/X11R6/lib/X11/rgb.txt",
    ] {
        if let Ok(contents) = std::fs::read_to_string(path) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('!') {
                    continue;
                }
                let mut fields = line.split_whitespace();
                let (Some(r), Some(g), Some(b)) = (fields.next(), fields.next(), fields.next())
                else {
                    continue;
                };
                let (Ok(r), Ok(g), Ok(b)) = (r.parse(), g.parse(), b.parse()) else {
                    continue;
                };
                let name = fields.collect::<Vec<_>>().join(" ").to_lowercase();
                if !name.is_empty() {
                    colors.insert(name, Rgb::new(r, g, b));
                }
            }
            break;
        }
    }
    colors
}

fn builtin_x11_colors() -> Vec<(&'static str, Rgb)> {
    vec![
        ("black", Rgb::new(0x00, 0x00, 0x00)),
        ("white", Rgb::new(0xff, 0xff, 0xff)),
        ("red", Rgb::new(0xff, 0x00, 0x00)),
        ("green", Rgb::new(0x00, 0xff, 0x00)),
        ("blue", Rgb::new(0x00, 0x00, 0xff)),
        ("yellow", Rgb::new(0xff, 0xff, 0x00)),
        ("magenta", Rgb::new(0xff, 0x00, 0xff)),
        ("cyan", Rgb::new(0x00, 0xff, 0xff)),
        ("gray", Rgb::new(0xbe, 0xbe, 0xbe)),
        ("grey", Rgb::new(0xbe, 0xbe, 0xbe)),
        ("orange", Rgb::new(0xff, 0xa5, 0x00)),
        ("purple", Rgb::new(0xa0, 0x20, 0xf0)),
        ("brown", Rgb::new(0xa5, 0x2a, 0x2a)),
        ("pink", Rgb::new(0xff, 0xc0, 0xcb)),
        ("navy", Rgb::new(0x00, 0x00, 0x80)),
        ("ivory", Rgb::new(0xff, 0xff, 0xf0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::new();
        assert!(settings.is_login_shell());
        assert!(!settings.is_scroll_tty_output());
        assert_eq!(settings.initial_column_count(), 80);
        assert_eq!(settings.initial_row_count(), 24);
        assert_eq!(settings.internal_border(), 2);
    }

    #[test]
    fn test_resource_line_forms() {
        let mut settings = Settings::new();
        settings.parse_resource_line("Terminator*loginShell: false").unwrap();
        assert!(!settings.is_login_shell());
        settings.parse_resource_line("Terminator.fontSize: 14").unwrap();
        assert_eq!(settings.font_size(), 14);
        settings.parse_resource_line("initialRowCount: 50").unwrap();
        assert_eq!(settings.initial_row_count(), 50);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let mut settings = Settings::new();
        settings.parse_resource_line("# a comment").unwrap();
        settings.parse_resource_line("! another comment").unwrap();
        settings.parse_resource_line("   ").unwrap();
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let mut settings = Settings::new();
        let err = settings.parse_resource_line("Terminator*noSuchThing: 1");
        assert!(matches!(err, Err(SettingsError::UnknownKey(_))));
    }

    #[test]
    fn test_bad_value_is_an_error() {
        let mut settings = Settings::new();
        assert!(matches!(
            settings.parse_resource_line("Terminator*fontSize: huge"),
            Err(SettingsError::BadValue { .. })
        ));
        assert!(matches!(
            settings.parse_resource_line("Terminator*loginShell: maybe"),
            Err(SettingsError::BadValue { .. })
        ));
    }

    #[test]
    fn test_hex_and_named_colors() {
        let mut settings = Settings::new();
        settings.parse_resource_line("Terminator*background: #123456").unwrap();
        assert_eq!(settings.background(), Rgb::new(0x12, 0x34, 0x56));
        settings.parse_resource_line("Terminator*cursorColor: navy").unwrap();
        assert_eq!(settings.cursor_color(), Rgb::new(0x00, 0x00, 0x80));
    }

    #[test]
    fn test_color_bd_heuristic() {
        let mut settings = Settings::new();
        // Default foreground is black = color0, so bold is bright black.
        assert_eq!(settings.color_bd(), BRIGHT_COLORS[0]);

        // Foreground matching color1 selects the bright red.
        settings.parse_resource_line("Terminator*foreground: #cd0000").unwrap();
        assert_eq!(settings.color_bd(), BRIGHT_COLORS[1]);

        // A foreground matching nothing falls back to itself.
        settings.parse_resource_line("Terminator*foreground: #102030").unwrap();
        assert_eq!(settings.color_bd(), Rgb::new(0x10, 0x20, 0x30));

        // An explicit override always wins.
        settings.parse_resource_line("Terminator*colorBD: #aabbcc").unwrap();
        assert_eq!(settings.color_bd(), Rgb::new(0xaa, 0xbb, 0xcc));
    }

    #[test]
    fn test_show_options_round_trips() {
        let mut settings = Settings::new();
        settings.parse_resource_line("Terminator*fontSize: 14").unwrap();
        settings.parse_resource_line("Terminator*background: #010203").unwrap();

        let mut shown = Vec::new();
        settings.show_options(&mut shown, false).unwrap();
        let shown = String::from_utf8(shown).unwrap();
        assert!(shown.contains("Terminator*fontSize: 14"));
        assert!(shown.contains("Terminator*background: #010203"));
        assert!(!shown.contains("loginShell"));

        // Feeding the output back in reproduces the overrides.
        let mut reloaded = Settings::new();
        for line in shown.lines() {
            reloaded.parse_resource_line(line).unwrap();
        }
        assert_eq!(reloaded.font_size(), 14);
        assert_eq!(reloaded.background(), Rgb::new(0x01, 0x02, 0x03));
    }

    #[test]
    fn test_show_all_lists_every_key() {
        let settings = Settings::new();
        let mut shown = Vec::new();
        settings.show_options(&mut shown, true).unwrap();
        let shown = String::from_utf8(shown).unwrap();
        for key in ["loginShell", "initialColumnCount", "color7", "colorBD"] {
            assert!(shown.contains(key), "missing {}", key);
        }
    }
}
