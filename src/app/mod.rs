//! Application state types and entry glue.
//!
//! Defines the state the TUI renders from: the snapshot received from the
//! backend, the derived view, the serializable [`ViewState`] (search, sort and
//! form draft) and the colour theme. The event loop is re-exported as `run`.
//!
pub mod form;
pub mod keymap;
pub mod update;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::backend::RequestId;
use crate::model::User;
use crate::search::SortKey;
use form::FormDraft;
use keymap::Keymap;

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Form,
    Modal,
}

/// Colour palette for theming the TUI.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
}

impl Theme {
    /// Plain dark theme using named terminal colours.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error: Color::Red,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
        }
    }

    /// Named base palette: `dark` or `mocha`.
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::dark()),
            "mocha" => Some(Self::mocha()),
            _ => None,
        }
    }

    /// Load a theme from `key = value` lines.
    ///
    /// An optional `preset = dark|mocha` picks the base palette (default `mocha`);
    /// colour keys then override it. Unknown keys and bad colours keep the base value.
    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut theme = config_pairs(contents)
            .filter(|(k, _)| *k == "preset")
            .filter_map(|(_, v)| Self::preset(v))
            .last()
            .unwrap_or_else(Self::mocha);
        for (key, val) in config_pairs(contents) {
            let Some(color) = parse_color(val) else { continue };
            match key {
                "text" => theme.text = color,
                "muted" => theme.muted = color,
                "title" => theme.title = color,
                "border" => theme.border = color,
                "header_bg" => theme.header_bg = color,
                "header_fg" => theme.header_fg = color,
                "status_bg" => theme.status_bg = color,
                "status_fg" => theme.status_fg = color,
                "highlight_fg" => theme.highlight_fg = color,
                "highlight_bg" => theme.highlight_bg = color,
                "error" => theme.error = color,
                _ => {}
            }
        }
        theme
    }

    pub fn to_config(&self) -> String {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userbook theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n");
        buf.push_str("# Optional base palette: preset = dark | mocha\n\n");
        let entries = [
            ("text", self.text),
            ("muted", self.muted),
            ("title", self.title),
            ("border", self.border),
            ("header_bg", self.header_bg),
            ("header_fg", self.header_fg),
            ("status_bg", self.status_bg),
            ("status_fg", self.status_fg),
            ("highlight_fg", self.highlight_fg),
            ("highlight_bg", self.highlight_bg),
            ("error", self.error),
        ];
        for (k, v) in entries {
            let _ = writeln!(&mut buf, "{} = {}", k, color_to_str(v));
        }
        buf
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_config())
    }

    /// Load `path`, or write the `mocha` defaults there if it does not exist yet.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(err) = t.write_file(path) {
            tracing::warn!(path = %path.display(), error = %err, "could not write default theme");
        }
        t
    }
}

/// Parse "#RRGGBB", "RRGGBB" or "reset".
fn parse_color(s: &str) -> Option<Color> {
    let lower = s.trim().to_ascii_lowercase();
    if lower == "reset" {
        return Some(Color::Reset);
    }
    let hex = lower.strip_prefix('#').unwrap_or(&lower);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

fn color_to_str(c: Color) -> String {
    match c {
        Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
        Color::Reset => "reset".to_string(),
        // Named colours are written as a best-effort hex approximation
        Color::Black => "#000000".to_string(),
        Color::Red => "#FF0000".to_string(),
        Color::Green => "#00FF00".to_string(),
        Color::Yellow => "#FFFF00".to_string(),
        Color::Blue => "#0000FF".to_string(),
        Color::Magenta => "#FF00FF".to_string(),
        Color::Cyan => "#00FFFF".to_string(),
        Color::Gray => "#B3B3B3".to_string(),
        Color::DarkGray => "#4D4D4D".to_string(),
        Color::LightRed => "#FF6666".to_string(),
        Color::LightGreen => "#66FF66".to_string(),
        Color::LightYellow => "#FFFF66".to_string(),
        Color::LightBlue => "#6666FF".to_string(),
        Color::LightMagenta => "#FF66FF".to_string(),
        Color::LightCyan => "#66FFFF".to_string(),
        Color::White => "#FFFFFF".to_string(),
        Color::Indexed(_) => "reset".to_string(),
    }
}

/// Non-empty, non-comment `key = value` pairs of a config file, both sides trimmed.
pub(crate) fn config_pairs(contents: &str) -> impl Iterator<Item = (&str, &str)> {
    contents.lines().filter_map(|raw| {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (lhs, rhs) = line.split_once('=')?;
        let (lhs, rhs) = (lhs.trim(), rhs.trim());
        if lhs.is_empty() || rhs.is_empty() { None } else { Some((lhs, rhs)) }
    })
}

/// Default directory for `theme.conf`, `keybinds.conf` and the log file.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("userbook")
}

/// Search, sort and form state: everything the user has typed or toggled.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub search_query: String,
    pub sort: Option<SortKey>,
    /// `Some` while the create/edit modal is open.
    pub form: Option<FormDraft>,
}

/// Non-form modal dialogs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModalState {
    Info { message: String },
    Help { scroll: u16 },
}

/// Freshness of the snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncStatus {
    Loading,
    Fresh { at: Instant },
    /// Last fetch failed; the snapshot (possibly empty) is from an earlier success.
    Stale { error: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

pub struct AppState {
    /// Where the snapshot comes from, shown in the header.
    pub source: String,
    pub snapshot: Vec<User>,
    /// Derived view: filtered and sorted copy of `snapshot`.
    pub users: Vec<User>,
    pub view: ViewState,
    pub selected_index: usize,
    pub rows_per_page: usize,
    pub input_mode: InputMode,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub sync: SyncStatus,
    pub status: Option<StatusMessage>,
    pub should_quit: bool,
    next_request: u64,
}

impl AppState {
    pub fn new(source: impl Into<String>, theme: Theme, keymap: Keymap) -> Self {
        Self {
            source: source.into(),
            snapshot: Vec::new(),
            users: Vec::new(),
            view: ViewState::default(),
            selected_index: 0,
            rows_per_page: 10,
            input_mode: InputMode::Normal,
            theme,
            keymap,
            modal: None,
            sync: SyncStatus::Loading,
            status: None,
            should_quit: false,
            next_request: 0,
        }
    }

    /// Load theme and keybindings from `config_dir`, creating defaults as needed.
    pub fn from_config_dir(source: impl Into<String>, config_dir: &Path) -> Self {
        let theme = Theme::load_or_init(&config_dir.join("theme.conf"));
        let keymap = Keymap::load_or_init(&config_dir.join("keybinds.conf"));
        Self::new(source, theme, keymap)
    }

    /// Fresh id for the next write sent to the backend.
    pub fn next_request_id(&mut self) -> RequestId {
        self.next_request += 1;
        RequestId(self.next_request)
    }

    pub fn selected_user(&self) -> Option<&User> {
        self.users.get(self.selected_index)
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
