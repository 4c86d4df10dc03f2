//! Keybinding configuration: parse `keybinds.conf`, provide defaults, and map keys to actions.
//!
//! Only the list screen goes through the keymap. Search input and the form
//! modal read raw key codes because they are text entry.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::path::Path;

use crate::model::UserField;

/// Semantic actions on the user list that can be bound to keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAction {
    Quit,
    OpenHelp,
    StartSearch,
    /// Open the form in create mode.
    NewUser,
    /// Open the form in edit mode for the selected row.
    EditSelection,
    /// Delete the selected row immediately (no confirmation).
    DeleteSelection,
    /// Show every field of the selected row, including its id.
    ShowDetails,
    /// Force a snapshot refresh.
    Refresh,
    SortFirstName,
    SortLastName,
    SortEmail,
    SortAddress,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Ignore,
}

impl KeyAction {
    pub const ALL: [KeyAction; 17] = [
        KeyAction::Quit,
        KeyAction::OpenHelp,
        KeyAction::StartSearch,
        KeyAction::NewUser,
        KeyAction::EditSelection,
        KeyAction::DeleteSelection,
        KeyAction::ShowDetails,
        KeyAction::Refresh,
        KeyAction::SortFirstName,
        KeyAction::SortLastName,
        KeyAction::SortEmail,
        KeyAction::SortAddress,
        KeyAction::MoveUp,
        KeyAction::MoveDown,
        KeyAction::PageUp,
        KeyAction::PageDown,
        KeyAction::Ignore,
    ];

    /// The column a sort action toggles, if any.
    pub fn sort_field(self) -> Option<UserField> {
        match self {
            KeyAction::SortFirstName => Some(UserField::FirstName),
            KeyAction::SortLastName => Some(UserField::LastName),
            KeyAction::SortEmail => Some(UserField::Email),
            KeyAction::SortAddress => Some(UserField::Address),
            _ => None,
        }
    }

    /// Short description used by the help modal.
    pub fn describe(self) -> &'static str {
        match self {
            KeyAction::Quit => "Quit",
            KeyAction::OpenHelp => "Help",
            KeyAction::StartSearch => "Search",
            KeyAction::NewUser => "Add user",
            KeyAction::EditSelection => "Edit user",
            KeyAction::DeleteSelection => "Delete user",
            KeyAction::ShowDetails => "Details",
            KeyAction::Refresh => "Refresh",
            KeyAction::SortFirstName => "Sort by first name",
            KeyAction::SortLastName => "Sort by last name",
            KeyAction::SortEmail => "Sort by email",
            KeyAction::SortAddress => "Sort by address",
            KeyAction::MoveUp => "Move up",
            KeyAction::MoveDown => "Move down",
            KeyAction::PageUp => "Page up",
            KeyAction::PageDown => "Page down",
            KeyAction::Ignore => "Ignore",
        }
    }
}

/// Mapping from `(modifiers, code)` to [`KeyAction`].
#[derive(Clone, Debug)]
pub struct Keymap {
    bindings: HashMap<(KeyModifiers, KeyCode), KeyAction>,
}

impl Keymap {
    pub fn new_defaults() -> Self {
        use KeyCode::*;
        use KeyModifiers as M;
        let mut bindings = HashMap::new();
        bindings.insert((M::NONE, Char('q')), KeyAction::Quit);
        bindings.insert((M::NONE, Esc), KeyAction::Ignore);
        bindings.insert((M::NONE, Char('?')), KeyAction::OpenHelp);
        bindings.insert((M::NONE, Char('/')), KeyAction::StartSearch);
        bindings.insert((M::NONE, Char('a')), KeyAction::NewUser);
        bindings.insert((M::NONE, Char('n')), KeyAction::NewUser);
        bindings.insert((M::NONE, Char('e')), KeyAction::EditSelection);
        bindings.insert((M::NONE, Enter), KeyAction::EditSelection);
        bindings.insert((M::NONE, Char('d')), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Delete), KeyAction::DeleteSelection);
        bindings.insert((M::NONE, Char('i')), KeyAction::ShowDetails);
        bindings.insert((M::NONE, Char('r')), KeyAction::Refresh);
        bindings.insert((M::NONE, Char('1')), KeyAction::SortFirstName);
        bindings.insert((M::NONE, Char('2')), KeyAction::SortLastName);
        bindings.insert((M::NONE, Char('3')), KeyAction::SortEmail);
        bindings.insert((M::NONE, Char('4')), KeyAction::SortAddress);
        // Navigation
        bindings.insert((M::NONE, Up), KeyAction::MoveUp);
        bindings.insert((M::NONE, Down), KeyAction::MoveDown);
        bindings.insert((M::NONE, Char('k')), KeyAction::MoveUp);
        bindings.insert((M::NONE, Char('j')), KeyAction::MoveDown);
        bindings.insert((M::NONE, Left), KeyAction::PageUp);
        bindings.insert((M::NONE, Right), KeyAction::PageDown);
        bindings.insert((M::NONE, Char('h')), KeyAction::PageUp);
        bindings.insert((M::NONE, Char('l')), KeyAction::PageDown);
        bindings.insert((M::NONE, PageUp), KeyAction::PageUp);
        bindings.insert((M::NONE, PageDown), KeyAction::PageDown);
        Self { bindings }
    }

    /// Load `path`, or write the defaults there if it does not exist yet.
    pub fn load_or_init(path: &Path) -> Self {
        if path.exists() {
            return Self::from_file(path).unwrap_or_default();
        }
        let km = Self::default();
        if let Err(err) = km.write_file(path) {
            tracing::warn!(path = %path.display(), error = %err, "could not write default keybindings");
        }
        km
    }

    pub fn from_file(path: &Path) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    /// Start from defaults and apply `<Action> = <KeySpec>` overrides.
    /// Lines that do not parse are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut map = Self::default();
        for (lhs, rhs) in super::config_pairs(contents) {
            match (parse_action(lhs), parse_key(rhs)) {
                (Some(action), Some(key)) => {
                    map.bindings.insert(key, action);
                }
                _ => tracing::debug!(line = %format!("{lhs} = {rhs}"), "ignoring keybinding"),
            }
        }
        map
    }

    pub fn write_file(&self, path: &Path) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# userbook keybindings\n");
        buf.push_str("# Format: <Action> = <KeySpec>\n");
        buf.push_str("# KeySpec examples: q, Ctrl+q, Enter, Esc, Up, Down, Left, Right, PageUp, PageDown, Delete, /, 1\n");
        buf.push_str("# Actions: ");
        let names: Vec<&str> = KeyAction::ALL.iter().map(|a| format_action(*a)).collect();
        buf.push_str(&names.join(", "));
        buf.push_str("\n\n");

        let mut entries: Vec<(String, KeyAction)> = self
            .all_bindings()
            .into_iter()
            .map(|((mods, code), action)| (Self::format_key(mods, code), action))
            .collect();
        entries.sort_by(|a, b| format_action(a.1).cmp(format_action(b.1)).then_with(|| a.0.cmp(&b.0)));
        for (key, action) in entries {
            let _ = writeln!(&mut buf, "{} = {}", format_action(action), key);
        }
        std::fs::write(path, buf)
    }

    pub fn resolve(&self, key: &KeyEvent) -> Option<KeyAction> {
        self.bindings.get(&(key.modifiers, key.code)).copied()
    }

    pub fn all_bindings(&self) -> Vec<((KeyModifiers, KeyCode), KeyAction)> {
        self.bindings.iter().map(|(k, v)| (*k, *v)).collect()
    }

    /// Keys bound to `action`, formatted and sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|((mods, code), _)| Self::format_key(*mods, *code))
            .collect();
        keys.sort();
        keys
    }

    /// Format a key like "Ctrl+q", "Enter" or "/".
    pub fn format_key(mods: KeyModifiers, code: KeyCode) -> String {
        use KeyCode::*;
        let base = match code {
            Enter => "Enter".to_string(),
            Delete => "Delete".to_string(),
            Esc => "Esc".to_string(),
            Tab => "Tab".to_string(),
            BackTab => "BackTab".to_string(),
            Up => "Up".to_string(),
            Down => "Down".to_string(),
            Left => "Left".to_string(),
            Right => "Right".to_string(),
            PageUp => "PageUp".to_string(),
            PageDown => "PageDown".to_string(),
            Home => "Home".to_string(),
            End => "End".to_string(),
            Char(c) => c.to_string(),
            _ => format!("{:?}", code),
        };
        if mods.contains(KeyModifiers::CONTROL) {
            format!("Ctrl+{}", base)
        } else {
            base
        }
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new_defaults()
    }
}

fn parse_key(spec: &str) -> Option<(KeyModifiers, KeyCode)> {
    use KeyCode::*;
    let s = spec.trim();
    let (mods, rest) = match s.strip_prefix("Ctrl+") {
        Some(after) => (KeyModifiers::CONTROL, after),
        None => (KeyModifiers::NONE, s),
    };
    let code = match rest {
        "Enter" => Enter,
        "Delete" => Delete,
        "Esc" | "Escape" => Esc,
        "Tab" => Tab,
        "BackTab" => BackTab,
        "Up" => Up,
        "Down" => Down,
        "Left" => Left,
        "Right" => Right,
        "PageUp" => PageUp,
        "PageDown" => PageDown,
        "Home" => Home,
        "End" => End,
        _ => {
            let mut chars = rest.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Char(c),
                _ => return None,
            }
        }
    };
    Some((mods, code))
}

fn parse_action(s: &str) -> Option<KeyAction> {
    let s = s.trim();
    KeyAction::ALL.into_iter().find(|a| format_action(*a) == s)
}

pub fn format_action(a: KeyAction) -> &'static str {
    match a {
        KeyAction::Quit => "Quit",
        KeyAction::OpenHelp => "OpenHelp",
        KeyAction::StartSearch => "StartSearch",
        KeyAction::NewUser => "NewUser",
        KeyAction::EditSelection => "EditSelection",
        KeyAction::DeleteSelection => "DeleteSelection",
        KeyAction::ShowDetails => "ShowDetails",
        KeyAction::Refresh => "Refresh",
        KeyAction::SortFirstName => "SortFirstName",
        KeyAction::SortLastName => "SortLastName",
        KeyAction::SortEmail => "SortEmail",
        KeyAction::SortAddress => "SortAddress",
        KeyAction::MoveUp => "MoveUp",
        KeyAction::MoveDown => "MoveDown",
        KeyAction::PageUp => "PageUp",
        KeyAction::PageDown => "PageDown",
        KeyAction::Ignore => "Ignore",
    }
}
