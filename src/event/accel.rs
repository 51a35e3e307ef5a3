//! Accelerator map: named action paths bound to key combinations.
//!
//! Paths look like `<Editor>/File/Save`. The map persists as line-oriented
//! text, one `path = <Modifiers>Key` entry per line:
//!
//! ```text
//! ; comment
//! <Editor>/File/Save = <Control>s
//! <Editor>/File/Quit = <Control><Shift>q
//! ```
//!
//! Lookups take a shared lock; writers check under the shared lock first and
//! only take the exclusive lock when they actually have to change something.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use parking_lot::RwLock;
use regex::Regex;

use super::input::{Key, KeyEvent, Modifiers};
use crate::logging::targets;

static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(<[A-Za-z0-9_-]+>/[^=\s]+)\s*=\s*((?:<[A-Za-z0-9_]+>)*)([^\s<>]*)\s*$")
        .expect("accelerator line pattern is valid")
});

static ACCEL_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<[A-Za-z0-9_-]+>/[^=\s]+$").expect("accelerator path pattern is valid")
});

/// Errors from accelerator parsing and persistence.
#[derive(Debug, thiserror::Error)]
pub enum AccelError {
    #[error("no accelerator at path '{0}'")]
    NotFound(String),
    #[error("invalid accelerator '{0}'")]
    InvalidAccelerator(String),
    #[error("invalid accelerator path '{0}'")]
    InvalidPath(String),
    #[error("accelerator map I/O failed")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Accelerator
// ---------------------------------------------------------------------------

/// A key plus modifier mask, written `<Control><Alt>x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Accelerator {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl Accelerator {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// Whether `event` triggers this accelerator. Letters compare
    /// case-insensitively and Shift is ignored for printable characters.
    pub fn matches(&self, event: &KeyEvent) -> bool {
        let same_key = match (self.key, event.code) {
            (Key::Char(a), Key::Char(b)) => a.eq_ignore_ascii_case(&b),
            (a, b) => a == b,
        };
        same_key && strip_char_shift(self.key, self.modifiers) == event.significant_modifiers()
    }
}

fn strip_char_shift(key: Key, modifiers: Modifiers) -> Modifiers {
    match key {
        Key::Char(_) => modifiers - Modifiers::SHIFT,
        _ => modifiers,
    }
}

fn parse_modifier(name: &str) -> Option<Modifiers> {
    match name.to_ascii_lowercase().as_str() {
        "control" | "ctrl" | "ctl" | "primary" => Some(Modifiers::CTRL),
        "shift" | "shft" => Some(Modifiers::SHIFT),
        "alt" | "mod1" | "meta" => Some(Modifiers::ALT),
        _ => None,
    }
}

fn parse_modifier_list(text: &str) -> Option<Modifiers> {
    let mut modifiers = Modifiers::NONE;
    let mut rest = text;
    while let Some(after) = rest.strip_prefix('<') {
        let end = after.find('>')?;
        modifiers |= parse_modifier(&after[..end])?;
        rest = &after[end + 1..];
    }
    rest.is_empty().then_some(modifiers)
}

impl FromStr for Accelerator {
    type Err = AccelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AccelError::InvalidAccelerator(s.to_owned());
        let s = s.trim();
        let split = s.rfind('>').map_or(0, |i| i + 1);
        let (mods, key) = s.split_at(split);
        let modifiers = parse_modifier_list(mods).ok_or_else(invalid)?;
        let key = Key::from_name(key).ok_or_else(invalid)?;
        Ok(Accelerator::new(key, modifiers))
    }
}

impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(Modifiers::CTRL) {
            f.write_str("<Control>")?;
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            f.write_str("<Shift>")?;
        }
        if self.modifiers.contains(Modifiers::ALT) {
            f.write_str("<Alt>")?;
        }
        write!(f, "{}", self.key)
    }
}

// ---------------------------------------------------------------------------
// AccelMap
// ---------------------------------------------------------------------------

/// Process-wide path to accelerator table, shared through the `Context`.
#[derive(Debug, Default)]
pub struct AccelMap {
    entries: RwLock<HashMap<String, Accelerator>>,
}

impl AccelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `path` has the `<Type>/...` shape.
    pub fn is_valid_path(path: &str) -> bool {
        ACCEL_PATH.is_match(path)
    }

    /// Bind `path` unless it is already bound. Returns whether the entry
    /// was added.
    pub fn add_entry(&self, path: &str, accel: Accelerator) -> Result<bool, AccelError> {
        if !Self::is_valid_path(path) {
            return Err(AccelError::InvalidPath(path.to_owned()));
        }
        if self.entries.read().contains_key(path) {
            return Ok(false);
        }
        let mut entries = self.entries.write();
        if entries.contains_key(path) {
            return Ok(false);
        }
        entries.insert(path.to_owned(), accel);
        tracing::debug!(target: targets::ACCEL, path, %accel, "added accelerator");
        Ok(true)
    }

    /// Bind `path`, replacing any existing binding. Returns the old one.
    pub fn change_entry(&self, path: &str, accel: Accelerator) -> Result<Option<Accelerator>, AccelError> {
        if !Self::is_valid_path(path) {
            return Err(AccelError::InvalidPath(path.to_owned()));
        }
        if self.entries.read().get(path) == Some(&accel) {
            return Ok(Some(accel));
        }
        let old = self.entries.write().insert(path.to_owned(), accel);
        tracing::debug!(target: targets::ACCEL, path, %accel, "changed accelerator");
        Ok(old)
    }

    pub fn lookup_entry(&self, path: &str) -> Option<Accelerator> {
        self.entries.read().get(path).copied()
    }

    /// The path bound to the key in `event`. When several paths match, the
    /// lexicographically first wins.
    pub fn lookup_path(&self, event: &KeyEvent) -> Option<String> {
        self.entries
            .read()
            .iter()
            .filter(|(_, accel)| accel.matches(event))
            .map(|(path, _)| path)
            .min()
            .cloned()
    }

    pub fn remove_entry(&self, path: &str) -> Result<Accelerator, AccelError> {
        self.entries
            .write()
            .remove(path)
            .ok_or_else(|| AccelError::NotFound(path.to_owned()))
    }

    /// A sorted copy of every binding.
    pub fn entries(&self) -> BTreeMap<String, Accelerator> {
        self.entries
            .read()
            .iter()
            .map(|(p, a)| (p.clone(), *a))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Merge entries from text, overriding existing bindings. Blank lines
    /// and lines starting with `;` or `#` are ignored; malformed lines are
    /// skipped with a warning. Returns the number of entries applied.
    pub fn load_from_string(&self, text: &str) -> usize {
        let mut applied = 0;
        for (lineno, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
                continue;
            }
            match parse_line(trimmed) {
                Some((path, accel)) => {
                    if self.change_entry(path, accel).is_ok() {
                        applied += 1;
                    }
                }
                None => {
                    tracing::warn!(target: targets::ACCEL, line = lineno + 1, text = trimmed, "skipping malformed accelerator line");
                }
            }
        }
        applied
    }

    /// Every binding as `path = accel` lines, sorted by path.
    pub fn save_to_string(&self) -> String {
        self.entries()
            .into_iter()
            .map(|(path, accel)| format!("{path} = {accel}\n"))
            .collect()
    }

    /// Merge entries from a file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<usize, AccelError> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.load_from_string(&text))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AccelError> {
        std::fs::write(path, self.save_to_string())?;
        Ok(())
    }
}

fn parse_line(line: &str) -> Option<(&str, Accelerator)> {
    let caps = ENTRY_LINE.captures(line)?;
    let path = caps.get(1)?.as_str();
    let modifiers = parse_modifier_list(caps.get(2).map_or("", |m| m.as_str()))?;
    let key = Key::from_name(caps.get(3)?.as_str())?;
    Some((path, Accelerator::new(key, modifiers)))
}
