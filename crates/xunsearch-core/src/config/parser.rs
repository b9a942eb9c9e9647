//! Line-oriented ini parser for project configuration.
//!
//! The grammar is deliberately small:
//!
//! ```text
//! ; comment            # also a comment
//! project.name = demo
//! server.index = 8383
//!
//! [pid]
//! type = id
//!
//! [subject]
//! type = "title"
//! ```
//!
//! Lines are handled one at a time. Blank lines and lines whose first
//! non-space character is `;` or `#` are skipped. `[name]` opens a section
//! that receives every following `key = value` line until the next header.
//! Anything else without an `=` is ignored, so malformed input yields a
//! partial (possibly empty) [`ProjectConfig`] rather than an error.

use serde::{Deserialize, Serialize};

/// Characters stripped from both ends of a value.
const VALUE_TRIM: &[char] = &[' ', '\t', '\'', '"'];

/// Ordered `key → value` mapping of one `[section]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Section {
    entries: Vec<(String, String)>,
}

impl Section {
    /// Create an empty section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite a value; an overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        upsert(&mut self.entries, key.into(), value.into());
    }

    /// Iterate over entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the section has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Section {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut section = Section::new();
        for (k, v) in iter {
            section.insert(k, v);
        }
        section
    }
}

/// A top-level configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// A plain `key = value` pair.
    Scalar(String),
    /// A `[section]` sub-mapping.
    Section(Section),
}

impl ConfigValue {
    /// Returns the scalar string, if this is one.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(s) => Some(s),
            ConfigValue::Section(_) => None,
        }
    }

    /// Returns the section, if this is one.
    pub fn as_section(&self) -> Option<&Section> {
        match self {
            ConfigValue::Section(s) => Some(s),
            ConfigValue::Scalar(_) => None,
        }
    }
}

/// Parsed project configuration.
///
/// Keys are case-sensitive and keep their declaration order. Immutable in
/// practice: the loader hands it out behind an `Arc` and replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectConfig {
    entries: Vec<(String, ConfigValue)>,
}

impl ProjectConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text. Never fails; see the module docs.
    pub fn parse(text: &str) -> Self {
        parse_ini(text)
    }

    /// Look up any top-level value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a top-level scalar such as `server.index`.
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_scalar)
    }

    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.get(name).and_then(ConfigValue::as_section)
    }

    /// Set a top-level scalar, replacing whatever was stored under `key`.
    pub fn insert_scalar(&mut self, key: impl Into<String>, value: impl Into<String>) {
        upsert(
            &mut self.entries,
            key.into(),
            ConfigValue::Scalar(value.into()),
        );
    }

    /// Set a section, replacing whatever was stored under `name`.
    pub fn insert_section(&mut self, name: impl Into<String>, section: Section) {
        upsert(&mut self.entries, name.into(), ConfigValue::Section(section));
    }

    /// Iterate over all top-level entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over sections only, in declaration order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.iter()
            .filter_map(|(k, v)| v.as_section().map(|s| (k, s)))
    }

    /// Number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was parsed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

fn parse_ini(text: &str) -> ProjectConfig {
    let mut config = ProjectConfig::new();
    // Pending section, flushed into `config` when the next header (or EOF) arrives.
    let mut current: Option<(String, Section)> = None;

    for raw in text.split('\n') {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if line.len() >= 2 && line.starts_with('[') && line.ends_with(']') {
            if let Some((name, section)) = current.take() {
                config.insert_section(name, section);
            }
            let name = &line[1..line.len() - 1];
            // Register the header immediately so an empty section still exists
            // and keeps its position.
            config.insert_section(name, Section::new());
            current = Some((name.to_string(), Section::new()));
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim_matches(VALUE_TRIM);

        match current.as_mut() {
            Some((_, section)) => section.insert(key, value),
            None => config.insert_scalar(key, value),
        }
    }

    if let Some((name, section)) = current.take() {
        config.insert_section(name, section);
    }

    config
}

// ============================================================================
// Tests
// ============================================================================
