//! External value sources: environment, system properties and properties files

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Where a resolved value came from, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Environment,
    SystemProperty,
    PropertiesFile,
    Default,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "environment"),
            Self::SystemProperty => write!(f, "system property"),
            Self::PropertiesFile => write!(f, "properties file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// A read-only key/value source that can also enumerate its keys
pub trait PropertySource: Send + Sync {
    /// Value for a key, if present
    fn get(&self, key: &str) -> Option<String>;

    /// Every key currently observable in this source
    fn keys(&self) -> Vec<String>;

    /// Source kind for diagnostics
    fn kind(&self) -> SourceKind;
}

/// Environment variables, read from the process or from a fixed snapshot
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// Live process environment
    #[default]
    Process,
    /// Fixed variables, used by isolated contexts
    Fixed(BTreeMap<String, String>),
}

impl EnvSource {
    /// Fixed environment built from name/value pairs
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl PropertySource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        match self {
            Self::Process => std::env::var(key).ok(),
            Self::Fixed(vars) => vars.get(key).cloned(),
        }
    }

    fn keys(&self) -> Vec<String> {
        match self {
            Self::Process => std::env::vars_os()
                .filter_map(|(name, _)| name.into_string().ok())
                .collect(),
            Self::Fixed(vars) => vars.keys().cloned().collect(),
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Environment
    }
}

/// Process-wide property store addressed by canonical dotted names
#[derive(Debug, Default)]
pub struct SystemProperties {
    values: DashMap<String, String>,
}

impl SystemProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, returning the previous value
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove a property, returning its value
    pub fn remove(&self, key: &str) -> Option<String> {
        self.values.remove(key).map(|(_, value)| value)
    }

    pub fn clear(&self) {
        self.values.clear();
    }
}

impl PropertySource for SystemProperties {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|value| value.value().clone())
    }

    fn keys(&self) -> Vec<String> {
        self.values.iter().map(|item| item.key().clone()).collect()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::SystemProperty
    }
}

/// Parsed contents of a flat `key=value` properties file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    /// Entries in file order; later duplicates replace earlier values
    entries: Vec<(String, String)>,
    path: Option<PathBuf>,
}

impl Properties {
    /// Parse properties text
    ///
    /// Accepts `=`, `:` or whitespace separators, `#` and `!` comments,
    /// backslash line continuations and the usual escapes including `\uXXXX`.
    pub fn parse(content: &str) -> Self {
        let mut properties = Self::default();
        let mut lines = content.lines();

        while let Some(line) = lines.next() {
            let mut logical = line.trim_start().to_string();
            if logical.is_empty() || logical.starts_with('#') || logical.starts_with('!') {
                continue;
            }
            while ends_with_continuation(&logical) {
                logical.pop();
                match lines.next() {
                    Some(next) => logical.push_str(next.trim_start()),
                    None => break,
                }
            }

            let (key, value) = split_key_value(&logical);
            properties.insert(unescape(key), unescape(value));
        }

        properties
    }

    /// Read and parse a properties file
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::PropertiesRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut properties = Self::parse(&content);
        properties.path = Some(path.to_path_buf());
        Ok(properties)
    }

    fn insert(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// File this was loaded from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Entries in file order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PropertySource for Properties {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.clone())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::PropertiesFile
    }
}

/// An odd number of trailing backslashes continues the line
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split at the first unescaped `=`, `:` or whitespace
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..index], line[index + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[index..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (&line[..index], rest.trim_start());
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}
