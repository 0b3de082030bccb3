//! Configuration entry descriptors
//!
//! A [`ConfigEntry`] is the immutable description of one configuration key:
//! its canonical dotted name, type, default value and documentation. Named
//! variants for prefixed instances are derived with [`ConfigEntry::as_named`]
//! and never mutate the original.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Separator between prefix, namespace and short name segments
pub const SEPARATOR: char = '.';

/// Semantic type of a configuration entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    String,
    Int,
    Double,
    Boolean,
    /// Display hint only; values are stored as plain strings
    Password,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Int => write!(f, "int"),
            Self::Double => write!(f, "double"),
            Self::Boolean => write!(f, "boolean"),
            Self::Password => write!(f, "password"),
        }
    }
}

/// Informational classification of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryTag {
    #[default]
    Common,
    Advanced,
    Security,
}

#[derive(Debug, Clone)]
struct EntryMeta {
    module: Arc<str>,
    /// Canonical name without any instance prefix
    template_name: Arc<str>,
    /// Name without the module namespace
    short_name: Arc<str>,
    entry_type: EntryType,
    required: bool,
    default_value: Option<String>,
    label: Option<String>,
    description: Option<String>,
    tag: EntryTag,
}

/// Descriptor for a single configuration key
///
/// Identity is the `(module, canonical name)` pair. Cloning is cheap: the
/// metadata is shared between a template and all of its named variants.
#[derive(Clone)]
pub struct ConfigEntry {
    meta: Arc<EntryMeta>,
    prefix: Option<Arc<str>>,
    name: Arc<str>,
}

impl ConfigEntry {
    /// Create an optional string entry with no default
    pub fn of(module: impl Into<String>, name: impl Into<String>) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        Self {
            meta: Arc::new(EntryMeta {
                module: Arc::from(module.into()),
                template_name: name.clone(),
                short_name: name.clone(),
                entry_type: EntryType::default(),
                required: false,
                default_value: None,
                label: None,
                description: None,
                tag: EntryTag::default(),
            }),
            prefix: None,
            name,
        }
    }

    /// Set the human-readable description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.meta).description = Some(description.into());
        self
    }

    /// Set the display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.meta).label = Some(label.into());
        self
    }

    /// Set the value used when no source provides one
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.meta).default_value = Some(value.into());
        self
    }

    /// Set the semantic type
    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        Arc::make_mut(&mut self.meta).entry_type = entry_type;
        self
    }

    /// Mark the entry as required
    pub fn required(mut self) -> Self {
        Arc::make_mut(&mut self.meta).required = true;
        self
    }

    /// Set the classification tag
    pub fn with_tag(mut self, tag: EntryTag) -> Self {
        Arc::make_mut(&mut self.meta).tag = tag;
        self
    }

    /// Derive the short name by stripping `namespace.` from the canonical name
    pub(crate) fn within_namespace(mut self, namespace: &str) -> Self {
        let short = self
            .meta
            .template_name
            .strip_prefix(namespace)
            .and_then(|rest| rest.strip_prefix(SEPARATOR))
            .filter(|rest| !rest.is_empty())
            .map(Arc::from);
        if let Some(short) = short {
            Arc::make_mut(&mut self.meta).short_name = short;
        }
        self
    }

    /// Derive the variant of this entry for a named instance
    ///
    /// `None` and `""` return the entry unchanged. Applying the same prefix
    /// twice stacks it (`p.p.name`).
    pub fn as_named(&self, prefix: Option<&str>) -> Self {
        let Some(prefix) = prefix.filter(|p| !p.is_empty()) else {
            return self.clone();
        };
        let stacked: Arc<str> = match &self.prefix {
            Some(existing) => Arc::from(format!("{prefix}{SEPARATOR}{existing}")),
            None => Arc::from(prefix),
        };
        Self {
            meta: self.meta.clone(),
            name: Arc::from(format!("{prefix}{SEPARATOR}{}", self.name)),
            prefix: Some(stacked),
        }
    }

    /// Owning module identifier
    pub fn module(&self) -> &str {
        &self.meta.module
    }

    /// Canonical name, including the instance prefix for named variants
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        self.name.clone()
    }

    /// Canonical name without the instance prefix
    pub fn template_name(&self) -> &str {
        &self.meta.template_name
    }

    /// Name without module namespace or prefix
    pub fn short_name(&self) -> &str {
        &self.meta.short_name
    }

    /// Instance prefix of a named variant
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn is_named(&self) -> bool {
        self.prefix.is_some()
    }

    pub fn entry_type(&self) -> EntryType {
        self.meta.entry_type
    }

    pub fn is_required(&self) -> bool {
        self.meta.required
    }

    pub fn default_value(&self) -> Option<&str> {
        self.meta.default_value.as_deref()
    }

    pub fn label(&self) -> Option<&str> {
        self.meta.label.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.meta.description.as_deref()
    }

    pub fn tag(&self) -> EntryTag {
        self.meta.tag
    }

    /// Whether values of this entry must be masked when displayed
    pub fn is_secret(&self) -> bool {
        self.meta.entry_type == EntryType::Password || self.meta.tag == EntryTag::Security
    }

    /// Environment variable name for this entry
    pub fn env_name(&self) -> String {
        env_name(&self.name)
    }
}

/// Map a dotted property key to its environment variable form
///
/// `ds1.forage.jdbc.url` becomes `DS1_FORAGE_JDBC_URL`.
pub fn env_name(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

impl PartialEq for ConfigEntry {
    fn eq(&self, other: &Self) -> bool {
        self.meta.module == other.meta.module && self.name == other.name
    }
}

impl Eq for ConfigEntry {}

impl Hash for ConfigEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.meta.module.hash(state);
        self.name.hash(state);
    }
}

impl fmt::Debug for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigEntry")
            .field("module", &self.meta.module)
            .field("name", &self.name)
            .field("type", &self.meta.entry_type)
            .field("required", &self.meta.required)
            .finish()
    }
}

impl fmt::Display for ConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
