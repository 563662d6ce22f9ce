//! Option descriptors and resolved configuration values.

use crate::errors::{KeelError, Result};
use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Semantic type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Valueless directive (`--help`, `--version`)
    Flag,
    /// Free text
    String,
    /// 64-bit signed integer
    Integer,
    /// Double precision floating point
    Float,
    /// Filesystem path
    Path,
    /// Homogeneous list of strings
    StringList,
    /// Homogeneous list of integers
    IntegerList,
    /// Homogeneous list of floats
    FloatList,
}

impl ValueType {
    /// Whether values of this type accumulate multiple tokens.
    pub fn is_list(self) -> bool {
        matches!(
            self,
            ValueType::StringList | ValueType::IntegerList | ValueType::FloatList
        )
    }

    /// Human-readable description, used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            ValueType::Flag => "no value",
            ValueType::String => "a string",
            ValueType::Integer => "an integer",
            ValueType::Float => "a floating point number",
            ValueType::Path => "a path",
            ValueType::StringList => "a list of strings",
            ValueType::IntegerList => "a list of integers",
            ValueType::FloatList => "a list of floating point numbers",
        }
    }

    /// Short name, used in help output and audit warnings.
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Flag => "flag",
            ValueType::String => "string",
            ValueType::Integer => "int",
            ValueType::Float => "double",
            ValueType::Path => "path",
            ValueType::StringList => "string-vector",
            ValueType::IntegerList => "int-vector",
            ValueType::FloatList => "double-vector",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configuration value after resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    /// Free text
    String(String),
    /// 64-bit signed integer
    Integer(i64),
    /// Double precision floating point
    Float(f64),
    /// Filesystem path
    Path(PathBuf),
    /// List of strings
    StringList(Vec<String>),
    /// List of integers
    IntegerList(Vec<i64>),
    /// List of floats
    FloatList(Vec<f64>),
}

impl ResolvedValue {
    /// The semantic type this value belongs to.
    pub fn value_type(&self) -> ValueType {
        match self {
            ResolvedValue::String(_) => ValueType::String,
            ResolvedValue::Integer(_) => ValueType::Integer,
            ResolvedValue::Float(_) => ValueType::Float,
            ResolvedValue::Path(_) => ValueType::Path,
            ResolvedValue::StringList(_) => ValueType::StringList,
            ResolvedValue::IntegerList(_) => ValueType::IntegerList,
            ResolvedValue::FloatList(_) => ValueType::FloatList,
        }
    }

    /// String payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResolvedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload, if this is an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ResolvedValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if this is a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ResolvedValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Path payload, if this is a path.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ResolvedValue::Path(p) => Some(p),
            _ => None,
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("{")?;
    for item in items {
        write!(f, " {}", item)?;
    }
    f.write_str(" }")
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedValue::String(s) => f.write_str(s),
            ResolvedValue::Integer(i) => write!(f, "{}", i),
            ResolvedValue::Float(x) => write!(f, "{}", x),
            ResolvedValue::Path(p) => write!(f, "{}", p.display()),
            ResolvedValue::StringList(v) => write_list(f, v),
            ResolvedValue::IntegerList(v) => write_list(f, v),
            ResolvedValue::FloatList(v) => write_list(f, v),
        }
    }
}

/// Where an option may be supplied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionScope {
    /// Command line only (directives and the configuration file itself)
    CommandLineOnly,
    /// Command line or configuration file
    Anywhere,
}

/// Declaration of one recognized option.
///
/// Descriptors are built with the typed constructors, which makes the
/// default always agree with the declared type.
///
/// # Example
///
/// ```
/// use keel_types::{OptionDescriptor, ValueType};
///
/// let d = OptionDescriptor::integer_list("int-vector", vec![1, 2], "Integers to sum");
/// assert_eq!(d.value_type(), ValueType::IntegerList);
/// assert!(d.is_multi());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    key: String,
    value_type: ValueType,
    default: Option<ResolvedValue>,
    help: String,
    scope: OptionScope,
    positional: bool,
}

impl OptionDescriptor {
    fn with_default(key: impl Into<String>, default: ResolvedValue, help: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value_type: default.value_type(),
            default: Some(default),
            help: help.into(),
            scope: OptionScope::Anywhere,
            positional: false,
        }
    }

    /// A valueless directive such as `--help`. Always command-line only.
    pub fn flag(key: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value_type: ValueType::Flag,
            default: None,
            help: help.into(),
            scope: OptionScope::CommandLineOnly,
            positional: false,
        }
    }

    /// A string option.
    pub fn string(key: impl Into<String>, default: impl Into<String>, help: impl Into<String>) -> Self {
        Self::with_default(key, ResolvedValue::String(default.into()), help)
    }

    /// An integer option.
    pub fn integer(key: impl Into<String>, default: i64, help: impl Into<String>) -> Self {
        Self::with_default(key, ResolvedValue::Integer(default), help)
    }

    /// A floating point option.
    pub fn float(key: impl Into<String>, default: f64, help: impl Into<String>) -> Self {
        Self::with_default(key, ResolvedValue::Float(default), help)
    }

    /// A path option.
    pub fn path(key: impl Into<String>, default: impl Into<PathBuf>, help: impl Into<String>) -> Self {
        Self::with_default(key, ResolvedValue::Path(default.into()), help)
    }

    /// A list of strings.
    pub fn string_list(key: impl Into<String>, default: Vec<String>, help: impl Into<String>) -> Self {
        Self::with_default(key, ResolvedValue::StringList(default), help)
    }

    /// A list of integers.
    pub fn integer_list(key: impl Into<String>, default: Vec<i64>, help: impl Into<String>) -> Self {
        Self::with_default(key, ResolvedValue::IntegerList(default), help)
    }

    /// A list of floats.
    pub fn float_list(key: impl Into<String>, default: Vec<f64>, help: impl Into<String>) -> Self {
        Self::with_default(key, ResolvedValue::FloatList(default), help)
    }

    /// Restrict the option to the command line.
    pub fn command_line_only(mut self) -> Self {
        self.scope = OptionScope::CommandLineOnly;
        self
    }

    /// Bind the option from bare command-line arguments instead of a
    /// `--key` flag.
    ///
    /// Positional options take their index from declaration order. A
    /// configuration file still binds them by key.
    pub fn positional(mut self) -> Self {
        self.positional = true;
        self
    }

    /// Option key, also the long command-line flag name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Declared semantic type.
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Default value; `None` only for flags.
    pub fn default_value(&self) -> Option<&ResolvedValue> {
        self.default.as_ref()
    }

    /// Help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Where the option may be supplied from.
    pub fn scope(&self) -> OptionScope {
        self.scope
    }

    /// Whether the option accepts several values.
    pub fn is_multi(&self) -> bool {
        self.value_type.is_list()
    }

    /// Whether the option is bound from bare command-line arguments.
    pub fn is_positional(&self) -> bool {
        self.positional
    }

    /// Whether the option is a valueless directive.
    pub fn is_flag(&self) -> bool {
        self.value_type == ValueType::Flag
    }
}

/// Which source bound a resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueSource {
    /// Supplied on the command line
    CommandLine,
    /// Supplied by the configuration file
    ConfigFile,
    /// Schema default
    Default,
}

/// One resolved key.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    /// The value
    pub value: ResolvedValue,
    /// Which source provided it
    pub source: ValueSource,
}

/// The final key to value mapping produced by resolution.
///
/// Entries keep the order in which they were produced (schema declaration
/// order) so audit output is stable. The mapping is read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    entries: IndexMap<String, ResolvedEntry>,
}

impl ResolvedConfig {
    /// Build a configuration from already resolved entries.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ResolvedEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Which source bound `key`.
    pub fn source(&self, key: &str) -> Option<ValueSource> {
        self.entries.get(key).map(|e| e.source)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys in resolution order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Key/value pairs in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResolvedValue)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), &e.value))
    }

    /// Number of resolved keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was resolved.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn require(&self, key: &str) -> Result<&ResolvedValue> {
        self.get(key).ok_or_else(|| KeelError::UnknownOption {
            option: key.to_string(),
            context: " in the resolved configuration".to_string(),
        })
    }

    fn mismatch(key: &str, value: &ResolvedValue, expected: ValueType) -> KeelError {
        KeelError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected: expected.describe().to_string(),
        }
    }

    /// String value of `key`.
    pub fn string(&self, key: &str) -> Result<&str> {
        let value = self.require(key)?;
        value
            .as_str()
            .ok_or_else(|| Self::mismatch(key, value, ValueType::String))
    }

    /// Integer value of `key`.
    pub fn integer(&self, key: &str) -> Result<i64> {
        let value = self.require(key)?;
        value
            .as_integer()
            .ok_or_else(|| Self::mismatch(key, value, ValueType::Integer))
    }

    /// Float value of `key`.
    pub fn float(&self, key: &str) -> Result<f64> {
        let value = self.require(key)?;
        value
            .as_float()
            .ok_or_else(|| Self::mismatch(key, value, ValueType::Float))
    }

    /// Path value of `key`.
    pub fn path(&self, key: &str) -> Result<&Path> {
        let value = self.require(key)?;
        value
            .as_path()
            .ok_or_else(|| Self::mismatch(key, value, ValueType::Path))
    }

    /// String list value of `key`.
    pub fn strings(&self, key: &str) -> Result<&[String]> {
        match self.require(key)? {
            ResolvedValue::StringList(v) => Ok(v),
            other => Err(Self::mismatch(key, other, ValueType::StringList)),
        }
    }

    /// Integer list value of `key`.
    pub fn integers(&self, key: &str) -> Result<&[i64]> {
        match self.require(key)? {
            ResolvedValue::IntegerList(v) => Ok(v),
            other => Err(Self::mismatch(key, other, ValueType::IntegerList)),
        }
    }

    /// Float list value of `key`.
    pub fn floats(&self, key: &str) -> Result<&[f64]> {
        match self.require(key)? {
            ResolvedValue::FloatList(v) => Ok(v),
            other => Err(Self::mismatch(key, other, ValueType::FloatList)),
        }
    }
}

impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, entry) in &self.entries {
            map.serialize_entry(key, &entry.value)?;
        }
        map.end()
    }
}
