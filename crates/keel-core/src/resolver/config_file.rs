//! Configuration file reading.
//!
//! Two formats are understood. The default is a line format:
//!
//! ```text
//! # comment
//! log-level = 300
//! int-vector = 1 2 3
//! int-vector = 4        # repeated list keys append
//!
//! [net]
//! port = 8080           # binds `net.port`
//! ```
//!
//! Files ending in `.yaml` or `.yml` are read as a YAML mapping instead.
//! Nested mappings bind dotted keys the same way `[section]` headers do.

use super::parse_tokens;
use crate::schema::OptionSchema;
use crate::util::is_yaml;
use keel_types::{bail, KeelError, OptionDescriptor, OptionScope, ResolvedValue, Result};
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;

/// One occurrence of a key in a file.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    /// Untokenized text after `=`
    Line(String),
    /// Already separated items (YAML sequences and scalars)
    Items(Vec<String>),
}

type RawBindings = Vec<(String, Vec<RawValue>)>;

/// Read and type-check the configuration file at `path`.
///
/// Only options with [`OptionScope::Anywhere`] may be bound by a file.
pub fn read_config_file(path: &Path, schema: &OptionSchema) -> Result<HashMap<String, ResolvedValue>> {
    let text = std::fs::read_to_string(path).map_err(|source| KeelError::ConfigFileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "reading configuration file");

    let raw = if is_yaml(path) {
        parse_yaml(&text)?
    } else {
        parse_lines(&text, path)?
    };

    let mut values = HashMap::with_capacity(raw.len());
    for (key, occurrences) in raw {
        let descriptor = match schema.find(&key) {
            Some(d) if d.scope() == OptionScope::Anywhere => d,
            _ => {
                return Err(KeelError::UnknownOption {
                    option: key,
                    context: format!(" in configuration file {}", path.display()),
                })
            }
        };
        let tokens = tokens(descriptor, occurrences, path)?;
        values.insert(key, parse_tokens(descriptor, &tokens)?);
    }
    Ok(values)
}

fn tokens(descriptor: &OptionDescriptor, occurrences: Vec<RawValue>, path: &Path) -> Result<Vec<String>> {
    if !descriptor.is_multi() && occurrences.len() > 1 {
        bail!(
            Usage,
            "option '{}' is set more than once in {}",
            descriptor.key(),
            path.display()
        );
    }

    let mut tokens = Vec::new();
    for occurrence in occurrences {
        match occurrence {
            RawValue::Line(text) if descriptor.is_multi() => {
                tokens.extend(text.split_whitespace().map(str::to_string))
            }
            RawValue::Line(text) => tokens.push(text),
            RawValue::Items(items) => tokens.extend(items),
        }
    }
    Ok(tokens)
}

fn bind(raw: &mut RawBindings, key: String, value: RawValue) {
    match raw.iter_mut().find(|(k, _)| *k == key) {
        Some((_, occurrences)) => occurrences.push(value),
        None => raw.push((key, vec![value])),
    }
}

fn parse_lines(text: &str, path: &Path) -> Result<RawBindings> {
    let mut raw = RawBindings::new();
    let mut section = String::new();

    for (number, line) in text.lines().enumerate() {
        let line = match line.find('#') {
            Some(at) => &line[..at],
            None => line,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = name.trim().to_string();
            continue;
        }

        let (key, value) = match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => (key.trim(), value.trim()),
            _ => bail!(
                Usage,
                "{}:{}: expected 'key = value', found '{}'",
                path.display(),
                number + 1,
                line
            ),
        };
        let key = if section.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", section, key)
        };
        bind(&mut raw, key, RawValue::Line(value.to_string()));
    }
    Ok(raw)
}

fn parse_yaml(text: &str) -> Result<RawBindings> {
    let mut raw = RawBindings::new();
    if text.trim().is_empty() {
        return Ok(raw);
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Null => {}
        Value::Mapping(mapping) => flatten_yaml(&mut raw, "", mapping)?,
        _ => bail!(Usage, "configuration document must be a mapping"),
    }
    Ok(raw)
}

fn flatten_yaml(raw: &mut RawBindings, prefix: &str, mapping: serde_yaml::Mapping) -> Result<()> {
    for (key, value) in mapping {
        let key = match key {
            Value::String(key) if prefix.is_empty() => key,
            Value::String(key) => format!("{}.{}", prefix, key),
            other => bail!(Usage, "configuration key {:?} is not a string", other),
        };
        let items = match value {
            Value::Mapping(nested) => {
                flatten_yaml(raw, &key, nested)?;
                continue;
            }
            Value::Sequence(sequence) => sequence
                .into_iter()
                .map(|item| scalar_text(&key, item))
                .collect::<Result<Vec<_>>>()?,
            Value::Null => Vec::new(),
            scalar => vec![scalar_text(&key, scalar)?],
        };
        bind(raw, key, RawValue::Items(items));
    }
    Ok(())
}

fn scalar_text(key: &str, value: Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(KeelError::Usage(format!(
            "option '{}': unsupported value {:?}",
            key, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::GenericOptions;
    use std::fs;
    use tempfile::TempDir;

    fn schema() -> OptionSchema {
        let generic = GenericOptions::for_program("probe").with_config_root("/nonexistent");
        OptionSchema::new(
            &generic,
            vec![
                OptionDescriptor::string("name", "", "A name"),
                OptionDescriptor::integer("net.port", 80, "A port"),
                OptionDescriptor::integer_list("int-vector", vec![], "Integers"),
                OptionDescriptor::string_list("tags", vec![], "Tags"),
                OptionDescriptor::float("ratio", 1.0, "A ratio"),
            ],
        )
        .unwrap()
    }

    fn read(name: &str, contents: &str) -> Result<HashMap<String, ResolvedValue>> {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        read_config_file(&path, &schema())
    }

    #[test]
    fn test_line_format() {
        let values = read(
            "probe.conf",
            "# leading comment\n\
             name = some text   # trailing\n\
             \n\
             log-level = 300\n\
             int-vector = 1 2 3\n\
             int-vector = 4\n\
             [net]\n\
             port = 8080\n",
        )
        .unwrap();

        assert_eq!(values["name"], ResolvedValue::String("some text".into()));
        assert_eq!(values["log-level"], ResolvedValue::Integer(300));
        assert_eq!(values["int-vector"], ResolvedValue::IntegerList(vec![1, 2, 3, 4]));
        assert_eq!(values["net.port"], ResolvedValue::Integer(8080));
        assert_eq!(values.len(), 4);
    }

    #[test]
    fn test_empty_list_value() {
        let values = read("probe.conf", "tags =\n").unwrap();
        assert_eq!(values["tags"], ResolvedValue::StringList(vec![]));
    }

    #[test]
    fn test_repeated_scalar_is_rejected() {
        let err = read("probe.conf", "ratio = 1.5\nratio = 2.5\n").unwrap_err();
        assert!(matches!(err, KeelError::Usage(ref m) if m.contains("ratio") && m.contains("probe.conf")));
    }

    #[test]
    fn test_unknown_key_names_file() {
        let err = read("probe.conf", "colour = blue\n").unwrap_err();
        assert!(err.to_string().contains("colour"));
        assert!(err.to_string().contains("probe.conf"));
    }

    #[test]
    fn test_command_line_only_keys_are_rejected() {
        for line in ["config-file = other.conf\n", "help = 1\n", "version = 1\n"] {
            let err = read("probe.conf", line).unwrap_err();
            assert!(matches!(err, KeelError::UnknownOption { .. }), "{}", line);
        }
    }

    #[test]
    fn test_invalid_value_in_file() {
        let err = read("probe.conf", "log-level = verbose\n").unwrap_err();
        assert!(matches!(err, KeelError::InvalidValue { ref key, ref value, .. }
            if key == "log-level" && value == "verbose"));
    }

    #[test]
    fn test_malformed_line() {
        let err = read("probe.conf", "log-level 300\n").unwrap_err();
        assert!(matches!(err, KeelError::Usage(ref m) if m.contains(":1:")));
    }

    #[test]
    fn test_yaml_format() {
        let values = read(
            "probe.yaml",
            "log-level: 500\n\
             name: two words\n\
             tags: [a b, c]\n\
             int-vector: [1, 2, 3]\n\
             net:\n  port: 9090\n",
        )
        .unwrap();

        assert_eq!(values["log-level"], ResolvedValue::Integer(500));
        assert_eq!(values["name"], ResolvedValue::String("two words".into()));
        assert_eq!(
            values["tags"],
            ResolvedValue::StringList(vec!["a b".into(), "c".into()])
        );
        assert_eq!(values["int-vector"], ResolvedValue::IntegerList(vec![1, 2, 3]));
        assert_eq!(values["net.port"], ResolvedValue::Integer(9090));
    }

    #[test]
    fn test_empty_yaml_document() {
        assert!(read("probe.yml", "").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = read_config_file(Path::new("/nonexistent/probe.conf"), &schema()).unwrap_err();
        assert!(matches!(err, KeelError::ConfigFileNotFound { .. }));
        assert!(err.to_string().contains("/nonexistent/probe.conf"));
    }
}
