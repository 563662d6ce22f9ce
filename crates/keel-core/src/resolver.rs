//! Configuration resolution.
//!
//! The command line is parsed with clap's builder API against the full
//! descriptor set, then the configuration file is read and the three
//! providers are merged with first-provider-wins precedence:
//!
//! 1. command line
//! 2. configuration file
//! 3. schema defaults
//!
//! `--help` and `--version` short-circuit into [`Resolution::EarlyExit`]
//! before the configuration file is looked at.

mod config_file;

use crate::schema::{keys, OptionSchema};
use crate::util::expand_path;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Arg, ArgAction, ArgMatches, Command};
use keel_types::{
    bail, ExitCode, KeelError, OptionDescriptor, ResolvedConfig, ResolvedEntry, ResolvedValue,
    Result, ValueSource, ValueType,
};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

pub use config_file::read_config_file;

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Every value-bearing key is bound.
    Resolved(ResolvedConfig),
    /// A directive asked for termination after printing `output`.
    EarlyExit {
        /// Process exit code
        code: ExitCode,
        /// Text to print on standard output
        output: String,
    },
}

impl Resolution {
    /// The resolved configuration, if resolution ran to completion.
    pub fn into_config(self) -> Option<ResolvedConfig> {
        match self {
            Resolution::Resolved(config) => Some(config),
            Resolution::EarlyExit { .. } => None,
        }
    }
}

/// Resolve `argv` (program path at index 0) against `schema`.
///
/// # Errors
///
/// * `UnknownOption` for undeclared options on the command line or in the file
/// * `InvalidValue` for values that do not parse as their declared type
/// * `Usage` for other command-line or file misuse
/// * `ConfigFileNotFound` when the effective configuration file cannot be read
pub fn resolve<I, T>(argv: I, schema: &OptionSchema) -> Result<Resolution>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = build_command(schema);
    let matches = command
        .try_get_matches_from_mut(argv)
        .map_err(map_clap_error)?;

    if matches.get_flag(keys::HELP) {
        return Ok(Resolution::EarlyExit {
            code: ExitCode::Ok,
            output: command.render_help().to_string(),
        });
    }
    if matches.get_flag(keys::VERSION) {
        return Ok(Resolution::EarlyExit {
            code: ExitCode::Ok,
            output: schema.version_line(),
        });
    }

    let mut from_cli = command_line_values(&matches, schema)?;

    let config_path = match from_cli
        .get(keys::CONFIG_FILE)
        .or_else(|| schema.find(keys::CONFIG_FILE).and_then(|d| d.default_value()))
    {
        Some(ResolvedValue::Path(path)) => path.clone(),
        _ => bail!(Schema, "option '{}' has no path value", keys::CONFIG_FILE),
    };
    let mut from_file = read_config_file(&config_path, schema)?;

    let mut entries = Vec::with_capacity(schema.describe().len());
    for descriptor in schema.describe() {
        if descriptor.is_flag() {
            continue;
        }
        let key = descriptor.key();
        let entry = if let Some(value) = from_cli.remove(key) {
            ResolvedEntry {
                value,
                source: ValueSource::CommandLine,
            }
        } else if let Some(value) = from_file.remove(key) {
            ResolvedEntry {
                value,
                source: ValueSource::ConfigFile,
            }
        } else if let Some(value) = descriptor.default_value() {
            ResolvedEntry {
                value: value.clone(),
                source: ValueSource::Default,
            }
        } else {
            continue;
        };
        tracing::trace!(key, source = ?entry.source, "bound option");
        entries.push((key.to_string(), entry));
    }

    Ok(Resolution::Resolved(ResolvedConfig::from_entries(entries)))
}

fn build_command(schema: &OptionSchema) -> Command {
    let mut command = Command::new(schema.program_name().to_string())
        .disable_help_flag(true)
        .disable_version_flag(true);

    let mut index = 0;
    for descriptor in schema.describe() {
        let position = if descriptor.is_positional() {
            index += 1;
            Some(index)
        } else {
            None
        };
        command = command.arg(build_arg(descriptor, position));
    }
    command
}

fn build_arg(descriptor: &OptionDescriptor, position: Option<usize>) -> Arg {
    let value_type = descriptor.value_type();
    let mut help = descriptor.help().to_string();
    if let Some(default) = descriptor.default_value() {
        let rendered = default.to_string();
        if !rendered.is_empty() {
            help = format!("{} [default: {}]", help, rendered);
        }
    }

    let arg = Arg::new(descriptor.key().to_string()).help(help);
    let arg = match position {
        // Positionals cannot carry a long name in clap.
        Some(index) => arg.index(index).value_name(descriptor.key().to_string()),
        None => arg.long(descriptor.key().to_string()),
    };

    if value_type == ValueType::Flag {
        return arg.action(ArgAction::SetTrue);
    }

    let numeric = matches!(
        value_type,
        ValueType::Integer | ValueType::Float | ValueType::IntegerList | ValueType::FloatList
    );
    let arg = if position.is_some() {
        arg
    } else {
        arg.value_name(value_type.name())
    };
    let arg = arg
        .value_parser(clap::value_parser!(String))
        .allow_negative_numbers(numeric);

    if value_type.is_list() {
        arg.action(ArgAction::Append).num_args(1..)
    } else {
        arg.action(ArgAction::Set).num_args(1)
    }
}

fn command_line_values(
    matches: &ArgMatches,
    schema: &OptionSchema,
) -> Result<HashMap<String, ResolvedValue>> {
    let mut values = HashMap::new();
    for descriptor in schema.describe() {
        if descriptor.is_flag() {
            continue;
        }
        if let Some(raw) = matches.get_many::<String>(descriptor.key()) {
            let tokens: Vec<String> = raw.cloned().collect();
            values.insert(descriptor.key().to_string(), parse_tokens(descriptor, &tokens)?);
        }
    }
    Ok(values)
}

fn map_clap_error(err: clap::Error) -> KeelError {
    match err.kind() {
        ErrorKind::UnknownArgument => {
            let option = match err.get(ContextKind::InvalidArg) {
                Some(ContextValue::String(arg)) => arg.clone(),
                _ => String::new(),
            };
            KeelError::UnknownOption {
                option,
                context: " on the command line".to_string(),
            }
        }
        _ => {
            let rendered = err.to_string();
            let first = rendered.lines().next().unwrap_or_default();
            KeelError::Usage(first.trim_start_matches("error: ").to_string())
        }
    }
}

/// Convert raw tokens to the descriptor's type.
///
/// Scalar types take exactly one token, list types any number.
pub(crate) fn parse_tokens(descriptor: &OptionDescriptor, tokens: &[String]) -> Result<ResolvedValue> {
    let key = descriptor.key();
    let single = || match tokens {
        [one] => Ok(one.as_str()),
        _ => Err(KeelError::Usage(format!(
            "option '{}' takes a single value, got {}",
            key,
            tokens.len()
        ))),
    };

    let value = match descriptor.value_type() {
        ValueType::Flag => bail!(Usage, "option '{}' does not take a value", key),
        ValueType::String => ResolvedValue::String(single()?.to_string()),
        ValueType::Integer => ResolvedValue::Integer(parse_integer(key, single()?)?),
        ValueType::Float => ResolvedValue::Float(parse_float(key, single()?)?),
        ValueType::Path => ResolvedValue::Path(parse_path(single()?)),
        ValueType::StringList => ResolvedValue::StringList(tokens.to_vec()),
        ValueType::IntegerList => ResolvedValue::IntegerList(
            tokens
                .iter()
                .map(|t| parse_integer(key, t))
                .collect::<Result<_>>()?,
        ),
        ValueType::FloatList => ResolvedValue::FloatList(
            tokens
                .iter()
                .map(|t| parse_float(key, t))
                .collect::<Result<_>>()?,
        ),
    };
    Ok(value)
}

fn invalid(key: &str, text: &str, expected: ValueType) -> KeelError {
    KeelError::InvalidValue {
        key: key.to_string(),
        value: text.to_string(),
        expected: expected.describe().to_string(),
    }
}

fn parse_integer(key: &str, text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| invalid(key, text, ValueType::Integer))
}

fn parse_float(key: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| invalid(key, text, ValueType::Float))
}

fn parse_path(text: &str) -> PathBuf {
    expand_path(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::GenericOptions;
    use proptest::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn schema(root: &Path) -> OptionSchema {
        let generic = GenericOptions::for_program("/usr/bin/probe").with_config_root(root);
        OptionSchema::new(
            &generic,
            vec![
                OptionDescriptor::integer("int-option", 111, "An int option"),
                OptionDescriptor::float("ratio", 0.5, "A ratio"),
                OptionDescriptor::string("string-option", "", "A string option"),
                OptionDescriptor::integer_list("int-vector", vec![], "Integers"),
            ],
        )
        .unwrap()
        .with_version("2.1")
    }

    /// A config root whose default configuration file holds `contents`.
    fn root_with_config(contents: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("conf/probe.conf"), contents).unwrap();
        dir
    }

    fn resolved(argv: &[&str], schema: &OptionSchema) -> ResolvedConfig {
        match resolve(argv, schema).unwrap() {
            Resolution::Resolved(config) => config,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_command_line_beats_file() {
        let dir = root_with_config("log-level = 500\n");
        let config = resolved(&["probe", "--log-level", "200"], &schema(dir.path()));
        assert_eq!(config.integer("log-level").unwrap(), 200);
        assert_eq!(config.source("log-level"), Some(ValueSource::CommandLine));
    }

    #[test]
    fn test_file_beats_default() {
        let dir = root_with_config("log-level = 500\nint-option = 7\n");
        let config = resolved(&["probe"], &schema(dir.path()));
        assert_eq!(config.integer("log-level").unwrap(), 500);
        assert_eq!(config.integer("int-option").unwrap(), 7);
        assert_eq!(config.source("int-option"), Some(ValueSource::ConfigFile));
    }

    #[test]
    fn test_unbound_keys_take_defaults() {
        let dir = root_with_config("");
        let config = resolved(&["probe"], &schema(dir.path()));
        assert_eq!(config.integer("log-level").unwrap(), 400);
        assert_eq!(config.source("log-level"), Some(ValueSource::Default));
        assert_eq!(config.path("log-file").unwrap(), Path::new("./probe.log"));
        assert_eq!(config.float("ratio").unwrap(), 0.5);
        assert!(config.integers("int-vector").unwrap().is_empty());
    }

    #[test]
    fn test_resolved_keys_follow_schema() {
        let dir = root_with_config("");
        let config = resolved(&["probe"], &schema(dir.path()));
        let keys: Vec<&str> = config.keys().collect();
        assert_eq!(
            keys,
            vec![
                "config-file",
                "log-level",
                "log-file",
                "int-option",
                "ratio",
                "string-option",
                "int-vector"
            ]
        );
        assert!(!config.contains_key("help"));
        assert!(!config.contains_key("version"));
    }

    #[test]
    fn test_help_skips_config_file() {
        let dir = TempDir::new().unwrap();
        let resolution = resolve(["probe", "--help"], &schema(dir.path())).unwrap();
        match resolution {
            Resolution::EarlyExit { code, output } => {
                assert_eq!(code, ExitCode::Ok);
                assert!(output.contains("--log-level"));
                assert!(output.contains("--int-vector"));
                assert!(output.contains("An int option"));
            }
            other => panic!("expected early exit, got {:?}", other),
        }
    }

    #[test]
    fn test_version_output() {
        let dir = TempDir::new().unwrap();
        let resolution = resolve(["probe", "--version"], &schema(dir.path())).unwrap();
        assert_eq!(
            resolution,
            Resolution::EarlyExit {
                code: ExitCode::Ok,
                output: "probe 2.1".to_string()
            }
        );
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let err = resolve(["probe"], &schema(dir.path())).unwrap_err();
        match err {
            KeelError::ConfigFileNotFound { path, .. } => {
                assert_eq!(path, dir.path().join("conf/probe.conf"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("other.conf");
        fs::write(&file, "string-option = hello world\n").unwrap();
        let argv = ["probe", "--config-file", file.to_str().unwrap()];
        let config = resolved(&argv, &schema(dir.path()));
        assert_eq!(config.string("string-option").unwrap(), "hello world");
        assert_eq!(config.path("config-file").unwrap(), file.as_path());
        assert_eq!(config.source("config-file"), Some(ValueSource::CommandLine));
    }

    #[test]
    fn test_unknown_command_line_option() {
        let dir = root_with_config("");
        let err = resolve(["probe", "--bogus", "1"], &schema(dir.path())).unwrap_err();
        assert!(matches!(err, KeelError::UnknownOption { ref option, .. } if option.contains("bogus")));
        assert_eq!(err.exit_code(), ExitCode::Usage);
    }

    #[test]
    fn test_invalid_command_line_value() {
        let dir = root_with_config("");
        let err = resolve(["probe", "--log-level", "loud"], &schema(dir.path())).unwrap_err();
        match err {
            KeelError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "log-level");
                assert_eq!(value, "loud");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_repeated_scalar_on_command_line() {
        let dir = root_with_config("");
        let err = resolve(
            ["probe", "--log-level", "200", "--log-level", "300"],
            &schema(dir.path()),
        )
        .unwrap_err();
        assert!(matches!(err, KeelError::Usage(_)));
    }

    #[test]
    fn test_list_and_negative_values() {
        let dir = root_with_config("int-vector = 1 2\n");
        let config = resolved(
            &["probe", "--int-vector", "7", "-8", "--int-option", "-5"],
            &schema(dir.path()),
        );
        assert_eq!(config.integers("int-vector").unwrap(), &[7, -8]);
        assert_eq!(config.integer("int-option").unwrap(), -5);
    }

    #[test]
    fn test_serializes_to_json() {
        let dir = root_with_config("int-vector = 1 2 3\n");
        let config = resolved(&["probe"], &schema(dir.path()));
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["log-level"], 400);
        assert_eq!(json["int-vector"], serde_json::json!([1, 2, 3]));
    }

    fn positional_schema(root: &Path) -> OptionSchema {
        let generic = GenericOptions::for_program("/usr/bin/probe").with_config_root(root);
        OptionSchema::new(
            &generic,
            vec![
                OptionDescriptor::integer("int-option", 111, "An int option"),
                OptionDescriptor::path("output", "out.fits", "Output file").positional(),
                OptionDescriptor::string_list("input-files", vec![], "Input files").positional(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_positional_arguments() {
        let dir = root_with_config("");
        let config = resolved(
            &["probe", "--int-option", "-3", "result.fits", "a.fits", "b.fits"],
            &positional_schema(dir.path()),
        );
        assert_eq!(config.path("output").unwrap(), Path::new("result.fits"));
        assert_eq!(config.strings("input-files").unwrap(), &["a.fits", "b.fits"]);
        assert_eq!(config.source("input-files"), Some(ValueSource::CommandLine));
        assert_eq!(config.integer("int-option").unwrap(), -3);
    }

    #[test]
    fn test_positional_from_file_and_default() {
        let dir = root_with_config("input-files = x.fits y.fits\n");
        let config = resolved(&["probe"], &positional_schema(dir.path()));
        assert_eq!(config.path("output").unwrap(), Path::new("out.fits"));
        assert_eq!(config.source("output"), Some(ValueSource::Default));
        assert_eq!(config.strings("input-files").unwrap(), &["x.fits", "y.fits"]);
        assert_eq!(config.source("input-files"), Some(ValueSource::ConfigFile));

        let config = resolved(&["probe", "o.fits", "z.fits"], &positional_schema(dir.path()));
        assert_eq!(config.strings("input-files").unwrap(), &["z.fits"]);
    }

    #[test]
    fn test_bare_argument_without_positionals() {
        let dir = root_with_config("");
        let err = resolve(["probe", "stray"], &schema(dir.path())).unwrap_err();
        assert!(matches!(err, KeelError::UnknownOption { ref option, .. } if option == "stray"));
    }

    #[test]
    fn test_positionals_in_help() {
        let dir = TempDir::new().unwrap();
        let resolution = resolve(["probe", "--help"], &positional_schema(dir.path())).unwrap();
        match resolution {
            Resolution::EarlyExit { output, .. } => {
                assert!(output.contains("input-files"));
                assert!(output.contains("Input files"));
                assert!(!output.contains("--input-files"));
            }
            other => panic!("expected early exit, got {:?}", other),
        }
    }

    #[test]
    fn test_into_config() {
        let dir = root_with_config("");
        let config = resolve(["probe"], &schema(dir.path())).unwrap().into_config();
        assert_eq!(config.unwrap().integer("int-option").unwrap(), 111);
        let early = resolve(["probe", "--version"], &schema(dir.path())).unwrap();
        assert!(early.into_config().is_none());
    }

    proptest! {
        #[test]
        fn test_first_provider_wins(
            cli in proptest::option::of(-1000i64..1000),
            file in proptest::option::of(-1000i64..1000),
        ) {
            let contents = file.map(|v| format!("int-option = {}\n", v)).unwrap_or_default();
            let dir = root_with_config(&contents);
            let schema = schema(dir.path());

            let mut argv = vec!["probe".to_string()];
            if let Some(v) = cli {
                argv.push("--int-option".to_string());
                argv.push(v.to_string());
            }
            let config = match resolve(&argv, &schema).unwrap() {
                Resolution::Resolved(config) => config,
                other => panic!("unexpected {:?}", other),
            };

            let expected = cli.or(file).unwrap_or(111);
            prop_assert_eq!(config.integer("int-option").unwrap(), expected);
        }
    }
}
