//! Option schema: the generic option subset plus program-specific options.
//!
//! ## Generic options
//!
//! | key           | type    | default                         |
//! |---------------|---------|---------------------------------|
//! | `help`        | flag    |                                 |
//! | `version`     | flag    |                                 |
//! | `config-file` | path    | `<root>/conf/<program>.conf`    |
//! | `log-level`   | integer | `400` (INFO)                    |
//! | `log-file`    | path    | `./<program>.log`               |
//!
//! `<root>` is the first entry of the `KEEL_CONF_ROOT` search path (a
//! `:`-separated list on Unix) whose `conf/` directory holds the file, the
//! first entry when none does, and the current working directory when the
//! variable is unset.

use keel_types::{bail, Level, OptionDescriptor, Result, ValueType};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Split a `KEEL_CONF_ROOT` value into its roots, dropping empty entries.
pub fn config_search_path(value: &OsStr) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

/// Keys of the generic options.
pub mod keys {
    /// Print option documentation and exit
    pub const HELP: &str = "help";
    /// Print the version string and exit
    pub const VERSION: &str = "version";
    /// Configuration file to read
    pub const CONFIG_FILE: &str = "config-file";
    /// Integer logging threshold
    pub const LOG_LEVEL: &str = "log-level";
    /// File sink path
    pub const LOG_FILE: &str = "log-file";
}

/// Environment variable naming the configuration root directory.
pub const CONFIG_ROOT_ENV: &str = "KEEL_CONF_ROOT";

/// Extension of derived configuration file names.
pub const CONFIG_SUFFIX: &str = "conf";

/// Extension of derived log file names.
pub const LOG_SUFFIX: &str = "log";

/// Generic option subset, with defaults derived from the program name.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericOptions {
    program_name: String,
    config_roots: Vec<PathBuf>,
}

impl GenericOptions {
    /// Derive the generic options for the program at `program_path`
    /// (normally `argv[0]`).
    pub fn for_program(program_path: impl AsRef<Path>) -> Self {
        let program_path = program_path.as_ref();
        let program_name = program_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| program_path.to_string_lossy().into_owned());
        let config_roots = std::env::var_os(CONFIG_ROOT_ENV)
            .map(|v| config_search_path(&v))
            .unwrap_or_default();

        Self {
            program_name,
            config_roots,
        }
        .or_current_dir()
    }

    /// Override the configuration search path with a single root.
    pub fn with_config_root(self, root: impl Into<PathBuf>) -> Self {
        self.with_config_roots([root.into()])
    }

    /// Override the configuration search path. Earlier roots win.
    pub fn with_config_roots(mut self, roots: impl IntoIterator<Item = PathBuf>) -> Self {
        self.config_roots = roots.into_iter().collect();
        self.or_current_dir()
    }

    fn or_current_dir(mut self) -> Self {
        if self.config_roots.is_empty() {
            self.config_roots.push(PathBuf::from("."));
        }
        self
    }

    /// Program file name.
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Configuration roots in search order. Never empty.
    pub fn config_roots(&self) -> &[PathBuf] {
        &self.config_roots
    }

    /// `<root>/conf/<program>.conf` under the first root holding that file,
    /// or under the first root when none does.
    pub fn default_config_file(&self) -> PathBuf {
        let file = Path::new(&self.program_name).with_extension(CONFIG_SUFFIX);
        let candidate = |root: &PathBuf| root.join("conf").join(&file);
        self.config_roots
            .iter()
            .map(candidate)
            .find(|c| c.is_file())
            .or_else(|| self.config_roots.first().map(candidate))
            .unwrap_or_else(|| candidate(&PathBuf::from(".")))
    }

    /// `./<program>.log`
    pub fn default_log_file(&self) -> PathBuf {
        let file = Path::new(&self.program_name).with_extension(LOG_SUFFIX);
        Path::new(".").join(file)
    }

    /// The generic descriptors in their fixed order.
    pub fn descriptors(&self) -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor::flag(keys::HELP, "Produce help message"),
            OptionDescriptor::flag(keys::VERSION, "Print version string"),
            OptionDescriptor::path(
                keys::CONFIG_FILE,
                self.default_config_file(),
                "Name of a configuration file",
            )
            .command_line_only(),
            OptionDescriptor::integer(
                keys::LOG_LEVEL,
                Level::Info.value(),
                "Log level: NONE=0, FATAL=100, ERROR=200, WARN=300, INFO=400 (default), DEBUG=500",
            ),
            OptionDescriptor::path(keys::LOG_FILE, self.default_log_file(), "Name of a log file"),
        ]
    }
}

/// The full, ordered descriptor set of a program.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSchema {
    program_name: String,
    version: String,
    descriptors: Vec<OptionDescriptor>,
    generic_len: usize,
}

impl OptionSchema {
    /// Compose the generic subset with the program-specific one.
    ///
    /// # Errors
    ///
    /// `Schema` when a key is empty, starts with `-`, is declared twice or
    /// collides with a generic key, when a program-specific option is a
    /// flag (flags are reserved for the generic directives), or when a list
    /// positional is followed by another positional.
    pub fn new(generic: &GenericOptions, specific: Vec<OptionDescriptor>) -> Result<Self> {
        let mut descriptors = generic.descriptors();
        let generic_len = descriptors.len();
        let mut seen: HashSet<String> = descriptors.iter().map(|d| d.key().to_string()).collect();
        let mut open_list: Option<String> = None;

        for descriptor in specific {
            let key = descriptor.key();
            if key.is_empty() || key.starts_with('-') {
                bail!(Schema, "invalid option key '{}'", key);
            }
            if descriptor.value_type() == ValueType::Flag {
                bail!(Schema, "option '{}': flags are reserved for generic directives", key);
            }
            if !seen.insert(key.to_string()) {
                bail!(Schema, "option '{}' is declared more than once", key);
            }
            if descriptor.is_positional() {
                if let Some(list) = &open_list {
                    bail!(Schema, "positional '{}' follows list positional '{}'", key, list);
                }
                if descriptor.is_multi() {
                    open_list = Some(key.to_string());
                }
            }
            descriptors.push(descriptor);
        }

        Ok(Self {
            program_name: generic.program_name().to_string(),
            version: String::new(),
            descriptors,
            generic_len,
        })
    }

    /// Set the version string reported by `--version`.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Program file name the schema was derived for.
    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// `<program> <version>`, or the bare program name without a version.
    pub fn version_line(&self) -> String {
        if self.version.is_empty() {
            self.program_name.clone()
        } else {
            format!("{} {}", self.program_name, self.version)
        }
    }

    /// Every descriptor: generic first, then program-specific.
    pub fn describe(&self) -> &[OptionDescriptor] {
        &self.descriptors
    }

    /// The generic subset.
    pub fn generic(&self) -> &[OptionDescriptor] {
        &self.descriptors[..self.generic_len]
    }

    /// The program-specific subset.
    pub fn specific(&self) -> &[OptionDescriptor] {
        &self.descriptors[self.generic_len..]
    }

    /// Positional descriptors in index order.
    pub fn positionals(&self) -> impl Iterator<Item = &OptionDescriptor> {
        self.specific().iter().filter(|d| d.is_positional())
    }

    /// Descriptor for `key`.
    pub fn find(&self, key: &str) -> Option<&OptionDescriptor> {
        self.descriptors.iter().find(|d| d.key() == key)
    }
}
