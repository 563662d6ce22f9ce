//! Program bootstrap: resolution, logging initialization and audit.

use crate::log::{LogContext, Logger};
use crate::resolver::{resolve, Resolution};
use crate::schema::{keys, GenericOptions, OptionSchema, CONFIG_ROOT_ENV};
use keel_types::{
    ExitCode, KeelError, Level, OptionDescriptor, Program, ResolvedConfig, ResolvedValue, Result,
};
use std::ffi::OsString;

const BANNER: &str = "##########################################################";

/// Drives a program from its raw argument vector to a resolved configuration.
#[derive(Debug)]
pub struct Bootstrapper {
    context: LogContext,
    schema: OptionSchema,
    logger: Logger,
}

impl Bootstrapper {
    /// Bootstrap `schema` against `context`; `version` is what `--version`
    /// prints after the program name.
    pub fn new(context: LogContext, schema: OptionSchema, version: impl Into<String>) -> Self {
        let schema = schema.with_version(version);
        let logger = context.logger(schema.program_name());
        Self {
            context,
            schema,
            logger,
        }
    }

    /// The composed option schema.
    pub fn schema(&self) -> &OptionSchema {
        &self.schema
    }

    /// The logging context configured by this bootstrap.
    pub fn context(&self) -> &LogContext {
        &self.context
    }

    /// The logger banners and the audit are written through.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Resolve `argv`, initialize logging and emit the start header and the
    /// audit block. Never exits the process.
    pub fn prepare<I, T>(&self, argv: I) -> Result<Resolution>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let resolution = resolve(argv, &self.schema)?;
        if let Resolution::Resolved(config) = &resolution {
            self.init_logging(config)?;
            self.log_header();
            self.audit(config);
            self.log_environment();
        }
        Ok(resolution)
    }

    /// Like [`Bootstrapper::prepare`], but an early exit prints its output
    /// and terminates the process with its code.
    pub fn setup<I, T>(&self, argv: I) -> Result<ResolvedConfig>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match self.prepare(argv)? {
            Resolution::Resolved(config) => Ok(config),
            Resolution::EarlyExit { code, output } => {
                println!("{}", output);
                std::process::exit(code.code())
            }
        }
    }

    fn init_logging(&self, config: &ResolvedConfig) -> Result<()> {
        let level = Level::from_value(config.integer(keys::LOG_LEVEL)?)?;
        self.context.set_threshold(level);

        let log_file = config.path(keys::LOG_FILE)?;
        if let Err(err) = self.context.set_file_sink(Some(log_file)) {
            self.logger.error(err.to_string());
        }
        tracing::debug!(%level, log_file = %log_file.display(), "logging initialized");
        Ok(())
    }

    fn log_header(&self) {
        let log = &self.logger;
        log.info(BANNER);
        log.info(BANNER);
        log.info("#");
        log.info(format!("#  Program:  {} starts ", self.schema.program_name()));
        log.info("#");
    }

    /// Write one `key = value` INFO line per resolved key, framed by a banner.
    pub fn audit(&self, config: &ResolvedConfig) {
        let log = &self.logger;
        log.info(BANNER);
        log.info("#");
        log.info("# List of all program options");
        log.info("# ---------------------------");
        log.info("#");
        for (key, value) in config.iter() {
            match render_value(value) {
                Some(text) => log.info(format!("{} = {}", key, text)),
                None => log.warn(format!(
                    "Option {} of type {} is not supported in logging",
                    key,
                    value.value_type().name()
                )),
            }
        }
        log.info("#");
    }

    fn log_environment(&self) {
        let log = &self.logger;
        log.debug(BANNER);
        log.debug("#");
        log.debug("# Environment of the run");
        log.debug("# ---------------------------");
        log.debug("#");
        let root = std::env::var(CONFIG_ROOT_ENV).unwrap_or_default();
        log.debug(format!("{}: {}", CONFIG_ROOT_ENV, root));
        if let Some(ResolvedValue::Path(path)) =
            self.schema.find(keys::CONFIG_FILE).and_then(|d| d.default_value())
        {
            log.debug(format!("Default configuration file: {}", path.display()));
        }
    }

    fn log_footer(&self, code: ExitCode) {
        let log = &self.logger;
        log.debug(format!("# Exit code: {}", code.code()));
        log.info(BANNER);
        log.info("#");
        log.info(format!("#  Program:  {} stops ", self.schema.program_name()));
        log.info("#");
        log.info(BANNER);
        log.info(BANNER);
    }
}

/// Audit text of a value, `None` when it has no faithful rendering.
pub fn render_value(value: &ResolvedValue) -> Option<String> {
    match value {
        ResolvedValue::Path(path) => path.to_str().map(str::to_string),
        other => Some(other.to_string()),
    }
}

/// Run `program` from `argv` to completion and return its exit code.
///
/// Early exits print their output to standard output and return their code
/// without running the program body. Setup and runtime errors are logged at
/// FATAL and mapped to [`KeelError::exit_code`].
pub fn run_program<P, I, T>(program: &P, argv: I, context: LogContext) -> ExitCode
where
    P: Program + ?Sized,
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    let program_path = argv
        .first()
        .cloned()
        .unwrap_or_else(|| OsString::from(program.name()));

    let generic = GenericOptions::for_program(&program_path);
    let mut specific = program.specific_options();
    specific.extend(program.program_arguments().into_iter().map(OptionDescriptor::positional));
    let schema = match OptionSchema::new(&generic, specific) {
        Ok(schema) => schema,
        Err(err) => return report(&context.logger(program.name()), &err),
    };
    let bootstrap = Bootstrapper::new(context, schema, program.version());

    let config = match bootstrap.prepare(argv) {
        Ok(Resolution::Resolved(config)) => config,
        Ok(Resolution::EarlyExit { code, output }) => {
            println!("{}", output);
            return code;
        }
        Err(err) => return report(bootstrap.logger(), &err),
    };

    let code = match program.main(&config) {
        Ok(code) => code,
        Err(err) => report(bootstrap.logger(), &err),
    };
    bootstrap.log_footer(code);
    code
}

fn report(logger: &Logger, err: &KeelError) -> ExitCode {
    logger.fatal("# ");
    logger.fatal(format!("# {}", err));
    logger.fatal("# ");
    err.exit_code()
}
