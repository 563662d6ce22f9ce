//! The probe program: reads every option type and reports what it got.

use anyhow::Context;
use keel_core::{args, Logger};
use keel_types::{ExitCode, KeelError, OptionDescriptor, Program, ResolvedConfig, Result};
use std::fs;
use std::io;

/// Reference program exercising each option type.
#[derive(Debug, Default)]
pub struct ProbeProgram;

impl Program for ProbeProgram {
    fn name(&self) -> &str {
        "keel-probe"
    }

    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    fn specific_options(&self) -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor::string("string-option", "", "An example string option"),
            OptionDescriptor::integer("long-long-option", 0, "An example long long option"),
            OptionDescriptor::float("double-option", 0.0, "An example double option"),
            OptionDescriptor::integer_list("int-vector-option", vec![], "An example vector option"),
            OptionDescriptor::string_list("names", vec![], "Names to greet"),
            OptionDescriptor::path("input-file", "", "File whose lines are counted"),
            OptionDescriptor::string("dump-format", "", "Print the resolved configuration (json)"),
        ]
    }

    fn main(&self, config: &ResolvedConfig) -> Result<ExitCode> {
        probe(config).map_err(into_keel_error)
    }
}

fn probe(config: &ResolvedConfig) -> anyhow::Result<ExitCode> {
    let logger = Logger::get("ProbeProgram");
    logger.info("Entering main");
    logger.info("#");

    logger
        .info_line()
        .append("String option value: ")
        .append(config.string("string-option")?);
    logger.info_fmt(
        "Long long option value: %d",
        &args![config.integer("long-long-option")?],
    );
    logger.debug_fmt(
        "Double option value: %.4f",
        &args![config.float("double-option")?],
    );

    let values = config.integers("int-vector-option")?;
    let sum: i64 = values.iter().sum();
    logger.info(format!("Sum of {} vector values: {}", values.len(), sum));

    for name in config.strings("names")? {
        logger.info_fmt("Hello, %s", &args![name]);
    }

    let input = config.path("input-file")?;
    if !input.as_os_str().is_empty() {
        let bytes = match fs::read(input) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                logger.error(format!("Input file {} does not exist", input.display()));
                return Ok(ExitCode::NoInput);
            }
            Err(source) => {
                return Err(KeelError::Io {
                    path: input.to_path_buf(),
                    source,
                }
                .into())
            }
        };
        let Ok(contents) = String::from_utf8(bytes) else {
            logger.error(format!("Input file {} is not UTF-8 text", input.display()));
            return Ok(ExitCode::DataErr);
        };
        logger.info(format!(
            "Input file {} holds {} lines",
            input.display(),
            contents.lines().count()
        ));
    }

    match config.string("dump-format")? {
        "" => {}
        "json" => {
            let json = serde_json::to_string_pretty(config).context("serializing configuration")?;
            println!("{}", json);
        }
        other => anyhow::bail!("unsupported dump format '{}'", other),
    }

    tracing::debug!(sum, "probe finished");
    logger.info("Exiting main");
    Ok(ExitCode::Ok)
}

/// Keep typed errors so they map to their exit codes.
fn into_keel_error(err: anyhow::Error) -> KeelError {
    match err.downcast::<KeelError>() {
        Ok(err) => err,
        Err(other) => KeelError::Other(format!("{:#}", other)),
    }
}
