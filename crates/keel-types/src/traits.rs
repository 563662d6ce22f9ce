//! Core trait definitions for Keel abstractions.

use crate::config::{OptionDescriptor, ResolvedConfig};
use crate::enums::ExitCode;
use crate::errors::Result;

/// An application embedded in the Keel bootstrap.
///
/// Implementers declare their program-specific options and the body to
/// run once configuration is resolved and logging is initialized.
pub trait Program {
    /// Program name used in the start and stop banners.
    fn name(&self) -> &str;

    /// Version string printed by `--version`.
    fn version(&self) -> String;

    /// Program-specific option subset, in declaration order.
    fn specific_options(&self) -> Vec<OptionDescriptor>;

    /// Options bound from bare command-line arguments, in index order.
    ///
    /// They join the schema after [`Program::specific_options`]. Only the
    /// last one may be a list.
    fn program_arguments(&self) -> Vec<OptionDescriptor> {
        Vec::new()
    }

    /// Program body.
    ///
    /// Errors are logged at FATAL by the bootstrap and mapped to their
    /// exit code.
    fn main(&self, config: &ResolvedConfig) -> Result<ExitCode>;
}
