use std::path::PathBuf;

use iam_policy_attachments_reconciler::PolicyAttachmentsError;
use thiserror::Error;

/// Exit code for failed AWS calls and I/O
pub(crate) const EXIT_FAILURE: u8 = 1;
/// Exit code for invalid configuration, reported before any AWS call
pub(crate) const EXIT_CONFIGURATION: u8 = 2;

#[derive(Error, Debug)]
pub(crate) enum CliError {
    #[error("Invalid configuration file {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("No recorded state for {id} in {path}")]
    UnknownResource { id: String, path: PathBuf },
}

/// Map an error chain to the process exit code
pub(crate) fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<PolicyAttachmentsError>() {
        return if e.is_configuration_error() {
            EXIT_CONFIGURATION
        } else {
            EXIT_FAILURE
        };
    }
    if err.downcast_ref::<CliError>().is_some() {
        return EXIT_CONFIGURATION;
    }
    EXIT_FAILURE
}
