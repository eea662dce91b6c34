//! AWS SDK integration: IAM client wrapper, attach/detach/list dispatch, SDK configuration.

pub(crate) mod config;
pub mod iam_client;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AwsError {
    #[error("AWS configuration error: {0}")]
    ConfigError(String),
    #[error("IAM client error: {0}")]
    IamError(String),
}

pub type AwsResult<T> = Result<T, AwsError>;
