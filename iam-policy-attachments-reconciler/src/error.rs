//! Error types for policy attachment reconciliation

use thiserror::Error;

use crate::aws::AwsError;
use crate::types::Principal;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyAttachmentsError {
    #[error("Unable to attach the policy {arn} to {principal}: {source}")]
    AttachmentFailure {
        arn: String,
        principal: Principal,
        source: AwsError,
    },

    #[error("Unable to detach the policy {arn} from {principal}: {source}")]
    DetachmentFailure {
        arn: String,
        principal: Principal,
        source: AwsError,
    },

    #[error("Error while listing attached policies for {principal}: {source}")]
    ListFailure {
        principal: Principal,
        source: AwsError,
    },

    #[error("Unrecognized principal type '{0}': expected one of role, user, group")]
    UnrecognizedPrincipalType(String),

    #[error("Invalid managed policy ARN: {0}")]
    InvalidPolicyArn(String),

    #[error("Invalid principal name: {0}")]
    InvalidPrincipalName(String),

    #[error("Invalid resource identity '{0}': expected {{type}}/{{name}}")]
    InvalidIdentity(String),
}

impl PolicyAttachmentsError {
    /// True for errors raised while validating configuration, before any API call
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedPrincipalType(_)
                | Self::InvalidPolicyArn(_)
                | Self::InvalidPrincipalName(_)
                | Self::InvalidIdentity(_)
        )
    }

    /// The policy ARN an attach/detach failure refers to
    pub fn policy_arn(&self) -> Option<&str> {
        match self {
            Self::AttachmentFailure { arn, .. } | Self::DetachmentFailure { arn, .. } => {
                Some(arn)
            }
            _ => None,
        }
    }
}

pub type PolicyAttachmentsResult<T> = Result<T, PolicyAttachmentsError>;
