//! This crate reconciles the set of IAM managed policies attached to a single
//! principal (role, user or group) against a desired set:
//! - Configuration validation (principal type, name, policy ARN grammar)
//! - Type dispatch onto the role/user/group flavours of the IAM API
//! - Create/read/update/delete lifecycle with first-error-aborts semantics
//!

pub mod aws;
pub mod commands;
mod error;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod types;
pub mod validation;

// Re-exports for a small, focused public API
pub use aws::config::AwsOptions;
pub use aws::iam_client::{
    AttachedPolicyPage, AttachedPolicyPages, AwsIamClient, PolicyAttachmentApi,
};
pub use aws::{AwsError, AwsResult};
pub use commands::{compute_delta, PolicyAttachmentsService};
pub use error::{PolicyAttachmentsError, PolicyAttachmentsResult};
pub use types::{
    AttachmentDelta, AttachmentState, AttachmentsConfig, DesiredAttachments, PolicyArnSet,
    Principal, PrincipalKind,
};
