//! Policy Attachments Service Layer
//!
//! This module provides the service interface that encapsulates the reconciliation
//! logic for managed policy attachments. The service holds the IAM client and
//! provides the lifecycle operations (create, read, update, delete) that a
//! host drives.

use aws_sdk_iam::Client as IamClient;

use crate::aws::config::{load_sdk_config, AwsOptions};
use crate::aws::iam_client::{AwsIamClient, PolicyAttachmentApi};
use crate::aws::{AwsError, AwsResult};

/// Main service struct that holds the IAM client and provides reconciliation operations
pub struct PolicyAttachmentsService<C = AwsIamClient> {
    pub(crate) client: C,
}

impl PolicyAttachmentsService<AwsIamClient> {
    /// Create a new service instance backed by the AWS SDK
    ///
    /// The configuration is loaded using the default credential provider chain,
    /// with the region and profile overrides from `options` applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if no region could be resolved; the SDK cannot pick an
    /// IAM endpoint without one.
    pub async fn new(options: &AwsOptions) -> AwsResult<Self> {
        let config = load_sdk_config(options).await;
        if config.region().is_none() {
            return Err(AwsError::ConfigError(
                "no region configured; set AWS_REGION, pass --region, or configure a profile"
                    .to_string(),
            ));
        }
        Ok(Self::with_client(AwsIamClient::new(IamClient::new(&config))))
    }
}

impl<C: PolicyAttachmentApi> PolicyAttachmentsService<C> {
    /// Create a service over any [`PolicyAttachmentApi`] implementation
    pub fn with_client(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    // create() and update() are in apply.rs
    // read() is in read.rs
    // delete() is in delete.rs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_with_region_builds_sdk_client() {
        let options = AwsOptions {
            region: Some("us-east-1".to_string()),
            profile: None,
        };
        let service = PolicyAttachmentsService::new(&options)
            .await
            .expect("Failed to create service");
        assert!(format!("{:?}", service.client()).contains("AwsIamClient"));
    }
}
