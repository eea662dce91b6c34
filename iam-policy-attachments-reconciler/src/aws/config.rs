//! SDK configuration loading for the IAM client.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use log::debug;
use serde::{Deserialize, Serialize};

/// Overrides applied on top of the default credential provider chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsOptions {
    /// Region to send IAM requests to. IAM is global, but the SDK still needs one.
    pub region: Option<String>,
    /// Named profile from the shared config/credentials files.
    pub profile: Option<String>,
}

/// Load SDK configuration using the standard credential provider chain.
pub(crate) async fn load_sdk_config(options: &AwsOptions) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &options.region {
        debug!("Using region override: {}", region);
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &options.profile {
        debug!("Using profile override: {}", profile);
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_has_no_overrides() {
        let options = AwsOptions::default();
        assert!(options.region.is_none());
        assert!(options.profile.is_none());
    }

    #[tokio::test]
    async fn test_region_override_is_applied() {
        let options = AwsOptions {
            region: Some("eu-west-1".to_string()),
            profile: None,
        };
        let config = load_sdk_config(&options).await;
        assert_eq!(
            config.region().map(ToString::to_string),
            Some("eu-west-1".to_string())
        );
    }
}
