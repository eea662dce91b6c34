//! Configuration validation for principal names and managed policy ARNs (pure Rust)

pub mod arn;

pub use arn::{account_id, validate_policy_arn};

use crate::error::{PolicyAttachmentsError, PolicyAttachmentsResult};

/// Longest name IAM accepts for any principal kind (groups and roles share the limit in practice)
const MAX_PRINCIPAL_NAME_LEN: usize = 128;

/// Validate a role, user or group name against IAM's name character set
pub fn validate_principal_name(name: &str) -> PolicyAttachmentsResult<()> {
    if name.is_empty() {
        return Err(PolicyAttachmentsError::InvalidPrincipalName(
            "name must not be empty".to_string(),
        ));
    }
    if name.len() > MAX_PRINCIPAL_NAME_LEN {
        return Err(PolicyAttachmentsError::InvalidPrincipalName(format!(
            "'{name}' is longer than {MAX_PRINCIPAL_NAME_LEN} characters"
        )));
    }
    if let Some(c) = name.chars().find(|c| !is_iam_name_char(*c)) {
        return Err(PolicyAttachmentsError::InvalidPrincipalName(format!(
            "'{name}' contains invalid character '{c}'"
        )));
    }
    Ok(())
}

fn is_iam_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '=' | ',' | '.' | '@' | '_' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_principal_names() {
        for name in ["deploy-role", "ci_user", "team+ops@example.com", "a.b,c=d"] {
            assert!(validate_principal_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_principal_names() {
        assert!(validate_principal_name("").is_err());
        assert!(validate_principal_name("has space").is_err());
        assert!(validate_principal_name("path/name").is_err());
        assert!(validate_principal_name(&"x".repeat(129)).is_err());
        assert!(validate_principal_name(&"x".repeat(128)).is_ok());
    }
}
