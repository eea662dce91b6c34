//! Managed policy ARN grammar

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PolicyAttachmentsError, PolicyAttachmentsResult};

/// `arn:<partition>:iam::<account-id|aws>:policy/<optional path/>name`
/// Path and name segments use IAM's ASCII name characters only.
const POLICY_ARN_PATTERN: &str = concat!(
    r"^arn:aws(?:-[a-z]+)*:iam::(?:[0-9]{12}|aws):policy/",
    r"(?:[A-Za-z0-9_+=,.@-]+/)*[A-Za-z0-9_+=,.@-]+$"
);

fn policy_arn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(POLICY_ARN_PATTERN).expect("policy ARN pattern is valid"))
}

/// Check that `arn` names an IAM managed policy
pub fn validate_policy_arn(arn: &str) -> PolicyAttachmentsResult<()> {
    if policy_arn_regex().is_match(arn) {
        Ok(())
    } else {
        Err(PolicyAttachmentsError::InvalidPolicyArn(arn.to_string()))
    }
}

/// Owning account of a customer managed policy.
///
/// AWS managed policies (`arn:aws:iam::aws:policy/...`) and anything that is
/// not a managed policy ARN yield `None`.
pub fn account_id(arn: &str) -> Option<&str> {
    validate_policy_arn(arn).ok()?;
    arn.split(':').nth(4).filter(|account| *account != "aws")
}
