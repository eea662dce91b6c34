//! Core types: principals, policy ARN sets, the declarative configuration and the recorded state.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PolicyAttachmentsError, PolicyAttachmentsResult};
use crate::validation::{validate_policy_arn, validate_principal_name};

/// Set of managed policy ARNs. Ordered so logs and persisted state are deterministic.
pub type PolicyArnSet = BTreeSet<String>;

/// Kind of IAM principal a managed policy can be attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    Role,
    User,
    Group,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Role => "role",
            PrincipalKind::User => "user",
            PrincipalKind::Group => "group",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalKind {
    type Err = PolicyAttachmentsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "role" => Ok(PrincipalKind::Role),
            "user" => Ok(PrincipalKind::User),
            "group" => Ok(PrincipalKind::Group),
            other => Err(PolicyAttachmentsError::UnrecognizedPrincipalType(
                other.to_string(),
            )),
        }
    }
}

/// An IAM role, user or group. Both fields are fixed once the resource exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "type")]
    pub kind: PrincipalKind,
    pub name: String,
}

impl Principal {
    pub fn new(kind: PrincipalKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Canonical resource identity, `{type}/{name}`
    pub fn id(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }

    /// Parse a `{type}/{name}` identity back into a principal.
    ///
    /// Only the first `/` separates the kind; IAM names never contain one.
    pub fn from_id(id: &str) -> PolicyAttachmentsResult<Self> {
        let (kind, name) = id
            .split_once('/')
            .ok_or_else(|| PolicyAttachmentsError::InvalidIdentity(id.to_string()))?;
        let kind = kind.parse::<PrincipalKind>()?;
        validate_principal_name(name)?;
        Ok(Self::new(kind, name))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Declarative configuration surface as supplied by a host.
///
/// `kind` stays a raw string here so an unknown value is reported as a
/// configuration error by [`AttachmentsConfig::validate`] instead of a
/// deserialization failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentsConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub policy_arns: PolicyArnSet,
}

impl AttachmentsConfig {
    /// Validate every field before any API call is attempted
    pub fn validate(&self) -> PolicyAttachmentsResult<DesiredAttachments> {
        let kind = self.kind.parse::<PrincipalKind>()?;
        validate_principal_name(&self.name)?;
        for arn in &self.policy_arns {
            validate_policy_arn(arn)?;
        }
        Ok(DesiredAttachments {
            principal: Principal::new(kind, self.name.clone()),
            policy_arns: self.policy_arns.clone(),
        })
    }
}

/// Validated desired state for one principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredAttachments {
    pub principal: Principal,
    pub policy_arns: PolicyArnSet,
}

/// Record a host persists for a present resource. Always holds the observed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentState {
    pub id: String,
    #[serde(flatten)]
    pub principal: Principal,
    pub policy_arns: PolicyArnSet,
}

impl AttachmentState {
    pub fn new(principal: Principal, policy_arns: PolicyArnSet) -> Self {
        Self {
            id: principal.id(),
            principal,
            policy_arns,
        }
    }
}

/// Attach/detach work needed to move from one set to another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentDelta {
    pub to_remove: PolicyArnSet,
    pub to_add: PolicyArnSet,
}

impl AttachmentDelta {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}
