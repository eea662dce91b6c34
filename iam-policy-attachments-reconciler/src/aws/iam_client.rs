//! AWS IAM client wrapper for managed policy attachment operations
//!
//! [`PolicyAttachmentApi`] is the seam the reconciler talks to. [`AwsIamClient`]
//! implements it over the SDK and dispatches on [`PrincipalKind`] to the role,
//! user or group flavour of each IAM call.

use async_trait::async_trait;
use aws_sdk_iam::error::DisplayErrorContext;
use aws_sdk_iam::types::AttachedPolicy;
use aws_sdk_iam::Client as IamClient;
use log::{debug, warn};

use crate::aws::{AwsError, AwsResult};
use crate::types::{PolicyArnSet, Principal, PrincipalKind};

/// One page of a List-Attached-*-Policies response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedPolicyPage {
    pub policy_arns: Vec<String>,
    /// Continuation marker, present only when the listing was truncated
    pub next_marker: Option<String>,
}

/// IAM operations needed to reconcile managed policy attachments
#[async_trait]
pub trait PolicyAttachmentApi: Send + Sync {
    /// Attach a managed policy to the principal
    async fn attach_policy(&self, principal: &Principal, policy_arn: &str) -> AwsResult<()>;

    /// Detach a managed policy from the principal
    async fn detach_policy(&self, principal: &Principal, policy_arn: &str) -> AwsResult<()>;

    /// Fetch a single page of attached managed policies, starting at `marker`
    async fn list_attached_policies_page(
        &self,
        principal: &Principal,
        marker: Option<String>,
    ) -> AwsResult<AttachedPolicyPage>;
}

/// Lazy cursor over every page of a principal's attached policies.
///
/// Pages are fetched on demand by [`next_page`](Self::next_page).
/// [`restart`](Self::restart) rewinds to the first page so the listing can be
/// replayed against fresh account state.
pub struct AttachedPolicyPages<'a, C: ?Sized> {
    client: &'a C,
    principal: &'a Principal,
    marker: Option<String>,
    exhausted: bool,
    pages_fetched: usize,
}

impl<'a, C: PolicyAttachmentApi + ?Sized> AttachedPolicyPages<'a, C> {
    pub fn new(client: &'a C, principal: &'a Principal) -> Self {
        Self {
            client,
            principal,
            marker: None,
            exhausted: false,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, or `None` once the listing is complete
    pub async fn next_page(&mut self) -> AwsResult<Option<Vec<String>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .client
            .list_attached_policies_page(self.principal, self.marker.take())
            .await?;
        self.pages_fetched += 1;
        debug!(
            "Fetched page {} of attached policies for {}: {} policies",
            self.pages_fetched,
            self.principal,
            page.policy_arns.len()
        );

        match page.next_marker {
            Some(marker) if !marker.is_empty() => self.marker = Some(marker),
            _ => self.exhausted = true,
        }

        Ok(Some(page.policy_arns))
    }

    /// Rewind to the first page
    pub fn restart(&mut self) {
        self.marker = None;
        self.exhausted = false;
        self.pages_fetched = 0;
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Drain the remaining pages into a set
    pub async fn collect_set(mut self) -> AwsResult<PolicyArnSet> {
        let mut arns = PolicyArnSet::new();
        while let Some(page) = self.next_page().await? {
            arns.extend(page);
        }
        Ok(arns)
    }
}

/// SDK-backed implementation of [`PolicyAttachmentApi`]
#[derive(Debug, Clone)]
pub struct AwsIamClient {
    client: IamClient,
}

impl AwsIamClient {
    pub fn new(client: IamClient) -> Self {
        Self { client }
    }

    pub async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> AwsResult<()> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "AttachRolePolicy failed for role '{role_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    pub async fn attach_user_policy(&self, user_name: &str, policy_arn: &str) -> AwsResult<()> {
        self.client
            .attach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "AttachUserPolicy failed for user '{user_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    pub async fn attach_group_policy(&self, group_name: &str, policy_arn: &str) -> AwsResult<()> {
        self.client
            .attach_group_policy()
            .group_name(group_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "AttachGroupPolicy failed for group '{group_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    pub async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> AwsResult<()> {
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "DetachRolePolicy failed for role '{role_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    pub async fn detach_user_policy(&self, user_name: &str, policy_arn: &str) -> AwsResult<()> {
        self.client
            .detach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "DetachUserPolicy failed for user '{user_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    pub async fn detach_group_policy(&self, group_name: &str, policy_arn: &str) -> AwsResult<()> {
        self.client
            .detach_group_policy()
            .group_name(group_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "DetachGroupPolicy failed for group '{group_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(())
    }

    async fn list_attached_role_policies(
        &self,
        role_name: &str,
        marker: Option<String>,
    ) -> AwsResult<AttachedPolicyPage> {
        let response = self
            .client
            .list_attached_role_policies()
            .role_name(role_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "ListAttachedRolePolicies failed for role '{role_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(to_page(
            response.attached_policies(),
            response.is_truncated(),
            response.marker(),
        ))
    }

    async fn list_attached_user_policies(
        &self,
        user_name: &str,
        marker: Option<String>,
    ) -> AwsResult<AttachedPolicyPage> {
        let response = self
            .client
            .list_attached_user_policies()
            .user_name(user_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "ListAttachedUserPolicies failed for user '{user_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(to_page(
            response.attached_policies(),
            response.is_truncated(),
            response.marker(),
        ))
    }

    async fn list_attached_group_policies(
        &self,
        group_name: &str,
        marker: Option<String>,
    ) -> AwsResult<AttachedPolicyPage> {
        let response = self
            .client
            .list_attached_group_policies()
            .group_name(group_name)
            .set_marker(marker)
            .send()
            .await
            .map_err(|e| {
                AwsError::IamError(format!(
                    "ListAttachedGroupPolicies failed for group '{group_name}': {}",
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(to_page(
            response.attached_policies(),
            response.is_truncated(),
            response.marker(),
        ))
    }
}

#[async_trait]
impl PolicyAttachmentApi for AwsIamClient {
    async fn attach_policy(&self, principal: &Principal, policy_arn: &str) -> AwsResult<()> {
        match principal.kind {
            PrincipalKind::Role => self.attach_role_policy(&principal.name, policy_arn).await,
            PrincipalKind::User => self.attach_user_policy(&principal.name, policy_arn).await,
            PrincipalKind::Group => self.attach_group_policy(&principal.name, policy_arn).await,
        }
    }

    async fn detach_policy(&self, principal: &Principal, policy_arn: &str) -> AwsResult<()> {
        match principal.kind {
            PrincipalKind::Role => self.detach_role_policy(&principal.name, policy_arn).await,
            PrincipalKind::User => self.detach_user_policy(&principal.name, policy_arn).await,
            PrincipalKind::Group => self.detach_group_policy(&principal.name, policy_arn).await,
        }
    }

    async fn list_attached_policies_page(
        &self,
        principal: &Principal,
        marker: Option<String>,
    ) -> AwsResult<AttachedPolicyPage> {
        match principal.kind {
            PrincipalKind::Role => {
                self.list_attached_role_policies(&principal.name, marker)
                    .await
            }
            PrincipalKind::User => {
                self.list_attached_user_policies(&principal.name, marker)
                    .await
            }
            PrincipalKind::Group => {
                self.list_attached_group_policies(&principal.name, marker)
                    .await
            }
        }
    }
}

/// Flatten an SDK response page into ARNs and a continuation marker
fn to_page(
    attached: &[AttachedPolicy],
    is_truncated: bool,
    marker: Option<&str>,
) -> AttachedPolicyPage {
    let policy_arns = attached
        .iter()
        .filter_map(|p| p.policy_arn().map(str::to_string))
        .collect();

    let next_marker = if is_truncated {
        if marker.is_none() {
            warn!("IAM reported a truncated listing without a continuation marker");
        }
        marker.map(str::to_string)
    } else {
        None
    };

    AttachedPolicyPage {
        policy_arns,
        next_marker,
    }
}
