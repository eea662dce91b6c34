//! Observed state refresh

use log::debug;

use crate::aws::iam_client::{AttachedPolicyPages, PolicyAttachmentApi};
use crate::error::{PolicyAttachmentsError, PolicyAttachmentsResult};
use crate::types::{AttachmentState, Principal};

impl<C: PolicyAttachmentApi> super::service::PolicyAttachmentsService<C> {
    /// List every managed policy currently attached to the principal.
    ///
    /// The result is authoritative: hosts overwrite their record with it. A
    /// failed listing is an error, never an empty set.
    pub async fn read(&self, principal: &Principal) -> PolicyAttachmentsResult<AttachmentState> {
        let policy_arns = self
            .attached_policy_pages(principal)
            .collect_set()
            .await
            .map_err(|source| PolicyAttachmentsError::ListFailure {
                principal: principal.clone(),
                source,
            })?;
        debug!(
            "Observed {} attached policies for {}",
            policy_arns.len(),
            principal
        );
        Ok(AttachmentState::new(principal.clone(), policy_arns))
    }

    /// Lazy page cursor over the principal's attached policies
    pub fn attached_policy_pages<'a>(
        &'a self,
        principal: &'a Principal,
    ) -> AttachedPolicyPages<'a, C> {
        AttachedPolicyPages::new(&self.client, principal)
    }
}
