//! Create and update logic for managed policy attachments

use log::{debug, info, trace, warn};

use super::plan::compute_delta;
use crate::aws::iam_client::PolicyAttachmentApi;
use crate::error::{PolicyAttachmentsError, PolicyAttachmentsResult};
use crate::types::{AttachmentState, PolicyArnSet, Principal};

impl<C: PolicyAttachmentApi> super::service::PolicyAttachmentsService<C> {
    /// Attach every desired policy, then read back the observed state.
    ///
    /// Stops at the first failed attachment. Policies attached before the
    /// failure stay attached.
    pub async fn create(
        &self,
        principal: &Principal,
        desired: &PolicyArnSet,
    ) -> PolicyAttachmentsResult<AttachmentState> {
        info!(
            "Creating attachments for {}: {} policies",
            principal,
            desired.len()
        );
        self.attach_all(principal, desired).await?;
        self.read(principal).await
    }

    /// Detach policies dropped from the set, attach new ones, then read back.
    ///
    /// All detachments run before any attachment. The first failure in either
    /// phase aborts the update without compensating for work already done. The
    /// trailing read happens whether or not anything changed.
    pub async fn update(
        &self,
        principal: &Principal,
        old: &PolicyArnSet,
        new: &PolicyArnSet,
    ) -> PolicyAttachmentsResult<AttachmentState> {
        let delta = compute_delta(old, new);
        if delta.is_empty() {
            debug!("No attachment changes for {}", principal);
        } else {
            info!(
                "Updating attachments for {}: detaching {}, attaching {}",
                principal,
                delta.to_remove.len(),
                delta.to_add.len()
            );
            self.detach_all(principal, &delta.to_remove).await?;
            self.attach_all(principal, &delta.to_add).await?;
        }
        self.read(principal).await
    }

    pub(crate) async fn attach_all(
        &self,
        principal: &Principal,
        arns: &PolicyArnSet,
    ) -> PolicyAttachmentsResult<()> {
        for arn in arns {
            trace!("Managing the policy {}", arn);
            if let Err(source) = self.client.attach_policy(principal, arn).await {
                warn!("Attaching {} to {} failed, aborting", arn, principal);
                return Err(PolicyAttachmentsError::AttachmentFailure {
                    arn: arn.clone(),
                    principal: principal.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}
