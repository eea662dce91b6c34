//! Delete logic for managed policy attachments

use log::{info, trace, warn};

use crate::aws::iam_client::PolicyAttachmentApi;
use crate::error::{PolicyAttachmentsError, PolicyAttachmentsResult};
use crate::types::{PolicyArnSet, Principal};

impl<C: PolicyAttachmentApi> super::service::PolicyAttachmentsService<C> {
    /// Detach every policy in `current`.
    ///
    /// Stops at the first failure; later policies stay attached.
    pub async fn delete(
        &self,
        principal: &Principal,
        current: &PolicyArnSet,
    ) -> PolicyAttachmentsResult<()> {
        info!(
            "Deleting attachments for {}: {} policies",
            principal,
            current.len()
        );
        self.detach_all(principal, current).await
    }

    pub(crate) async fn detach_all(
        &self,
        principal: &Principal,
        arns: &PolicyArnSet,
    ) -> PolicyAttachmentsResult<()> {
        for arn in arns {
            trace!("Detaching the policy {}", arn);
            if let Err(source) = self.client.detach_policy(principal, arn).await {
                warn!("Detaching {} from {} failed, aborting", arn, principal);
                return Err(PolicyAttachmentsError::DetachmentFailure {
                    arn: arn.clone(),
                    principal: principal.clone(),
                    source,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::aws::AwsError;
    use crate::commands::PolicyAttachmentsService;
    use crate::testing::{ApiCall, FakeIam};
    use crate::types::{PolicyArnSet, Principal, PrincipalKind};
    use crate::PolicyAttachmentsError;

    const ARN_A: &str = "arn:aws:iam::aws:policy/A";
    const ARN_B: &str = "arn:aws:iam::aws:policy/B";
    const ARN_C: &str = "arn:aws:iam::aws:policy/C";

    fn set(items: &[&str]) -> PolicyArnSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_delete_then_read_is_empty() {
        let fake = FakeIam::new();
        let principal = Principal::new(PrincipalKind::User, "ci");
        fake.seed(&principal, &[ARN_A, ARN_B]);
        let service = PolicyAttachmentsService::with_client(fake);

        service
            .delete(&principal, &set(&[ARN_A, ARN_B]))
            .await
            .unwrap();

        let state = service.read(&principal).await.unwrap();
        assert!(state.policy_arns.is_empty());
    }

    #[tokio::test]
    async fn test_delete_stops_at_first_failure() {
        let fake = FakeIam::new();
        let principal = Principal::new(PrincipalKind::Role, "deploy-role");
        fake.seed(&principal, &[ARN_A, ARN_B, ARN_C]);
        fake.fail_detach(ARN_B, AwsError::IamError("Throttling".to_string()));
        let service = PolicyAttachmentsService::with_client(fake);

        let err = service
            .delete(&principal, &set(&[ARN_A, ARN_B, ARN_C]))
            .await
            .unwrap_err();

        assert_eq!(err.policy_arn(), Some(ARN_B));
        assert!(matches!(
            err,
            PolicyAttachmentsError::DetachmentFailure { .. }
        ));
        assert_eq!(
            service.client().mutations(),
            vec![
                ApiCall::Detach(principal.clone(), ARN_A.to_string()),
                ApiCall::Detach(principal.clone(), ARN_B.to_string()),
            ]
        );
        assert_eq!(service.client().attached(&principal), set(&[ARN_B, ARN_C]));
    }
}
