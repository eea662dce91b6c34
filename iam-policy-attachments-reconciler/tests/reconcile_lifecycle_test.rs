use iam_policy_attachments_reconciler::testing::{ApiCall, FakeIam};
use iam_policy_attachments_reconciler::{
    compute_delta, AttachmentsConfig, AwsError, PolicyArnSet, PolicyAttachmentsError,
    PolicyAttachmentsService, Principal, PrincipalKind,
};

// Sets iterate in lexical order: A, B, C, D.
const ARN_A: &str = "arn:aws:iam::123456789012:policy/alpha";
const ARN_B: &str = "arn:aws:iam::123456789012:policy/bravo";
const ARN_C: &str = "arn:aws:iam::123456789012:policy/team/charlie";
const ARN_D: &str = "arn:aws:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

fn set(items: &[&str]) -> PolicyArnSet {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn full_lifecycle_for_each_principal_kind() {
    for kind in [PrincipalKind::Role, PrincipalKind::User, PrincipalKind::Group] {
        let service = PolicyAttachmentsService::with_client(FakeIam::with_page_size(1));
        let principal = Principal::new(kind, "app");

        // absent -> present
        let created = service
            .create(&principal, &set(&[ARN_A, ARN_B]))
            .await
            .expect("create should succeed");
        assert_eq!(created.id, format!("{kind}/app"));
        assert_eq!(created.policy_arns, set(&[ARN_A, ARN_B]));

        // present -> present with a disjoint set
        let updated = service
            .update(&principal, &created.policy_arns, &set(&[ARN_C, ARN_D]))
            .await
            .expect("update should succeed");
        assert_eq!(updated.policy_arns, set(&[ARN_C, ARN_D]));

        // present -> absent
        service
            .delete(&principal, &updated.policy_arns)
            .await
            .expect("delete should succeed");
        let after = service.read(&principal).await.expect("read should succeed");
        assert!(after.policy_arns.is_empty(), "{kind}: {:?}", after.policy_arns);
    }
}

#[tokio::test]
async fn partial_create_failure_is_reconciled_by_the_next_update() {
    let fake = FakeIam::new();
    fake.fail_attach(ARN_B, AwsError::IamError("ServiceFailure".to_string()));
    let service = PolicyAttachmentsService::with_client(fake);
    let principal = Principal::new(PrincipalKind::Role, "deploy-role");
    let desired = set(&[ARN_A, ARN_B, ARN_C]);

    let err = service.create(&principal, &desired).await.unwrap_err();
    assert_eq!(err.policy_arn(), Some(ARN_B));
    assert!(err.to_string().contains("role/deploy-role"));

    // The host refreshes and sees only what was attached before the failure.
    let observed = service.read(&principal).await.unwrap();
    assert_eq!(observed.policy_arns, set(&[ARN_A]));

    // A later plan/update picks up the remainder once the failure clears.
    let retry_service = {
        let fake = FakeIam::new();
        fake.seed(&principal, &[ARN_A]);
        PolicyAttachmentsService::with_client(fake)
    };
    let delta = compute_delta(&observed.policy_arns, &desired);
    assert!(delta.to_remove.is_empty());
    assert_eq!(delta.to_add, set(&[ARN_B, ARN_C]));

    let state = retry_service
        .update(&principal, &observed.policy_arns, &desired)
        .await
        .unwrap();
    assert_eq!(state.policy_arns, desired);
    assert_eq!(
        retry_service.client().mutations(),
        vec![
            ApiCall::Attach(principal.clone(), ARN_B.to_string()),
            ApiCall::Attach(principal.clone(), ARN_C.to_string()),
        ]
    );
}

#[tokio::test]
async fn unrecognized_type_never_reaches_the_api() {
    let config = AttachmentsConfig {
        name: "deploy".to_string(),
        kind: "bucket".to_string(),
        policy_arns: set(&[ARN_A]),
    };

    let err = config.validate().unwrap_err();
    assert!(err.is_configuration_error());
    assert!(matches!(
        err,
        PolicyAttachmentsError::UnrecognizedPrincipalType(ref t) if t == "bucket"
    ));
}

#[tokio::test]
async fn list_failure_is_not_an_empty_set() {
    let fake = FakeIam::new();
    let principal = Principal::new(PrincipalKind::User, "ci");
    fake.seed(&principal, &[ARN_A]);
    fake.fail_list(AwsError::IamError("AccessDenied".to_string()));
    let service = PolicyAttachmentsService::with_client(fake);

    let err = service
        .update(&principal, &set(&[ARN_A]), &set(&[ARN_A]))
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyAttachmentsError::ListFailure { .. }));
}
