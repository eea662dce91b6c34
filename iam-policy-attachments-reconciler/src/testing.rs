//! In-memory IAM double for exercising the reconciler without AWS.
//!
//! Available to this crate's tests and, through the `test-util` feature, to
//! integration tests and downstream crates.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::aws::iam_client::{AttachedPolicyPage, PolicyAttachmentApi};
use crate::aws::{AwsError, AwsResult};
use crate::types::{PolicyArnSet, Principal};

/// A mutating call observed by [`FakeIam`], recorded before it succeeds or fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    Attach(Principal, String),
    Detach(Principal, String),
}

#[derive(Default)]
struct FakeState {
    attached: HashMap<Principal, PolicyArnSet>,
    mutations: Vec<ApiCall>,
    list_calls: usize,
    attach_failures: HashMap<String, AwsError>,
    detach_failures: HashMap<String, AwsError>,
    list_failure: Option<AwsError>,
}

/// Fake account that tracks attachments per principal
pub struct FakeIam {
    state: Mutex<FakeState>,
    page_size: usize,
}

impl Default for FakeIam {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeIam {
    /// IAM's default `MaxItems` for list calls
    pub const DEFAULT_PAGE_SIZE: usize = 100;

    pub fn new() -> Self {
        Self::with_page_size(Self::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            page_size: page_size.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread must not hide the recorded calls from the others
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Mark policies as already attached, bypassing the call log
    pub fn seed(&self, principal: &Principal, arns: &[&str]) {
        self.lock()
            .attached
            .entry(principal.clone())
            .or_default()
            .extend(arns.iter().map(|s| s.to_string()));
    }

    pub fn fail_attach(&self, arn: &str, error: AwsError) {
        self.lock().attach_failures.insert(arn.to_string(), error);
    }

    pub fn fail_detach(&self, arn: &str, error: AwsError) {
        self.lock().detach_failures.insert(arn.to_string(), error);
    }

    pub fn fail_list(&self, error: AwsError) {
        self.lock().list_failure = Some(error);
    }

    /// Policies currently attached to `principal`
    pub fn attached(&self, principal: &Principal) -> PolicyArnSet {
        self.lock()
            .attached
            .get(principal)
            .cloned()
            .unwrap_or_default()
    }

    /// Every attach/detach attempted so far, in order
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.lock().mutations.clone()
    }

    /// Number of list pages requested so far
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }
}

#[async_trait]
impl PolicyAttachmentApi for FakeIam {
    async fn attach_policy(&self, principal: &Principal, policy_arn: &str) -> AwsResult<()> {
        let mut state = self.lock();
        state
            .mutations
            .push(ApiCall::Attach(principal.clone(), policy_arn.to_string()));
        if let Some(error) = state.attach_failures.get(policy_arn) {
            return Err(error.clone());
        }
        state
            .attached
            .entry(principal.clone())
            .or_default()
            .insert(policy_arn.to_string());
        Ok(())
    }

    async fn detach_policy(&self, principal: &Principal, policy_arn: &str) -> AwsResult<()> {
        let mut state = self.lock();
        state
            .mutations
            .push(ApiCall::Detach(principal.clone(), policy_arn.to_string()));
        if let Some(error) = state.detach_failures.get(policy_arn) {
            return Err(error.clone());
        }
        let removed = state
            .attached
            .get_mut(principal)
            .is_some_and(|arns| arns.remove(policy_arn));
        if removed {
            Ok(())
        } else {
            Err(AwsError::IamError(format!(
                "NoSuchEntity: policy {policy_arn} is not attached to {principal}"
            )))
        }
    }

    async fn list_attached_policies_page(
        &self,
        principal: &Principal,
        marker: Option<String>,
    ) -> AwsResult<AttachedPolicyPage> {
        let mut state = self.lock();
        state.list_calls += 1;
        if let Some(error) = &state.list_failure {
            return Err(error.clone());
        }

        let start = match marker {
            Some(marker) => marker
                .parse::<usize>()
                .map_err(|_| AwsError::IamError(format!("InvalidInput: bad marker {marker}")))?,
            None => 0,
        };
        let all: Vec<String> = state
            .attached
            .get(principal)
            .map(|arns| arns.iter().cloned().collect())
            .unwrap_or_default();
        let end = (start + self.page_size).min(all.len());

        Ok(AttachedPolicyPage {
            policy_arns: all.get(start..end).map(<[String]>::to_vec).unwrap_or_default(),
            next_marker: (end < all.len()).then(|| end.to_string()),
        })
    }
}
