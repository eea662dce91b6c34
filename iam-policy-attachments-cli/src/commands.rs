//! Subcommand implementations: plan, apply, refresh, destroy

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use iam_policy_attachments_reconciler::validation::account_id;
use iam_policy_attachments_reconciler::{
    compute_delta, AttachmentDelta, AttachmentState, AttachmentsConfig, DesiredAttachments,
    PolicyArnSet, PolicyAttachmentApi, PolicyAttachmentsService, Principal,
};
use log::{info, warn};

use crate::error::CliError;
use crate::state::StateFile;
use crate::{ResourceArgs, Settings};

impl ResourceArgs {
    /// Build the declarative configuration from the file or the flags
    fn to_config(&self) -> Result<AttachmentsConfig> {
        if let Some(path) = &self.config {
            return load_config(path);
        }
        Ok(AttachmentsConfig {
            name: self.name.clone().unwrap_or_default(),
            kind: self.kind.clone().unwrap_or_default(),
            policy_arns: self.policy_arns.iter().cloned().collect(),
        })
    }

    fn desired(&self) -> Result<DesiredAttachments> {
        let desired = self
            .to_config()?
            .validate()
            .context("Invalid resource configuration")?;
        Ok(desired)
    }
}

fn load_config(path: &Path) -> Result<AttachmentsConfig> {
    let invalid = |message: String| CliError::InvalidConfig {
        path: path.to_path_buf(),
        message,
    };
    let content = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let config = serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    Ok(config)
}

/// Print the plan for `principal` to stderr
fn print_delta(action: &str, principal: &Principal, delta: &AttachmentDelta) {
    eprintln!("Plan ({action}) for {principal}:");
    if delta.is_empty() {
        eprintln!("  No changes.");
        return;
    }
    for arn in &delta.to_remove {
        eprintln!("  - {arn} ({})", owner_label(arn));
    }
    for arn in &delta.to_add {
        eprintln!("  + {arn} ({})", owner_label(arn));
    }
    eprintln!(
        "  {} to detach, {} to attach",
        delta.to_remove.len(),
        delta.to_add.len()
    );
}

fn owner_label(arn: &str) -> String {
    match account_id(arn) {
        Some(account) => format!("account {account}"),
        None => "AWS managed".to_string(),
    }
}

fn create_or_update(is_new: bool) -> &'static str {
    if is_new {
        "create"
    } else {
        "update"
    }
}

/// Ask before mutating IAM. Refuses outside a TTY unless `yes` was given.
fn confirm(yes: bool, prompt: &str) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !atty::is(atty::Stream::Stdin) || !atty::is(atty::Stream::Stderr) {
        eprintln!(
            "Refusing to modify IAM attachments without confirmation: run interactively in a TTY or pass --yes"
        );
        return Ok(false);
    }

    eprint!("{prompt} [y/N] ");
    io::stderr().flush().context("Failed to flush prompt")?;
    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn print_state(state: &AttachmentState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Failed to serialize state")?;
    println!("{json}");
    Ok(())
}

fn recorded(state: &StateFile, principal: &Principal, path: &Path) -> Result<PolicyArnSet> {
    let id = principal.id();
    state
        .get(&id)
        .map(|record| record.policy_arns.clone())
        .ok_or_else(|| {
            CliError::UnknownResource {
                id,
                path: path.to_path_buf(),
            }
            .into()
        })
}

/// Print the plan for `desired` against its record, if any
fn show_plan(state: &StateFile, desired: &DesiredAttachments) -> AttachmentDelta {
    let old = state
        .get(&desired.principal.id())
        .map(|record| &record.policy_arns);
    let delta = compute_delta(old.unwrap_or(&PolicyArnSet::new()), &desired.policy_arns);
    print_delta(create_or_update(old.is_none()), &desired.principal, &delta);
    delta
}

async fn connect(settings: &Settings) -> Result<PolicyAttachmentsService> {
    PolicyAttachmentsService::new(&settings.aws)
        .await
        .context("Failed to initialize IAM client")
}

/// Overwrite the record with what IAM holds after a failed mutation.
///
/// The failure itself is what the caller reports; problems here are only logged.
async fn record_after_failure<C: PolicyAttachmentApi>(
    service: &PolicyAttachmentsService<C>,
    state_path: &Path,
    state: &mut StateFile,
    principal: &Principal,
) {
    match service.read(principal).await {
        Ok(observed) => {
            warn!(
                "Recording the {} policies left attached to {}",
                observed.policy_arns.len(),
                principal
            );
            state.record(observed);
            if let Err(e) = state.save(state_path) {
                warn!("Failed to save state after the failure: {e:#}");
            }
        }
        Err(e) => warn!("Could not re-read {} after the failure: {}", principal, e),
    }
}

pub(crate) fn plan(settings: &Settings, resource: &ResourceArgs) -> Result<()> {
    let desired = resource.desired()?;
    let state = StateFile::load(&settings.state_path)?;
    show_plan(&state, &desired);
    Ok(())
}

pub(crate) async fn apply(settings: &Settings, resource: &ResourceArgs, yes: bool) -> Result<()> {
    let desired = resource.desired()?;
    let state = StateFile::load(&settings.state_path)?;

    let delta = show_plan(&state, &desired);
    if !delta.is_empty() && !confirm(yes, "Apply these changes?")? {
        return Ok(());
    }

    let service = connect(settings).await?;
    let observed = apply_with(&service, &settings.state_path, state, &desired).await?;
    print_state(&observed)
}

/// Create or update `desired` and record the observed result
async fn apply_with<C: PolicyAttachmentApi>(
    service: &PolicyAttachmentsService<C>,
    state_path: &Path,
    mut state: StateFile,
    desired: &DesiredAttachments,
) -> Result<AttachmentState> {
    let principal = &desired.principal;
    let outcome = match state.get(&principal.id()) {
        Some(record) => {
            service
                .update(principal, &record.policy_arns, &desired.policy_arns)
                .await
        }
        None => service.create(principal, &desired.policy_arns).await,
    };
    let observed = match outcome {
        Ok(observed) => observed,
        Err(e) => {
            record_after_failure(service, state_path, &mut state, principal).await;
            return Err(e.into());
        }
    };

    if observed.policy_arns != desired.policy_arns {
        eprintln!(
            "Warning: {} has attachments outside the configuration; run apply again to reconcile",
            observed.id
        );
    }

    info!("Recording {} in {}", observed.id, state_path.display());
    state.record(observed.clone());
    state.save(state_path)?;
    Ok(observed)
}

pub(crate) async fn refresh(settings: &Settings, id: &str) -> Result<()> {
    let principal = Principal::from_id(id)?;
    let state = StateFile::load(&settings.state_path)?;
    recorded(&state, &principal, &settings.state_path)?;

    let service = connect(settings).await?;
    let observed = refresh_with(&service, &settings.state_path, state, &principal).await?;
    print_state(&observed)
}

async fn refresh_with<C: PolicyAttachmentApi>(
    service: &PolicyAttachmentsService<C>,
    state_path: &Path,
    mut state: StateFile,
    principal: &Principal,
) -> Result<AttachmentState> {
    let observed = service.read(principal).await?;
    state.record(observed.clone());
    state.save(state_path)?;
    Ok(observed)
}

pub(crate) async fn destroy(settings: &Settings, id: &str, yes: bool) -> Result<()> {
    let principal = Principal::from_id(id)?;
    let state = StateFile::load(&settings.state_path)?;
    let current = recorded(&state, &principal, &settings.state_path)?;

    let delta = AttachmentDelta {
        to_remove: current.clone(),
        to_add: PolicyArnSet::new(),
    };
    print_delta("destroy", &principal, &delta);

    if !current.is_empty() && !confirm(yes, "Detach these policies?")? {
        return Ok(());
    }

    let service = connect(settings).await?;
    destroy_with(&service, &settings.state_path, state, &principal, &current).await?;
    eprintln!("Destroyed {principal}");
    Ok(())
}

/// Detach `current` and forget the record
async fn destroy_with<C: PolicyAttachmentApi>(
    service: &PolicyAttachmentsService<C>,
    state_path: &Path,
    mut state: StateFile,
    principal: &Principal,
    current: &PolicyArnSet,
) -> Result<()> {
    if let Err(e) = service.delete(principal, current).await {
        record_after_failure(service, state_path, &mut state, principal).await;
        return Err(e.into());
    }
    state.remove(&principal.id());
    state.save(state_path)
}
