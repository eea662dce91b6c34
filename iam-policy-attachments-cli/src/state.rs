//! Local state file: the recorded observed attachments, keyed by resource identity

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use iam_policy_attachments_reconciler::AttachmentState;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct StateFile {
    #[serde(default)]
    pub resources: BTreeMap<String, AttachmentState>,
}

impl StateFile {
    /// Load the state file, treating a missing file as empty state
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("State file {} does not exist yet", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).context(format!("Failed to read state file: {}", path.display()))
            }
        };
        serde_json::from_str(&content)
            .context(format!("Failed to parse state file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize state")?;
        std::fs::write(path, json + "\n")
            .context(format!("Failed to write state file: {}", path.display()))?;
        debug!(
            "Saved {} resources to {}",
            self.resources.len(),
            path.display()
        );
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&AttachmentState> {
        self.resources.get(id)
    }

    /// Overwrite the record with freshly observed state
    pub fn record(&mut self, state: AttachmentState) {
        self.resources.insert(state.id.clone(), state);
    }

    pub fn remove(&mut self, id: &str) -> Option<AttachmentState> {
        self.resources.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iam_policy_attachments_reconciler::{Principal, PrincipalKind};

    fn sample_state() -> AttachmentState {
        AttachmentState::new(
            Principal::new(PrincipalKind::Role, "deploy-role"),
            ["arn:aws:iam::aws:policy/ReadOnlyAccess".to_string()]
                .into_iter()
                .collect(),
        )
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateFile::load(&dir.path().join("absent.json")).unwrap();
        assert!(state.resources.is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut state = StateFile::default();
        state.record(sample_state());
        state.save(&path).unwrap();

        let loaded = StateFile::load(&path).unwrap();
        assert_eq!(loaded, state);
        assert!(loaded.get("role/deploy-role").is_some());
    }

    #[test]
    fn test_record_overwrites_and_remove_drops() {
        let mut state = StateFile::default();
        state.record(sample_state());

        let mut refreshed = sample_state();
        refreshed.policy_arns.clear();
        state.record(refreshed);
        assert_eq!(state.resources.len(), 1);
        assert!(state
            .get("role/deploy-role")
            .is_some_and(|s| s.policy_arns.is_empty()));

        assert!(state.remove("role/deploy-role").is_some());
        assert!(state.get("role/deploy-role").is_none());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();
        let err = StateFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse state file"));
    }
}
