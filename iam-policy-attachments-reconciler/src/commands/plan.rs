//! Delta computation between a recorded and a desired policy ARN set

use log::debug;

use crate::types::{AttachmentDelta, PolicyArnSet};

/// `to_remove = old − new`, `to_add = new − old`; the work [`update`] performs.
///
/// [`update`]: super::service::PolicyAttachmentsService::update
pub fn compute_delta(old: &PolicyArnSet, new: &PolicyArnSet) -> AttachmentDelta {
    let delta = AttachmentDelta {
        to_remove: old.difference(new).cloned().collect(),
        to_add: new.difference(old).cloned().collect(),
    };
    debug!(
        "Computed delta: {} to detach, {} to attach",
        delta.to_remove.len(),
        delta.to_add.len()
    );
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::btree_set;
    use proptest::prelude::*;

    fn set(items: &[&str]) -> PolicyArnSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_delta_for_overlapping_sets() {
        let delta = compute_delta(&set(&["a", "b"]), &set(&["b", "c"]));
        assert_eq!(delta.to_remove, set(&["a"]));
        assert_eq!(delta.to_add, set(&["c"]));
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_delta_for_equal_sets_is_empty() {
        let delta = compute_delta(&set(&["a", "b"]), &set(&["b", "a"]));
        assert!(delta.is_empty());
    }

    #[test]
    fn test_delta_from_nothing_adds_everything() {
        let delta = compute_delta(&PolicyArnSet::new(), &set(&["a", "b"]));
        assert!(delta.to_remove.is_empty());
        assert_eq!(delta.to_add, set(&["a", "b"]));
    }

    proptest! {
        #[test]
        fn prop_delta_sides_are_disjoint(
            old in btree_set("[a-e]{1,2}", 0..8),
            new in btree_set("[a-e]{1,2}", 0..8),
        ) {
            let delta = compute_delta(&old, &new);
            prop_assert!(delta.to_remove.is_disjoint(&delta.to_add));
        }

        #[test]
        fn prop_applying_delta_yields_new(
            old in btree_set("[a-e]{1,2}", 0..8),
            new in btree_set("[a-e]{1,2}", 0..8),
        ) {
            let delta = compute_delta(&old, &new);
            let mut applied: PolicyArnSet = old.difference(&delta.to_remove).cloned().collect();
            applied.extend(delta.to_add.iter().cloned());
            prop_assert_eq!(applied, new);
        }
    }
}
