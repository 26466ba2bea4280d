//! Derived state: the engine-computed snapshot.
//!
//! Exclusively written by the recompute engine, always reproducible from
//! authoritative state, never persisted. One slot exists per live lens
//! instance, even when empty, and is pruned with the instance.

use std::collections::BTreeMap;

use serde::Serialize;

use super::draft::Draft;
use super::identity::{DraftId, LensInstanceId};

/// Non-fatal truncation signals. The engine intentionally produced a
/// partial, valid result; these are warnings, never errors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RuntimeWarning {
    /// One evaluate call exceeded the per-batch ceiling.
    #[serde(rename = "truncatedBatchOutputs")]
    TruncatedBatchOutputs { requested: usize, emitted: usize },
    /// One instance exceeded the per-frame ceiling.
    #[serde(rename = "truncatedFrames")]
    TruncatedFrames { requested: usize, emitted: usize },
    /// The global recompute budget ran out at this instance. Steady-state:
    /// the instance is not retried next pass merely because it was truncated.
    #[serde(rename = "truncatedRecomputeOutputs")]
    TruncatedRecomputeOutputs { requested: usize, emitted: usize },
    /// A warning string reported by the lens itself.
    #[serde(rename = "lensWarning")]
    Lens { message: String },
}

/// Per-instance derived entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSlot {
    pub draft_order: Vec<DraftId>,
    pub active_draft: Option<DraftId>,
    pub selected_drafts: Vec<DraftId>,
    pub last_error: Option<String>,
    pub warnings: Vec<RuntimeWarning>,
}

impl InstanceSlot {
    pub fn failed(message: impl Into<String>, warnings: Vec<RuntimeWarning>) -> Self {
        Self {
            last_error: Some(message.into()),
            warnings,
            ..Self::default()
        }
    }
}

/// The full derived snapshot, assembled atomically at the end of a pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedState {
    pub drafts: BTreeMap<DraftId, Draft>,
    pub slots: BTreeMap<LensInstanceId, InstanceSlot>,
}

impl DerivedState {
    pub fn slot(&self, id: &LensInstanceId) -> Option<&InstanceSlot> {
        self.slots.get(id)
    }

    pub fn draft(&self, id: &DraftId) -> Option<&Draft> {
        self.drafts.get(id)
    }

    /// The active draft of an instance, if it has one.
    pub fn active_draft_of(&self, id: &LensInstanceId) -> Option<&Draft> {
        self.slots
            .get(id)
            .and_then(|slot| slot.active_draft.as_ref())
            .and_then(|draft_id| self.drafts.get(draft_id))
    }

    /// Register a committed draft and add it to its instance's order.
    pub fn commit_draft(&mut self, draft: Draft) {
        let slot = self.slots.entry(draft.lens_instance_id.clone()).or_default();
        slot.draft_order.push(draft.draft_id.clone());
        self.drafts.insert(draft.draft_id.clone(), draft);
    }

    /// Drop slots (and their drafts) for instances that no longer exist.
    pub fn prune_to(&mut self, live: &BTreeMap<LensInstanceId, crate::core::LensInstance>) {
        self.slots.retain(|id, _| live.contains_key(id));
        self.drafts
            .retain(|_, draft| live.contains_key(&draft.lens_instance_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::draft::{DraftSeed, Provenance, make_draft};
    use crate::core::time::WallClock;
    use crate::core::tree::NumericTree;

    fn draft(instance: &LensInstanceId, hash: u32) -> Draft {
        make_draft(
            DraftSeed {
                payload: Some(NumericTree::from_scalars([1.0])),
                ..DraftSeed::default()
            },
            DraftId::from_hash(hash),
            instance.clone(),
            Provenance {
                lens_type: "pulse".into(),
                params_hash: "00000000".into(),
                input_refs: vec![],
                created_at: WallClock(0),
            },
            WallClock(0),
        )
    }

    #[test]
    fn commit_appends_to_order() {
        let instance = LensInstanceId::generate();
        let mut derived = DerivedState::default();
        derived.commit_draft(draft(&instance, 1));
        derived.commit_draft(draft(&instance, 2));

        let slot = derived.slot(&instance).unwrap();
        assert_eq!(slot.draft_order.len(), 2);
        assert_eq!(derived.drafts.len(), 2);
    }

    #[test]
    fn prune_drops_dead_instances() {
        let instance = LensInstanceId::generate();
        let mut derived = DerivedState::default();
        derived.commit_draft(draft(&instance, 1));

        derived.prune_to(&BTreeMap::new());
        assert!(derived.slots.is_empty());
        assert!(derived.drafts.is_empty());
    }

    #[test]
    fn warning_serde_shape() {
        let warning = RuntimeWarning::TruncatedRecomputeOutputs {
            requested: 600,
            emitted: 200,
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"truncatedRecomputeOutputs","requested":600,"emitted":200}"#
        );
    }
}
