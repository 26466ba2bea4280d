//! Input resolution.
//!
//! Given a lens instance with a declared input role, decide which upstream
//! draft(s) it consumes this pass. Misses are structured values, never
//! exceptions: a lane with no producer above the consumer and a pin onto an
//! absent draft both come back as a typed failure.
//!
//! Resolution reads the derived state accumulated *so far in this pass*:
//! walk order guarantees every legal upstream (strictly earlier row) is
//! already committed, and a pin onto anything later in walk order is a
//! miss by construction.

use std::fmt;

use thiserror::Error;

use crate::core::{
    CellRef, DerivedState, Draft, DraftId, InputMode, InputPackaging, InputPick, InputRef,
    LensInstance, Workspace,
};
use crate::lens::{InputSpec, LensInput, ResolvedDraft};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveReason {
    MissingDraft,
    InvalidPayload,
    Unresolved,
}

impl fmt::Display for ResolveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResolveReason::MissingDraft => "missing_draft",
            ResolveReason::InvalidPayload => "invalid_payload",
            ResolveReason::Unresolved => "unresolved",
        })
    }
}

/// A well-typed resolution failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ResolveError {
    pub reason: ResolveReason,
    pub message: String,
}

impl ResolveError {
    fn missing(message: impl Into<String>) -> Self {
        Self {
            reason: ResolveReason::MissingDraft,
            message: message.into(),
        }
    }

    fn unresolved(message: impl Into<String>) -> Self {
        Self {
            reason: ResolveReason::Unresolved,
            message: message.into(),
        }
    }
}

/// The input handed to the host plus the references recorded in provenance.
#[derive(Debug)]
pub struct ResolvedInput {
    pub input: LensInput,
    pub refs: Vec<InputRef>,
}

/// Resolve one declared input role for `instance` sitting at `cell`.
pub fn resolve_input(
    instance: &LensInstance,
    spec: &InputSpec,
    workspace: &Workspace,
    derived: &DerivedState,
    cell: &CellRef,
) -> Result<ResolvedInput, ResolveError> {
    match instance.input.mode {
        InputMode::Ref => resolve_pinned(instance, spec, derived),
        InputMode::Auto => resolve_auto(instance, spec, workspace, derived, cell),
    }
}

fn resolve_pinned(
    instance: &LensInstance,
    spec: &InputSpec,
    derived: &DerivedState,
) -> Result<ResolvedInput, ResolveError> {
    let Some(pinned) = &instance.input.pinned else {
        return Err(ResolveError::missing("missing pinned input"));
    };
    let Some(draft) = derived.draft(pinned) else {
        return Err(ResolveError::missing("missing pinned input"));
    };
    let packed = instance.input.packaging == InputPackaging::PackDrafts;
    Ok(ResolvedInput {
        input: LensInput {
            role: Some(spec.role.clone()),
            mode: Some(InputMode::Ref),
            drafts: vec![view_of(draft)],
            packed,
        },
        refs: vec![InputRef {
            role: spec.role.clone(),
            mode: InputMode::Ref,
            source_draft_id: Some(pinned.clone()),
            source_lens_instance_id: None,
        }],
    })
}

fn resolve_auto(
    instance: &LensInstance,
    spec: &InputSpec,
    workspace: &Workspace,
    derived: &DerivedState,
    cell: &CellRef,
) -> Result<ResolvedInput, ResolveError> {
    if !spec.allow_upstream {
        return Err(ResolveError::unresolved(format!(
            "role `{}` does not accept upstream drafts",
            spec.role
        )));
    }
    let lane = instance
        .input
        .source_lane_id
        .as_ref()
        .unwrap_or(&cell.lane_id);
    let Some(producer) = workspace.nearest_upstream(lane, cell.row) else {
        return Err(ResolveError::unresolved(format!(
            "no upstream instance above row {} in lane {lane}",
            cell.row
        )));
    };

    let slot = derived.slot(producer).ok_or_else(|| {
        ResolveError::missing(format!("upstream instance {producer} has no drafts yet"))
    })?;

    let chosen: Vec<DraftId> = match instance.input.pick {
        InputPick::Active => match &slot.active_draft {
            Some(id) => vec![id.clone()],
            None => {
                return Err(ResolveError::missing(format!(
                    "upstream instance {producer} has no active draft"
                )));
            }
        },
        InputPick::Selected => slot.selected_drafts.clone(),
    };

    let packed = instance.input.packaging == InputPackaging::PackDrafts;
    if chosen.is_empty() && !packed {
        return Err(ResolveError::missing(format!(
            "upstream instance {producer} has no selected drafts"
        )));
    }

    let take = if packed { chosen.len() } else { chosen.len().min(1) };
    let mut drafts = Vec::with_capacity(take);
    let mut refs = Vec::with_capacity(take);
    for id in chosen.into_iter().take(take) {
        let Some(draft) = derived.draft(&id) else {
            return Err(ResolveError {
                reason: ResolveReason::InvalidPayload,
                message: format!("upstream draft {id} is not registered"),
            });
        };
        drafts.push(view_of(draft));
        refs.push(InputRef {
            role: spec.role.clone(),
            mode: InputMode::Auto,
            source_draft_id: Some(id),
            source_lens_instance_id: Some(producer.clone()),
        });
    }

    Ok(ResolvedInput {
        input: LensInput {
            role: Some(spec.role.clone()),
            mode: Some(InputMode::Auto),
            drafts,
            packed,
        },
        refs,
    })
}

fn view_of(draft: &Draft) -> ResolvedDraft {
    ResolvedDraft {
        draft_id: draft.draft_id.clone(),
        draft_type: draft.draft_type.clone(),
        values: draft.payload.values.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        CellKey, DraftSeed, InputConfig, LaneId, Lane, LensId, LensInstanceId, Provenance,
        WallClock, make_draft,
    };
    use crate::core::tree::NumericTree;

    fn committed_draft(derived: &mut DerivedState, instance: &LensInstanceId, hash: u32) -> DraftId {
        let draft = make_draft(
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
        );
        let id = draft.draft_id.clone();
        derived.commit_draft(draft);
        id
    }

    fn grid() -> (Workspace, LensInstanceId, CellRef) {
        let mut ws = Workspace::default();
        let lane = LaneId::parse("melody").unwrap();
        ws.add_lane(Lane {
            id: lane.clone(),
            name: "melody".into(),
        });
        let producer = LensInstanceId::generate();
        ws.place(CellKey::new(lane.clone(), 0), producer.clone())
            .unwrap();
        (
            ws,
            producer,
            CellRef {
                lane_id: lane,
                row: 2,
            },
        )
    }

    fn consumer(input: InputConfig) -> LensInstance {
        let mut instance =
            LensInstance::new(LensId::parse("offset").unwrap(), Default::default());
        instance.input = input;
        instance
    }

    #[test]
    fn pinned_miss_is_a_hard_miss() {
        let (ws, _producer, cell) = grid();
        let derived = DerivedState::default();
        let instance = consumer(InputConfig::pinned(DraftId::from_hash(0xdead)));
        let err = resolve_input(
            &instance,
            &InputSpec::required("source"),
            &ws,
            &derived,
            &cell,
        )
        .unwrap_err();
        assert_eq!(err.reason, ResolveReason::MissingDraft);
        assert_eq!(err.message, "missing pinned input");
    }

    #[test]
    fn auto_resolves_nearest_upstream_active() {
        let (ws, producer, cell) = grid();
        let mut derived = DerivedState::default();
        let id = committed_draft(&mut derived, &producer, 1);
        derived
            .slots
            .get_mut(&producer)
            .unwrap()
            .active_draft = Some(id.clone());

        let instance = consumer(InputConfig::default());
        let resolved = resolve_input(
            &instance,
            &InputSpec::required("source"),
            &ws,
            &derived,
            &cell,
        )
        .unwrap();
        assert_eq!(resolved.input.drafts.len(), 1);
        assert_eq!(resolved.refs[0].source_draft_id, Some(id));
        assert_eq!(
            resolved.refs[0].source_lens_instance_id,
            Some(producer.clone())
        );
    }

    #[test]
    fn empty_lane_is_unresolved_not_a_crash() {
        let mut ws = Workspace::default();
        let lane = LaneId::parse("empty").unwrap();
        ws.add_lane(Lane {
            id: lane.clone(),
            name: "empty".into(),
        });
        let cell = CellRef {
            lane_id: lane,
            row: 3,
        };
        let derived = DerivedState::default();
        let instance = consumer(InputConfig::default());
        let err = resolve_input(
            &instance,
            &InputSpec::required("source"),
            &ws,
            &derived,
            &cell,
        )
        .unwrap_err();
        assert_eq!(err.reason, ResolveReason::Unresolved);
    }

    #[test]
    fn selected_pick_packs_the_full_set() {
        let (ws, producer, cell) = grid();
        let mut derived = DerivedState::default();
        let a = committed_draft(&mut derived, &producer, 1);
        let b = committed_draft(&mut derived, &producer, 2);
        let slot = derived.slots.get_mut(&producer).unwrap();
        slot.active_draft = Some(a.clone());
        slot.selected_drafts = vec![a.clone(), b.clone()];

        let instance = consumer(InputConfig {
            pick: crate::core::InputPick::Selected,
            packaging: InputPackaging::PackDrafts,
            ..InputConfig::default()
        });
        let resolved = resolve_input(
            &instance,
            &InputSpec::required("pack"),
            &ws,
            &derived,
            &cell,
        )
        .unwrap();
        assert!(resolved.input.packed);
        assert_eq!(resolved.input.drafts.len(), 2);
        assert_eq!(resolved.refs.len(), 2);
    }
}
