//! The recompute engine.
//!
//! One pass walks the grid in the fixed dependency order (lanes in lane
//! order, rows ascending within a lane), resolves each instance's input,
//! evaluates its lens under containment, normalizes the batch, enforces
//! the batching ceilings, and assembles the derived snapshot atomically.
//!
//! Per-instance state machine:
//! pending -> resolving-input -> evaluating -> normalizing -> committed
//! with `failed` reachable from each middle state. There is no partial
//! commit: a batch either registers whole or not at all.
//!
//! Determinism: given the same authoritative state (and clock input), two
//! passes yield byte-identical draft ids, order, active ids, and errors.
//! Timestamps are metadata and excluded from identity.

use tracing::debug;

use crate::core::{
    AuthoritativeState, DerivedState, DraftId, InstanceSlot, Limits, RuntimeWarning, WallClock,
    params_hash,
};
use crate::engine::host::evaluate_lens;
use crate::engine::normalize::normalize_batch;
use crate::engine::provenance::build_provenance;
use crate::engine::resolve::resolve_input;
use crate::lens::{EvalContext, LensInput, LensRegistry};

/// Everything a pass needs besides the authoritative state.
pub struct RecomputeContext<'a> {
    pub registry: &'a LensRegistry,
    pub limits: &'a Limits,
    /// Stamped onto every draft produced this pass. Metadata only.
    pub now: WallClock,
}

/// Run one full recompute pass.
///
/// `prev` is the previous derived snapshot; it is read for active-index
/// carry-over and selected-set intersection, never mutated. The returned
/// snapshot replaces it wholesale - nothing downstream ever observes a
/// half-updated graph.
pub fn recompute(
    state: &AuthoritativeState,
    prev: &DerivedState,
    ctx: &RecomputeContext<'_>,
) -> DerivedState {
    let mut next = DerivedState::default();
    let mut remaining = ctx.limits.max_drafts_per_recompute;

    for (cell, instance_id) in state.workspace.walk_order() {
        let Some(instance) = state.lenses.get(&instance_id) else {
            // A cell pointing at a missing instance only survives until the
            // next normalize; skip rather than poison the pass.
            continue;
        };

        let mut warnings: Vec<RuntimeWarning> = Vec::new();

        let Some(lens) = ctx.registry.get(&instance.lens_id) else {
            next.slots.insert(
                instance_id,
                InstanceSlot::failed(
                    format!("no lens `{}` in the registry", instance.lens_id),
                    warnings,
                ),
            );
            continue;
        };

        // resolving-input
        let mut input: Option<LensInput> = None;
        let mut input_refs = Vec::new();
        if let Some(spec) = lens.inputs().first() {
            match resolve_input(instance, spec, &state.workspace, &next, &cell) {
                Ok(resolved) => {
                    input = Some(resolved.input);
                    input_refs = resolved.refs;
                }
                Err(err) if spec.required => {
                    debug!(instance = %instance_id, reason = %err.reason, "input resolution failed");
                    next.slots
                        .insert(instance_id, InstanceSlot::failed(err.message, warnings));
                    continue;
                }
                Err(_) => {
                    // Optional input: the lens sees the empty input value.
                }
            }
        }

        let p_hash = match params_hash(&instance.params, &instance.input) {
            Ok(hash) => hash,
            Err(err) => {
                next.slots.insert(
                    instance_id,
                    InstanceSlot::failed(format!("params hashing failed: {err}"), warnings),
                );
                continue;
            }
        };
        let provenance = build_provenance(lens.meta(), p_hash, input_refs, ctx.now);

        // evaluating
        let context = EvalContext {
            instance_id: &instance_id,
            lane_id: &cell.lane_id,
            row: cell.row,
        };
        let set = match evaluate_lens(lens.as_ref(), Some(&instance.params), input.as_ref(), context)
        {
            Ok(set) => set,
            Err(err) => {
                next.slots
                    .insert(instance_id, InstanceSlot::failed(err.0, warnings));
                continue;
            }
        };
        warnings.extend(
            set.warnings
                .into_iter()
                .map(|message| RuntimeWarning::Lens { message }),
        );

        // Batch ceiling: cap raw outputs from this one evaluate call.
        let mut outputs = set.outputs;
        let batch_requested = outputs.len();
        if batch_requested > ctx.limits.max_drafts_per_lens_batch {
            outputs.truncate(ctx.limits.max_drafts_per_lens_batch);
            warnings.push(RuntimeWarning::TruncatedBatchOutputs {
                requested: batch_requested,
                emitted: outputs.len(),
            });
        }

        // normalizing (fail-closed)
        let mut drafts =
            match normalize_batch(outputs, instance, lens.meta(), &provenance, ctx.now) {
                Ok(drafts) => drafts,
                Err(err) => {
                    next.slots
                        .insert(instance_id, InstanceSlot::failed(err.to_string(), warnings));
                    continue;
                }
            };

        // Frame ceiling: cap what one instance registers per pass.
        let frame_requested = drafts.len();
        if frame_requested > ctx.limits.per_frame_draft_cap {
            drafts.truncate(ctx.limits.per_frame_draft_cap);
            warnings.push(RuntimeWarning::TruncatedFrames {
                requested: frame_requested,
                emitted: drafts.len(),
            });
        }

        // Global ceiling: a shared, ordered counter across the walk.
        // Truncation is a steady-state signal, not transient - a truncated
        // instance is not retried next pass on that account alone.
        let global_requested = drafts.len();
        let allowed = global_requested.min(remaining);
        if allowed < global_requested {
            drafts.truncate(allowed);
            warnings.push(RuntimeWarning::TruncatedRecomputeOutputs {
                requested: global_requested,
                emitted: allowed,
            });
        }
        remaining -= allowed;

        // committed
        let draft_order: Vec<DraftId> = drafts.iter().map(|d| d.draft_id.clone()).collect();
        let active_draft = carry_active(prev, &instance_id, &draft_order);
        let selected_drafts = carry_selected(prev, &instance_id, &draft_order);
        for draft in drafts {
            next.drafts.insert(draft.draft_id.clone(), draft);
        }
        next.slots.insert(
            instance_id,
            InstanceSlot {
                draft_order,
                active_draft,
                selected_drafts,
                last_error: None,
                warnings,
            },
        );
    }

    debug!(
        drafts = next.drafts.len(),
        instances = next.slots.len(),
        budget_left = remaining,
        "recompute pass complete"
    );
    next
}

/// Prefer the previous active *index* if it still falls within the new
/// draft count, else default to index 0, else none.
fn carry_active(
    prev: &DerivedState,
    instance_id: &crate::core::LensInstanceId,
    new_order: &[DraftId],
) -> Option<DraftId> {
    let prev_index = prev.slot(instance_id).and_then(|slot| {
        let active = slot.active_draft.as_ref()?;
        slot.draft_order.iter().position(|d| d == active)
    });
    prev_index
        .and_then(|i| new_order.get(i))
        .or_else(|| new_order.first())
        .cloned()
}

/// Previous selection intersected with the new draft set, in new order.
/// Content addressing keeps this stable across unrelated edits.
fn carry_selected(
    prev: &DerivedState,
    instance_id: &crate::core::LensInstanceId,
    new_order: &[DraftId],
) -> Vec<DraftId> {
    match prev.slot(instance_id) {
        Some(slot) if !slot.selected_drafts.is_empty() => new_order
            .iter()
            .filter(|d| slot.selected_drafts.contains(d))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}
