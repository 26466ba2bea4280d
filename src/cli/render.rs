//! Human-readable rendering for CLI output.

use crate::core::{AuthoritativeState, DerivedState, RuntimeWarning};

pub fn state_summary(state: &AuthoritativeState) {
    println!(
        "workspace: {} lane(s) x {} rows, {} instance(s)",
        state.workspace.lanes.len(),
        state.workspace.row_count,
        state.lenses.len()
    );
    for lane in &state.workspace.lanes {
        let occupied = state
            .workspace
            .cells
            .keys()
            .filter(|key| key.lane == lane.id)
            .count();
        println!("  {} ({}): {occupied} cell(s)", lane.id, lane.name);
    }
    println!("inventory: {} material(s)", state.inventory.len());
    println!("desk: {} clip(s)", state.desk.len());
    if state.persistence.dirty {
        println!("store is dirty (unsaved edits)");
    }
}

pub fn pass_report(state: &AuthoritativeState, derived: &DerivedState) {
    println!(
        "{} draft(s) across {} instance(s)",
        derived.drafts.len(),
        derived.slots.len()
    );
    for (cell, instance_id) in state.workspace.walk_order() {
        let Some(slot) = derived.slot(&instance_id) else {
            continue;
        };
        let lens = state
            .lenses
            .get(&instance_id)
            .map(|i| i.lens_id.as_str())
            .unwrap_or("?");
        let mut line = format!(
            "  {}:{} {lens} [{instance_id}] -> {} draft(s)",
            cell.lane_id,
            cell.row,
            slot.draft_order.len()
        );
        if let Some(active) = &slot.active_draft {
            line.push_str(&format!(", active {active}"));
        }
        if let Some(err) = &slot.last_error {
            line.push_str(&format!(", error: {err}"));
        }
        println!("{line}");
        for warning in &slot.warnings {
            println!("    warning: {}", warning_line(warning));
        }
    }
}

fn warning_line(warning: &RuntimeWarning) -> String {
    match warning {
        RuntimeWarning::TruncatedBatchOutputs { requested, emitted } => {
            format!("batch truncated ({requested} requested, {emitted} emitted)")
        }
        RuntimeWarning::TruncatedFrames { requested, emitted } => {
            format!("frame truncated ({requested} requested, {emitted} emitted)")
        }
        RuntimeWarning::TruncatedRecomputeOutputs { requested, emitted } => {
            format!("recompute budget exhausted ({requested} requested, {emitted} emitted)")
        }
        RuntimeWarning::Lens { message } => message.clone(),
    }
}
