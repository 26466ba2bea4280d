//! Engine properties: determinism, content addressing, containment, and
//! ceiling enforcement.

mod fixtures;

use fixtures::{lens, session, session_with_limits};
use lensdesk::core::{InputConfig, InputMode, InputPick, InputPackaging, Limits};
use lensdesk::{DraftId, ParamMap, RuntimeWarning};

fn params(pairs: &[(&str, serde_json::Value)]) -> ParamMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn recompute_is_deterministic() {
    let mut s = session();
    let melody = s.add_lane("melody");
    s.place_lens(&melody, 0, &lens("ladder"), params(&[("steps", 6.into())]))
        .unwrap();
    s.place_lens(
        &melody,
        1,
        &lens("offset"),
        params(&[("amount", 7.into())]),
    )
    .unwrap();
    let bass = s.add_lane("bass");
    s.place_lens(&bass, 0, &lens("pulse"), ParamMap::new())
        .unwrap();

    let first = serde_json::to_string(s.derived()).unwrap();
    s.recompute_now();
    let second = serde_json::to_string(s.derived()).unwrap();
    // Identical draft ids, order, active ids, and error maps - byte for byte.
    assert_eq!(first, second);
}

#[test]
fn timestamps_never_change_draft_ids() {
    use lensdesk::core::{Clock, WallClock};

    let mut s = session();
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("pulse"), ParamMap::new())
        .unwrap();
    let before = s.derived().slot(&id).unwrap().draft_order.clone();
    let stamped_before = s.derived().draft(&before[0]).unwrap().created_at;

    // Same authoritative state, different wall clock: identical ids, new
    // metadata.
    let mut s = s.with_clock(Clock::Fixed(WallClock(2_000_000_000_000)));
    s.recompute_now();
    let after = s.derived().slot(&id).unwrap().draft_order.clone();
    let stamped_after = s.derived().draft(&after[0]).unwrap().created_at;

    assert_eq!(before, after);
    assert_ne!(stamped_before, stamped_after);
}

#[test]
fn param_edits_change_draft_ids() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("pulse"), params(&[("steps", 8.into())]))
        .unwrap();
    let before = s.derived().slot(&id).unwrap().draft_order.clone();

    s.set_params(&id, params(&[("steps", 9.into())])).unwrap();
    let after = s.derived().slot(&id).unwrap().draft_order.clone();
    assert_ne!(before, after);
}

#[test]
fn unrelated_edits_keep_draft_ids_stable() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("pulse"), ParamMap::new())
        .unwrap();
    let before = s.derived().slot(&id).unwrap().draft_order.clone();

    // A different lane changes; this instance's identity inputs do not.
    let bass = s.add_lane("bass");
    s.place_lens(&bass, 0, &lens("ladder"), ParamMap::new())
        .unwrap();
    let after = s.derived().slot(&id).unwrap().draft_order.clone();
    assert_eq!(before, after);
}

#[test]
fn one_invalid_output_fails_the_whole_batch() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("badbatch"), params(&[("count", 5.into())]))
        .unwrap();

    let slot = s.derived().slot(&id).unwrap();
    assert!(slot.draft_order.is_empty());
    assert!(slot.active_draft.is_none());
    let error = slot.last_error.as_deref().unwrap();
    assert!(error.contains("output 5"), "{error}");
    assert!(error.contains("non-finite"), "{error}");
}

#[test]
fn panics_are_contained_to_the_instance() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let boom = s
        .place_lens(&melody, 0, &lens("panicky"), ParamMap::new())
        .unwrap();
    let bass = s.add_lane("bass");
    let ok = s
        .place_lens(&bass, 0, &lens("pulse"), ParamMap::new())
        .unwrap();

    let boom_slot = s.derived().slot(&boom).unwrap();
    assert!(
        boom_slot
            .last_error
            .as_deref()
            .unwrap()
            .contains("fixture lens exploded")
    );
    // A failing lens cannot poison sibling results.
    assert_eq!(s.derived().slot(&ok).unwrap().draft_order.len(), 1);
}

#[test]
fn failure_propagates_forward_as_a_resolution_miss() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let producer = s
        .place_lens(&melody, 0, &lens("panicky"), ParamMap::new())
        .unwrap();
    let consumer = s
        .place_lens(&melody, 1, &lens("offset"), ParamMap::new())
        .unwrap();

    // The producer failed, so the consumer's auto resolution misses - a
    // missing_draft error of its own, not the producer's error text.
    let slot = s.derived().slot(&consumer).unwrap();
    let error = slot.last_error.as_deref().unwrap();
    assert!(error.contains("no active draft"), "{error}");
    assert!(!error.contains("exploded"), "{error}");
    let _ = producer;
}

#[test]
fn missing_pinned_input_is_a_hard_miss() {
    let mut s = session();
    let melody = s.add_lane("melody");
    s.place_lens(&melody, 0, &lens("pulse"), ParamMap::new())
        .unwrap();
    let consumer = s
        .place_lens(&melody, 1, &lens("offset"), ParamMap::new())
        .unwrap();
    s.pin_input(&consumer, DraftId::from_hash(0xdeadbeef))
        .unwrap();

    let slot = s.derived().slot(&consumer).unwrap();
    assert_eq!(slot.last_error.as_deref(), Some("missing pinned input"));
    assert!(slot.draft_order.is_empty());
}

#[test]
fn pinned_input_resolves_across_lanes() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let producer = s
        .place_lens(&melody, 0, &lens("ladder"), ParamMap::new())
        .unwrap();
    let pinned_id = s.derived().slot(&producer).unwrap().draft_order[0].clone();

    let bass = s.add_lane("bass");
    let consumer = s
        .place_lens(
            &bass,
            3,
            &lens("offset"),
            params(&[("amount", 1.into())]),
        )
        .unwrap();
    s.pin_input(&consumer, pinned_id).unwrap();

    let draft = s.derived().active_draft_of(&consumer).unwrap();
    assert_eq!(draft.payload.values.flatten(), vec![61.0, 63.0, 65.0, 67.0]);
}

#[test]
fn batch_ceiling_truncates_with_warning() {
    let limits = Limits {
        max_drafts_per_lens_batch: 200,
        per_frame_draft_cap: 1_000,
        max_drafts_per_recompute: 10_000,
    };
    let mut s = session_with_limits(limits);
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("burst"), params(&[("count", 260.into())]))
        .unwrap();

    let slot = s.derived().slot(&id).unwrap();
    assert_eq!(slot.draft_order.len(), 200);
    assert!(slot.last_error.is_none());
    assert!(slot.warnings.contains(&RuntimeWarning::TruncatedBatchOutputs {
        requested: 260,
        emitted: 200,
    }));
}

#[test]
fn batch_under_the_ceiling_has_no_warning() {
    let limits = Limits {
        max_drafts_per_lens_batch: 500,
        per_frame_draft_cap: 1_000,
        max_drafts_per_recompute: 10_000,
    };
    let mut s = session_with_limits(limits);
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("burst"), params(&[("count", 260.into())]))
        .unwrap();

    let slot = s.derived().slot(&id).unwrap();
    assert_eq!(slot.draft_order.len(), 260);
    assert!(slot.warnings.is_empty());
}

#[test]
fn frame_ceiling_is_independent_of_batch_ceiling() {
    let limits = Limits {
        max_drafts_per_lens_batch: 1_000,
        per_frame_draft_cap: 50,
        max_drafts_per_recompute: 10_000,
    };
    let mut s = session_with_limits(limits);
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("burst"), params(&[("count", 80.into())]))
        .unwrap();

    let slot = s.derived().slot(&id).unwrap();
    assert_eq!(slot.draft_order.len(), 50);
    assert!(slot.warnings.contains(&RuntimeWarning::TruncatedFrames {
        requested: 80,
        emitted: 50,
    }));
}

#[test]
fn global_ceiling_spills_over_in_walk_order() {
    let limits = Limits {
        max_drafts_per_lens_batch: 1_000,
        per_frame_draft_cap: 1_000,
        max_drafts_per_recompute: 2_000,
    };
    let mut s = session_with_limits(limits);
    let mut instances = Vec::new();
    for i in 0..5 {
        let lane = s.add_lane(&format!("lane{i}"));
        instances.push(
            s.place_lens(&lane, 0, &lens("burst"), params(&[("count", 600.into())]))
                .unwrap(),
        );
    }

    let counts: Vec<usize> = instances
        .iter()
        .map(|id| s.derived().slot(id).unwrap().draft_order.len())
        .collect();
    assert_eq!(counts, vec![600, 600, 600, 200, 0]);

    let fourth = s.derived().slot(&instances[3]).unwrap();
    assert!(
        fourth
            .warnings
            .contains(&RuntimeWarning::TruncatedRecomputeOutputs {
                requested: 600,
                emitted: 200,
            })
    );
    let fifth = s.derived().slot(&instances[4]).unwrap();
    assert!(
        fifth
            .warnings
            .contains(&RuntimeWarning::TruncatedRecomputeOutputs {
                requested: 600,
                emitted: 0,
            })
    );
    // Truncation is a warning, never an error.
    assert!(fourth.last_error.is_none());
    assert!(fifth.last_error.is_none());
}

#[test]
fn packed_selection_reaches_the_lens_verbatim() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let burst = s
        .place_lens(&melody, 0, &lens("burst"), params(&[("count", 12.into())]))
        .unwrap();
    let order = s.derived().slot(&burst).unwrap().draft_order.clone();
    s.select_drafts(&burst, order[2..9].to_vec()).unwrap();

    let sink = s
        .place_lens(&melody, 1, &lens("sink"), ParamMap::new())
        .unwrap();
    s.set_input(
        &sink,
        InputConfig {
            mode: InputMode::Auto,
            pick: InputPick::Selected,
            packaging: InputPackaging::PackDrafts,
            pinned: None,
            source_lane_id: None,
        },
    )
    .unwrap();

    // The sink reports exactly the packed count: 7 selected drafts.
    let draft = s.derived().active_draft_of(&sink).unwrap();
    assert_eq!(draft.payload.values.flatten(), vec![7.0]);
}

#[test]
fn active_index_carries_over_when_possible() {
    let mut s = session();
    let melody = s.add_lane("melody");
    let id = s
        .place_lens(&melody, 0, &lens("burst"), params(&[("count", 5.into())]))
        .unwrap();
    let order = s.derived().slot(&id).unwrap().draft_order.clone();
    s.set_active_draft(&id, &order[3]).unwrap();

    // Shrink the batch below the active index: falls back to index 0.
    s.set_params(&id, params(&[("count", 2.into())])).unwrap();
    let slot = s.derived().slot(&id).unwrap();
    assert_eq!(slot.active_draft.as_ref(), slot.draft_order.first());

    // The index is kept when the new count still covers it.
    s.set_params(&id, params(&[("count", 5.into())])).unwrap();
    let order = s.derived().slot(&id).unwrap().draft_order.clone();
    s.set_active_draft(&id, &order[1]).unwrap();
    s.set_params(&id, params(&[("count", 4.into())])).unwrap();
    let slot = s.derived().slot(&id).unwrap();
    assert_eq!(slot.active_draft.as_ref(), Some(&slot.draft_order[1]));
}

#[test]
fn every_instance_has_a_slot_even_when_empty() {
    let mut s = session();
    let melody = s.add_lane("melody");
    // An offset with nothing upstream: required input, fails, still has a slot.
    let id = s
        .place_lens(&melody, 3, &lens("offset"), ParamMap::new())
        .unwrap();
    let slot = s.derived().slot(&id).unwrap();
    assert!(slot.draft_order.is_empty());
    assert!(slot.last_error.is_some());
}
