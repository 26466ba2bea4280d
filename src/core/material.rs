//! Materials and clips.
//!
//! A material is a user-promoted copy of a draft's payload; a clip is a
//! timed placement of a material on the desk. Both are deliberately
//! decoupled from the generative graph: a material never references a lens
//! instance, a clip never references a draft. That separation is what lets
//! them outlive the instances that spawned them.

use serde::{Deserialize, Serialize};

use super::draft::Draft;
use super::error::DraftInvariantError;
use super::identity::{ClipId, DraftId, LaneId, MaterialId};
use super::time::WallClock;
use super::tree::{NumericTree, assert_numeric_tree};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialProvenance {
    pub source_draft_id: DraftId,
}

/// A promoted, decoupled copy of a draft's payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub material_id: MaterialId,
    pub name: String,
    pub payload: NumericTree,
    pub provenance: MaterialProvenance,
    pub created_at: WallClock,
}

#[derive(Clone, Debug, Default)]
pub struct MaterialOpts {
    pub name: Option<String>,
}

/// Promote a draft into a material. The payload is copied; no link back to
/// the producing lens instance survives.
pub fn make_material_from_draft(
    draft: &Draft,
    opts: MaterialOpts,
    created_at: WallClock,
) -> Material {
    Material {
        material_id: MaterialId::generate(),
        name: opts.name.unwrap_or_else(|| draft.summary.clone()),
        payload: draft.payload.values.clone(),
        provenance: MaterialProvenance {
            source_draft_id: draft.draft_id.clone(),
        },
        created_at,
    }
}

pub fn assert_material(material: &Material) -> Result<(), DraftInvariantError> {
    if material.material_id.as_str().is_empty() {
        return Err(DraftInvariantError::MissingIdentifier { field: "materialId" });
    }
    assert_numeric_tree(&material.payload)
}

/// A timed placement of a material on the desk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub clip_id: ClipId,
    pub material_id: MaterialId,
    pub lane: LaneId,
    pub start: f64,
    pub duration: f64,
}

#[derive(Clone, Debug)]
pub struct ClipOpts {
    pub lane: LaneId,
    pub start: f64,
    pub duration: f64,
}

pub fn make_clip_from_material(material_id: MaterialId, opts: ClipOpts) -> Clip {
    Clip {
        clip_id: ClipId::generate(),
        material_id,
        lane: opts.lane,
        start: opts.start,
        duration: opts.duration,
    }
}

pub fn assert_clip(clip: &Clip) -> Result<(), DraftInvariantError> {
    if clip.clip_id.as_str().is_empty() {
        return Err(DraftInvariantError::MissingIdentifier { field: "clipId" });
    }
    if clip.material_id.as_str().is_empty() {
        return Err(DraftInvariantError::MissingIdentifier { field: "materialId" });
    }
    if !clip.start.is_finite() || clip.start < 0.0 {
        return Err(DraftInvariantError::InvalidTiming {
            reason: format!("start {} must be finite and non-negative", clip.start),
        });
    }
    if !clip.duration.is_finite() || clip.duration <= 0.0 {
        return Err(DraftInvariantError::InvalidTiming {
            reason: format!("duration {} must be finite and positive", clip.duration),
        });
    }
    Ok(())
}
