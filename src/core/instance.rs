//! Lens instances: a placed, parameterized occurrence of a lens.
//!
//! An instance lives exactly as long as it occupies a grid cell; removing
//! the cell deletes the instance and cascades to any selection referencing
//! it (see `state::AuthoritativeState::remove_instance`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identity::{DraftId, LaneId, LensId, LensInstanceId};

/// Opaque key/value parameter record, handed to the lens verbatim.
pub type ParamMap = BTreeMap<String, Value>;

/// Where the input comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputMode {
    /// Nearest upstream instance in the source lane.
    #[default]
    Auto,
    /// Pinned to one draft id; absence is a hard miss, not a fallback.
    Ref,
}

/// Which of the upstream's drafts to consume.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputPick {
    #[default]
    Active,
    Selected,
}

/// How resolved drafts are handed to the lens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InputPackaging {
    /// Exactly one upstream draft reference (or none).
    #[default]
    Single,
    /// A list of upstream draft references, handed to the lens verbatim.
    PackDrafts,
}

/// Per-instance input wiring.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InputConfig {
    pub mode: InputMode,
    pub pick: InputPick,
    pub packaging: InputPackaging,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<DraftId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_lane_id: Option<LaneId>,
}

impl InputConfig {
    pub fn pinned(draft_id: DraftId) -> Self {
        Self {
            mode: InputMode::Ref,
            pinned: Some(draft_id),
            ..Self::default()
        }
    }
}

/// A placed, parameterized occurrence of a lens at one grid cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LensInstance {
    pub id: LensInstanceId,
    pub lens_id: LensId,
    #[serde(default)]
    pub params: ParamMap,
    #[serde(default)]
    pub input: InputConfig,
}

impl LensInstance {
    pub fn new(lens_id: LensId, params: ParamMap) -> Self {
        Self {
            id: LensInstanceId::generate(),
            lens_id,
            params,
            input: InputConfig::default(),
        }
    }
}
