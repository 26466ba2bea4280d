//! The lens plug-in contract.
//!
//! A lens is a pluggable generator/transformer with a declared input
//! contract and a pure evaluation function. The engine consumes lenses
//! through this one contract; their numeric internals are opaque to it.
//! Only the evaluation host (`engine::host`) may call `evaluate`.

use serde::{Deserialize, Serialize};

use crate::core::{
    DraftSeed, InputMode, LaneId, LensId, LensInstanceId, NumericTree, ParamMap,
};

pub mod builtin;
mod registry;

pub use registry::LensRegistry;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LensKind {
    Generator,
    Transformer,
    Source,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LensMeta {
    pub id: LensId,
    pub name: String,
    pub kind: LensKind,
}

/// A declared input role.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSpec {
    pub role: String,
    pub required: bool,
    /// Draft types this role accepts; advisory, interpreted by the lens.
    #[serde(default)]
    pub accepts: Vec<String>,
    pub allow_upstream: bool,
    /// Param key the lens falls back to when nothing upstream resolves.
    /// Handed to the lens verbatim; the engine does not interpret it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_literal_key: Option<String>,
}

impl InputSpec {
    pub fn required(role: &str) -> Self {
        Self {
            role: role.to_string(),
            required: true,
            accepts: Vec::new(),
            allow_upstream: true,
            fallback_literal_key: None,
        }
    }

    pub fn optional(role: &str) -> Self {
        Self {
            required: false,
            ..Self::required(role)
        }
    }
}

/// The resolved input handed to `evaluate`. A missing input is the empty
/// value, never an absent argument.
#[derive(Clone, Debug, Default)]
pub struct LensInput {
    pub role: Option<String>,
    pub mode: Option<InputMode>,
    /// Resolved upstream drafts' payloads, in upstream draft order.
    pub drafts: Vec<ResolvedDraft>,
    /// True when packaging was `packDrafts`.
    pub packed: bool,
}

impl LensInput {
    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    /// The single resolved payload, for `single`-packaged consumers.
    pub fn single(&self) -> Option<&ResolvedDraft> {
        self.drafts.first()
    }
}

/// A read-only view of one resolved upstream draft.
#[derive(Clone, Debug)]
pub struct ResolvedDraft {
    pub draft_id: crate::core::DraftId,
    pub draft_type: String,
    pub values: NumericTree,
}

/// Position context, informational only.
#[derive(Clone, Debug)]
pub struct EvalContext<'a> {
    pub instance_id: &'a LensInstanceId,
    pub lane_id: &'a LaneId,
    pub row: u32,
}

pub struct EvalArgs<'a> {
    pub params: &'a ParamMap,
    pub input: &'a LensInput,
    pub context: EvalContext<'a>,
}

/// Raw lens output: either a bare numeric tree or a draft-shaped record.
/// The variant is resolved once during normalization, never branched on
/// again downstream.
#[derive(Clone, Debug)]
pub enum RawLensOutput {
    Tree(NumericTree),
    DraftLike(DraftSeed),
}

impl From<NumericTree> for RawLensOutput {
    fn from(tree: NumericTree) -> Self {
        RawLensOutput::Tree(tree)
    }
}

/// What a lens returns from `evaluate`.
#[derive(Debug, Default)]
pub struct RawEvalOutput {
    pub ok: bool,
    pub drafts: Vec<RawLensOutput>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Free-form visualization payload for panel code. The engine never
    /// reads it.
    pub viz_model: Option<serde_json::Value>,
}

impl RawEvalOutput {
    pub fn ok(drafts: Vec<RawLensOutput>) -> Self {
        Self {
            ok: true,
            drafts,
            ..Self::default()
        }
    }

    pub fn fail(errors: Vec<String>) -> Self {
        Self {
            ok: false,
            errors,
            ..Self::default()
        }
    }
}

/// The plug-in trait.
pub trait Lens: Send + Sync {
    fn meta(&self) -> &LensMeta;

    fn inputs(&self) -> &[InputSpec] {
        &[]
    }

    /// Pure evaluation. Inputs are always safe-defaulted by the host;
    /// panics and `ok: false` results are contained there too.
    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput;
}

/// Read an integer parameter, with a default.
pub(crate) fn param_usize(params: &ParamMap, key: &str, default: usize) -> usize {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(default)
}

/// Read a float parameter, with a default. Non-finite values fall back.
pub(crate) fn param_f64(params: &ParamMap, key: &str, default: f64) -> f64 {
    params
        .get(key)
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}
