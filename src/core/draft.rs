//! Drafts: immutable, content-addressed outputs of one lens instance.
//!
//! The draft id is a pure function of `{lensId, lensInstanceId, type,
//! subtype, paramsHash, inputRefs, index}` - identical inputs always yield
//! the identical id. `createdAt` is metadata and excluded from identity, so
//! two drafts differing only in timestamps are the *same* draft.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::error::DraftInvariantError;
use super::hash::content_hash_hex;
use super::identity::{DraftId, LensId, LensInstanceId};
use super::instance::{InputConfig, InputMode, ParamMap};
use super::json_canon::CanonJsonError;
use super::time::WallClock;
use super::tree::{NumericTree, assert_numeric_tree};

/// Payload kind tag. Only numeric trees exist today; the tag keeps the
/// persisted shape open for other payload kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    #[default]
    #[serde(rename = "numericTree")]
    NumericTree,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub kind: PayloadKind,
    pub values: NumericTree,
}

impl Payload {
    pub fn new(values: NumericTree) -> Self {
        Self {
            kind: PayloadKind::NumericTree,
            values,
        }
    }
}

/// One resolved upstream reference, recorded for lineage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRef {
    pub role: String,
    pub mode: InputMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_draft_id: Option<DraftId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_lens_instance_id: Option<LensInstanceId>,
}

/// Auditable lineage stamped onto every committed draft.
///
/// Informational, not identity: `created_at` lives here and in the draft
/// but never reaches the stable-id inputs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub lens_type: String,
    pub params_hash: String,
    pub input_refs: Vec<InputRef>,
    pub created_at: WallClock,
}

/// An immutable numeric-tree output of one lens instance for one pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub draft_id: DraftId,
    pub lens_instance_id: LensInstanceId,
    #[serde(rename = "type")]
    pub draft_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    pub payload: Payload,
    pub summary: String,
    pub provenance: Provenance,
    pub created_at: WallClock,
}

/// The stable-id inputs. Everything here changes the id; nothing else does.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftIdentity<'a> {
    pub lens_id: &'a LensId,
    pub lens_instance_id: &'a LensInstanceId,
    #[serde(rename = "type")]
    pub draft_type: &'a str,
    pub subtype: Option<&'a str>,
    pub params_hash: &'a str,
    pub input_refs: &'a [InputRef],
    pub index: usize,
}

/// Derive the content-addressed draft key.
///
/// Pure function: the canonical serialization of the identity record is
/// hashed, so unrelated edits never invalidate downstream caches.
pub fn build_draft_key(identity: &DraftIdentity<'_>) -> Result<DraftId, CanonJsonError> {
    let hex = content_hash_hex(identity)?;
    Ok(DraftId::parse(format!("draft_{hex}")).expect("hash-derived draft id is well-formed"))
}

/// Hash of `{params, lensInput}` - the parameter half of provenance.
pub fn params_hash(params: &ParamMap, input: &InputConfig) -> Result<String, CanonJsonError> {
    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct ParamsAndInput<'a> {
        params: &'a ParamMap,
        lens_input: &'a InputConfig,
    }
    content_hash_hex(&ParamsAndInput {
        params,
        lens_input: input,
    })
}

/// Un-normalized draft fields, as produced by a lens.
#[derive(Clone, Debug, Default)]
pub struct DraftSeed {
    pub draft_type: Option<String>,
    pub subtype: Option<String>,
    pub payload: Option<NumericTree>,
    pub summary: Option<String>,
}

/// Construct a draft, normalizing rather than fabricating.
///
/// A missing payload is coerced to an empty list (with a logged downgrade);
/// a bare scalar is wrapped into a one-element list; a missing summary is
/// derived from the payload. Construction never produces a structurally
/// invalid draft - `assert_draft` still runs at the trust boundary above.
pub fn make_draft(
    seed: DraftSeed,
    draft_id: DraftId,
    lens_instance_id: LensInstanceId,
    provenance: Provenance,
    created_at: WallClock,
) -> Draft {
    let values = match seed.payload {
        Some(NumericTree::Scalar(v)) => NumericTree::List(vec![NumericTree::Scalar(v)]),
        Some(tree) => tree,
        None => {
            warn!(instance = %lens_instance_id, "draft produced without payload, downgraded to empty list");
            NumericTree::empty()
        }
    };
    let summary = seed
        .summary
        .unwrap_or_else(|| summarize(&values));
    Draft {
        draft_id,
        lens_instance_id,
        draft_type: seed
            .draft_type
            .unwrap_or_else(|| "numericTree".to_string()),
        subtype: seed.subtype,
        payload: Payload::new(values),
        summary,
        provenance,
        created_at,
    }
}

fn summarize(values: &NumericTree) -> String {
    match values.leaf_count() {
        1 => "1 value".to_string(),
        n => format!("{n} values"),
    }
}

/// Fail loudly on a structurally invalid draft.
pub fn assert_draft(draft: &Draft) -> Result<(), DraftInvariantError> {
    if draft.draft_id.as_str().is_empty() {
        return Err(DraftInvariantError::MissingIdentifier { field: "draftId" });
    }
    if draft.lens_instance_id.as_str().is_empty() {
        return Err(DraftInvariantError::MissingIdentifier {
            field: "lensInstanceId",
        });
    }
    if draft.draft_type.is_empty() {
        return Err(DraftInvariantError::MissingIdentifier { field: "type" });
    }
    assert_numeric_tree(&draft.payload.values)
}
