//! Provenance builder.
//!
//! Stamps every produced draft with auditable lineage: the lens type, a
//! hash of its parameters + input wiring, and the resolved input
//! references. Lineage is informational - `created_at` lives here but is
//! excluded from the stable-id inputs, so two drafts with identical
//! provenance and different timestamps are the same draft.

use crate::core::{InputRef, Provenance, WallClock};
use crate::lens::LensMeta;

pub fn build_provenance(
    meta: &LensMeta,
    params_hash: String,
    input_refs: Vec<InputRef>,
    created_at: WallClock,
) -> Provenance {
    Provenance {
        lens_type: meta.id.to_string(),
        params_hash,
        input_refs,
        created_at,
    }
}
