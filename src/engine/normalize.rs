//! Normalization: raw lens output into full drafts.
//!
//! The tagged raw-output variant (bare tree vs. draft-shaped record) is
//! resolved exactly once here. Batches are fail-closed: one malformed
//! output invalidates the whole batch for that instance, and the first
//! error is what the caller records.

use thiserror::Error;

use crate::core::{
    CanonJsonError, Draft, DraftIdentity, DraftInvariantError, DraftSeed, LensInstance,
    Provenance, WallClock, assert_draft, build_draft_key, make_draft,
};
use crate::lens::{LensMeta, RawLensOutput};

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("output {index}: {source}")]
    Invariant {
        index: usize,
        source: DraftInvariantError,
    },
    #[error("output {index}: identity serialization failed: {source}")]
    Identity {
        index: usize,
        source: CanonJsonError,
    },
}

/// Normalize one batch of raw outputs into committed-ready drafts.
///
/// All-or-nothing: either every output passes construction and assertion,
/// or the batch is rejected with the first error.
pub fn normalize_batch(
    outputs: Vec<RawLensOutput>,
    instance: &LensInstance,
    meta: &LensMeta,
    provenance: &Provenance,
    created_at: WallClock,
) -> Result<Vec<Draft>, NormalizeError> {
    let mut drafts = Vec::with_capacity(outputs.len());
    for (index, raw) in outputs.into_iter().enumerate() {
        let seed = match raw {
            RawLensOutput::Tree(tree) => DraftSeed {
                payload: Some(tree),
                ..DraftSeed::default()
            },
            RawLensOutput::DraftLike(seed) => seed,
        };

        let draft_type = seed.draft_type.clone().unwrap_or_else(|| "numericTree".to_string());
        let identity = DraftIdentity {
            lens_id: &meta.id,
            lens_instance_id: &instance.id,
            draft_type: &draft_type,
            subtype: seed.subtype.as_deref(),
            params_hash: &provenance.params_hash,
            input_refs: &provenance.input_refs,
            index,
        };
        let draft_id = build_draft_key(&identity)
            .map_err(|source| NormalizeError::Identity { index, source })?;

        let draft = make_draft(
            seed,
            draft_id,
            instance.id.clone(),
            provenance.clone(),
            created_at,
        );
        // Trust boundary: raw output has just been shaped into a draft.
        assert_draft(&draft).map_err(|source| NormalizeError::Invariant { index, source })?;
        drafts.push(draft);
    }
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LensId, NumericTree, params_hash};
    use crate::lens::LensKind;

    fn fixtures() -> (LensInstance, LensMeta, Provenance) {
        let instance = LensInstance::new(LensId::parse("burst").unwrap(), Default::default());
        let meta = LensMeta {
            id: LensId::parse("burst").unwrap(),
            name: "Burst".into(),
            kind: LensKind::Generator,
        };
        let p_hash = params_hash(&instance.params, &instance.input).unwrap();
        let provenance = Provenance {
            lens_type: "burst".into(),
            params_hash: p_hash,
            input_refs: vec![],
            created_at: WallClock(0),
        };
        (instance, meta, provenance)
    }

    #[test]
    fn indexes_disambiguate_identical_outputs() {
        let (instance, meta, provenance) = fixtures();
        let outputs = vec![
            RawLensOutput::Tree(NumericTree::from_scalars([1.0])),
            RawLensOutput::Tree(NumericTree::from_scalars([1.0])),
        ];
        let drafts = normalize_batch(
            outputs,
            &instance,
            &meta,
            &provenance,
            WallClock(0),
        )
        .unwrap();
        assert_eq!(drafts.len(), 2);
        assert_ne!(drafts[0].draft_id, drafts[1].draft_id);
    }

    #[test]
    fn one_bad_output_fails_the_whole_batch() {
        let (instance, meta, provenance) = fixtures();
        let outputs = vec![
            RawLensOutput::Tree(NumericTree::from_scalars([1.0])),
            RawLensOutput::Tree(NumericTree::from_scalars([f64::NAN])),
            RawLensOutput::Tree(NumericTree::from_scalars([2.0])),
        ];
        let err = normalize_batch(
            outputs,
            &instance,
            &meta,
            &provenance,
            WallClock(0),
        )
        .unwrap_err();
        assert!(matches!(err, NormalizeError::Invariant { index: 1, .. }));
    }

    #[test]
    fn created_at_never_reaches_identity() {
        let (instance, meta, provenance) = fixtures();
        let outputs = || vec![RawLensOutput::Tree(NumericTree::from_scalars([3.0]))];
        let a = normalize_batch(
            outputs(),
            &instance,
            &meta,
            &provenance,
            WallClock(1),
        )
        .unwrap();
        let b = normalize_batch(
            outputs(),
            &instance,
            &meta,
            &provenance,
            WallClock(999),
        )
        .unwrap();
        assert_eq!(a[0].draft_id, b[0].draft_id);
        assert_ne!(a[0].created_at, b[0].created_at);
    }
}
