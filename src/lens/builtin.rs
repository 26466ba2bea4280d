//! Stock lenses.
//!
//! These exercise the full contract - generator, transformer, packed
//! consumer - with intentionally simple numeric internals. Anything more
//! elaborate belongs in a plug-in crate, not here.

use std::sync::Arc;

use crate::core::{DraftSeed, LensId, NumericTree};

use super::{
    EvalArgs, InputSpec, Lens, LensKind, LensMeta, RawEvalOutput, RawLensOutput, param_f64,
    param_usize,
};

/// All stock lenses, for `LensRegistry::with_builtins`.
pub fn all() -> Vec<Arc<dyn Lens>> {
    vec![
        Arc::new(PulseLens::new()),
        Arc::new(LadderLens::new()),
        Arc::new(OffsetLens::new()),
        Arc::new(SpreadLens::new()),
        Arc::new(BurstLens::new()),
    ]
}

/// `pulse`: a rhythm generator. `steps` pulses at `level`.
pub struct PulseLens {
    meta: LensMeta,
}

impl PulseLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("pulse").expect("valid lens id"),
                name: "Pulse".into(),
                kind: LensKind::Generator,
            },
        }
    }
}

impl Default for PulseLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for PulseLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput {
        let steps = param_usize(args.params, "steps", 8);
        let level = param_f64(args.params, "level", 1.0);
        if steps == 0 {
            return RawEvalOutput::fail(vec!["steps must be at least 1".into()]);
        }
        let seed = DraftSeed {
            draft_type: Some("rhythm".into()),
            payload: Some(NumericTree::from_scalars(
                std::iter::repeat_n(level, steps),
            )),
            ..DraftSeed::default()
        };
        RawEvalOutput::ok(vec![RawLensOutput::DraftLike(seed)])
    }
}

/// `ladder`: a pitch generator. `steps` pitches from `base`, `interval`
/// apart.
pub struct LadderLens {
    meta: LensMeta,
}

impl LadderLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("ladder").expect("valid lens id"),
                name: "Ladder".into(),
                kind: LensKind::Generator,
            },
        }
    }
}

impl Default for LadderLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for LadderLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput {
        let steps = param_usize(args.params, "steps", 4);
        let base = param_f64(args.params, "base", 60.0);
        let interval = param_f64(args.params, "interval", 2.0);
        let values = (0..steps).map(|i| base + interval * i as f64);
        let seed = DraftSeed {
            draft_type: Some("pitchSet".into()),
            payload: Some(NumericTree::from_scalars(values)),
            ..DraftSeed::default()
        };
        RawEvalOutput::ok(vec![RawLensOutput::DraftLike(seed)])
    }
}

/// `offset`: a transformer adding `amount` to every leaf of its single
/// upstream draft.
pub struct OffsetLens {
    meta: LensMeta,
    inputs: [InputSpec; 1],
}

impl OffsetLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("offset").expect("valid lens id"),
                name: "Offset".into(),
                kind: LensKind::Transformer,
            },
            inputs: [InputSpec::required("source")],
        }
    }
}

impl Default for OffsetLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for OffsetLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput {
        let amount = param_f64(args.params, "amount", 0.0);
        let Some(upstream) = args.input.single() else {
            return RawEvalOutput::fail(vec!["no upstream draft to transform".into()]);
        };
        let seed = DraftSeed {
            draft_type: Some(upstream.draft_type.clone()),
            payload: Some(upstream.values.map_leaves(&|v| v + amount)),
            ..DraftSeed::default()
        };
        RawEvalOutput::ok(vec![RawLensOutput::DraftLike(seed)])
    }
}

/// `spread`: a batch transformer. Consumes a packed set and emits one
/// output per packed draft, each scaled by `factor`.
pub struct SpreadLens {
    meta: LensMeta,
    inputs: [InputSpec; 1],
}

impl SpreadLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("spread").expect("valid lens id"),
                name: "Spread".into(),
                kind: LensKind::Transformer,
            },
            inputs: [InputSpec::required("pack")],
        }
    }
}

impl Default for SpreadLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for SpreadLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput {
        let factor = param_f64(args.params, "factor", 1.0);
        let drafts = args
            .input
            .drafts
            .iter()
            .map(|upstream| {
                RawLensOutput::DraftLike(DraftSeed {
                    draft_type: Some(upstream.draft_type.clone()),
                    payload: Some(upstream.values.map_leaves(&|v| v * factor)),
                    ..DraftSeed::default()
                })
            })
            .collect();
        RawEvalOutput::ok(drafts)
    }
}

/// `burst`: a generator emitting `count` single-value drafts. Useful for
/// exercising the batching ceilings; a real patch would use small counts.
pub struct BurstLens {
    meta: LensMeta,
}

impl BurstLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("burst").expect("valid lens id"),
                name: "Burst".into(),
                kind: LensKind::Generator,
            },
        }
    }
}

impl Default for BurstLens {
    fn default() -> Self {
        Self::new()
    }
}

impl Lens for BurstLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput {
        let count = param_usize(args.params, "count", 1);
        let drafts = (0..count)
            .map(|i| RawLensOutput::Tree(NumericTree::from_scalars([i as f64])))
            .collect();
        RawEvalOutput::ok(drafts)
    }
}
