//! Shared test fixtures: a registry with misbehaving lenses alongside the
//! stock set, and session builders with a pinned clock.
#![allow(dead_code)]

use std::sync::Arc;

use lensdesk::api::Session;
use lensdesk::core::{Clock, DraftSeed, Limits, NumericTree, WallClock};
use lensdesk::lens::{
    EvalArgs, InputSpec, Lens, LensKind, LensMeta, RawEvalOutput, RawLensOutput,
};
use lensdesk::{LensId, LensRegistry};

pub const FIXED_NOW: WallClock = WallClock(1_726_000_000_000);

/// `badbatch`: emits `count` valid outputs and then one NaN payload.
pub struct BadBatchLens {
    meta: LensMeta,
}

impl BadBatchLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("badbatch").unwrap(),
                name: "Bad Batch".into(),
                kind: LensKind::Generator,
            },
        }
    }
}

impl Lens for BadBatchLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput {
        let count = args
            .params
            .get("count")
            .and_then(|v| v.as_u64())
            .unwrap_or(3) as usize;
        let mut drafts: Vec<RawLensOutput> = (0..count)
            .map(|i| RawLensOutput::Tree(NumericTree::from_scalars([i as f64])))
            .collect();
        drafts.push(RawLensOutput::Tree(NumericTree::from_scalars([f64::NAN])));
        RawEvalOutput::ok(drafts)
    }
}

/// `panicky`: always panics inside evaluate.
pub struct PanickyLens {
    meta: LensMeta,
}

impl PanickyLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("panicky").unwrap(),
                name: "Panicky".into(),
                kind: LensKind::Transformer,
            },
        }
    }
}

impl Lens for PanickyLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn evaluate(&self, _args: EvalArgs<'_>) -> RawEvalOutput {
        panic!("fixture lens exploded")
    }
}

/// `sink`: a transformer that reports how many drafts it was handed.
pub struct SinkLens {
    meta: LensMeta,
    inputs: [InputSpec; 1],
}

impl SinkLens {
    pub fn new() -> Self {
        Self {
            meta: LensMeta {
                id: LensId::parse("sink").unwrap(),
                name: "Sink".into(),
                kind: LensKind::Transformer,
            },
            inputs: [InputSpec::required("pack")],
        }
    }
}

impl Lens for SinkLens {
    fn meta(&self) -> &LensMeta {
        &self.meta
    }

    fn inputs(&self) -> &[InputSpec] {
        &self.inputs
    }

    fn evaluate(&self, args: EvalArgs<'_>) -> RawEvalOutput {
        let seed = DraftSeed {
            draft_type: Some("count".into()),
            payload: Some(NumericTree::from_scalars([args.input.drafts.len() as f64])),
            ..DraftSeed::default()
        };
        RawEvalOutput::ok(vec![RawLensOutput::DraftLike(seed)])
    }
}

pub fn registry() -> LensRegistry {
    let mut registry = LensRegistry::with_builtins();
    registry.register(Arc::new(BadBatchLens::new())).unwrap();
    registry.register(Arc::new(PanickyLens::new())).unwrap();
    registry.register(Arc::new(SinkLens::new())).unwrap();
    registry
}

pub fn session() -> Session {
    session_with_limits(Limits::default())
}

pub fn session_with_limits(limits: Limits) -> Session {
    Session::new(registry(), limits)
        .unwrap()
        .with_clock(Clock::Fixed(FIXED_NOW))
}

pub fn lens(id: &str) -> LensId {
    LensId::parse(id).unwrap()
}
