//! The recomputation engine.
//!
//! Exclusively writes derived state; reads authoritative state. Split by
//! responsibility:
//! - resolve: which upstream draft(s) an instance consumes
//! - host: contained invocation of one lens's evaluate
//! - normalize: raw output into content-addressed drafts
//! - provenance: lineage stamping
//! - recompute: the pass itself

pub mod host;
pub mod normalize;
pub mod provenance;
pub mod recompute;
pub mod resolve;

pub use host::{DraftSet, EvaluationError, evaluate_lens};
pub use normalize::{NormalizeError, normalize_batch};
pub use provenance::build_provenance;
pub use recompute::{RecomputeContext, recompute};
pub use resolve::{ResolveError, ResolveReason, ResolvedInput, resolve_input};
