#![forbid(unsafe_code)]

pub mod api;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod lens;
mod paths;
pub mod snapshot;
pub mod telemetry;

pub use error::{Error, Scope};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    AuthoritativeState, CellKey, Clip, ClipId, CoreError, DerivedState, Desk, Draft, DraftId,
    DraftInvariantError, InputConfig, InputMode, InputPackaging, InputPick, InputRef, Inventory,
    Lane, LaneId, LensId, LensInstance, LensInstanceId, Limits, Material, MaterialId, NumericTree,
    ParamMap, Provenance, RuntimeWarning, Selection, WallClock, Workspace,
};
pub use crate::engine::recompute;
pub use crate::lens::{Lens, LensKind, LensMeta, LensRegistry};
pub use crate::snapshot::{CURRENT_SCHEMA_VERSION, Snapshot};
