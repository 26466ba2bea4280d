//! Core domain types for lensdesk
//!
//! Module hierarchy follows type dependency order:
//! - time: wall-clock capture (Layer 0)
//! - identity: LaneId, LensId, LensInstanceId, DraftId, CellKey (Layer 1)
//! - json_canon / hash: canonical serialization + content addressing (Layer 2)
//! - tree: numeric-tree payloads (Layer 3)
//! - instance: lens instances and input wiring (Layer 4)
//! - draft: drafts, provenance, stable identity (Layer 5)
//! - material: materials and clips (Layer 6)
//! - workspace: the lane/row grid (Layer 7)
//! - limits: batching ceilings (Layer 8)
//! - state / derived: authoritative and derived snapshots (Layer 9)

pub mod derived;
pub mod draft;
pub mod error;
pub mod hash;
pub mod identity;
pub mod instance;
pub mod json_canon;
pub mod limits;
pub mod material;
pub mod state;
pub mod time;
pub mod tree;
pub mod workspace;

pub use derived::{DerivedState, InstanceSlot, RuntimeWarning};
pub use draft::{
    Draft, DraftIdentity, DraftSeed, InputRef, Payload, PayloadKind, Provenance, assert_draft,
    build_draft_key, make_draft, params_hash,
};
pub use error::{
    CeilingError, CoreError, DraftInvariantError, GridError, InvalidId, LookupError,
};
pub use hash::{content_hash_hex, fnv1a32};
pub use identity::{CellKey, ClipId, DraftId, LaneId, LensId, LensInstanceId, MaterialId};
pub use instance::{InputConfig, InputMode, InputPackaging, InputPick, LensInstance, ParamMap};
pub use json_canon::{CanonJsonError, to_canon_json_bytes};
pub use limits::Limits;
pub use material::{
    Clip, ClipOpts, Material, MaterialOpts, MaterialProvenance, assert_clip, assert_material,
    make_clip_from_material, make_material_from_draft,
};
pub use state::{
    AuthoritativeState, CURRENT_SCHEMA_VERSION, Desk, Inventory, PersistenceMeta, Selection,
};
pub use time::{Clock, WallClock};
pub use tree::{NumericTree, assert_finite, assert_numeric_tree};
pub use workspace::{CellRef, DEFAULT_ROW_COUNT, Lane, Workspace};
