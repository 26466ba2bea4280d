//! Persisted snapshots.
//!
//! The JSON-shaped document `{schemaVersion, workspace, lenses, inventory,
//! desk, selection, persistence, meta}`. Derived state (drafts, errors,
//! caches) is never part of the persisted document - exported snapshots
//! never carry caches.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{
    AuthoritativeState, Desk, Inventory, LensInstance, LensInstanceId, PersistenceMeta, Selection,
    WallClock, Workspace,
};

pub mod migrate;
pub mod persist;

pub use migrate::{MigrateError, migrate, migrate_to_current};
pub use persist::{SnapshotError, export_json, export_state, import_json, import_value};

pub use crate::core::state::CURRENT_SCHEMA_VERSION;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotMeta {
    pub updated_at: Option<String>,
}

/// The persisted document, one section per authoritative-state section.
/// Every section deserializes against fresh defaults so an import from a
/// truncated legacy file back-fills instead of crashing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub schema_version: u32,
    pub workspace: Workspace,
    pub lenses: BTreeMap<LensInstanceId, LensInstance>,
    pub inventory: Inventory,
    pub desk: Desk,
    pub selection: Selection,
    pub persistence: PersistenceMeta,
    pub meta: SnapshotMeta,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            workspace: Workspace::default(),
            lenses: BTreeMap::new(),
            inventory: Inventory::default(),
            desk: Desk::default(),
            selection: Selection::default(),
            persistence: PersistenceMeta::default(),
            meta: SnapshotMeta::default(),
        }
    }
}

impl Snapshot {
    /// Build an export document: authoritative sections only, current
    /// version stamped, dirty flag cleared.
    pub fn from_state(state: &AuthoritativeState, now: WallClock) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            workspace: state.workspace.clone(),
            lenses: state.lenses.clone(),
            inventory: state.inventory.clone(),
            desk: state.desk.clone(),
            selection: state.selection.clone(),
            persistence: PersistenceMeta {
                schema_version: CURRENT_SCHEMA_VERSION,
                dirty: false,
                last_error: state.persistence.last_error.clone(),
            },
            meta: SnapshotMeta {
                updated_at: Some(now.to_rfc3339()),
            },
        }
    }

    /// Rehydrate authoritative state, re-normalized: dangling selection
    /// references and orphaned grid entries are cleared.
    pub fn into_state(self) -> AuthoritativeState {
        let mut state = AuthoritativeState {
            workspace: self.workspace,
            lenses: self.lenses,
            inventory: self.inventory,
            desk: self.desk,
            selection: self.selection,
            persistence: self.persistence,
        };
        state.normalize();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_current_version() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.schema_version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn partial_document_backfills_sections() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"schemaVersion": 6, "workspace": {"rowCount": 4}}"#).unwrap();
        assert_eq!(snapshot.workspace.row_count, 4);
        assert!(snapshot.lenses.is_empty());
        assert!(snapshot.inventory.is_empty());
        assert_eq!(snapshot.selection, Selection::default());
    }

    #[test]
    fn export_clears_dirty_and_stamps_meta() {
        let mut state = AuthoritativeState::default();
        state.persistence.dirty = true;
        let snapshot = Snapshot::from_state(&state, WallClock(0));
        assert!(!snapshot.persistence.dirty);
        assert_eq!(
            snapshot.meta.updated_at.as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
    }
}
