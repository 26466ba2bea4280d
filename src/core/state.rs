//! Authoritative state: the single source of truth.
//!
//! Exclusively written by the reducer layer (`api::Session`); the engine
//! only reads it. Inventory and desk keep insertion order - promoted
//! materials and placed clips appear in the order the user created them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, LookupError};
use super::identity::{ClipId, DraftId, LaneId, LensInstanceId, MaterialId};
use super::instance::LensInstance;
use super::material::{Clip, Material};
use super::workspace::Workspace;

/// Insertion-ordered material store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Material>", into = "Vec<Material>")]
pub struct Inventory {
    order: Vec<MaterialId>,
    by_id: BTreeMap<MaterialId, Material>,
}

impl Inventory {
    pub fn insert(&mut self, material: Material) {
        let id = material.material_id.clone();
        if self.by_id.insert(id.clone(), material).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &MaterialId) -> Option<&Material> {
        self.by_id.get(id)
    }

    pub fn remove(&mut self, id: &MaterialId) -> Option<Material> {
        let removed = self.by_id.remove(id);
        if removed.is_some() {
            self.order.retain(|m| m != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Materials in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }
}

impl From<Vec<Material>> for Inventory {
    fn from(items: Vec<Material>) -> Self {
        let mut inventory = Inventory::default();
        for item in items {
            inventory.insert(item);
        }
        inventory
    }
}

impl From<Inventory> for Vec<Material> {
    fn from(inventory: Inventory) -> Self {
        inventory.iter().cloned().collect()
    }
}

/// Insertion-ordered clip store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Clip>", into = "Vec<Clip>")]
pub struct Desk {
    order: Vec<ClipId>,
    by_id: BTreeMap<ClipId, Clip>,
}

impl Desk {
    pub fn insert(&mut self, clip: Clip) {
        let id = clip.clip_id.clone();
        if self.by_id.insert(id.clone(), clip).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &ClipId) -> Option<&Clip> {
        self.by_id.get(id)
    }

    pub fn remove(&mut self, id: &ClipId) -> Option<Clip> {
        let removed = self.by_id.remove(id);
        if removed.is_some() {
            self.order.retain(|c| c != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Clip> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    /// Drop clips whose material no longer exists.
    pub fn retain_materials(&mut self, inventory: &Inventory) {
        let dead: Vec<ClipId> = self
            .by_id
            .values()
            .filter(|clip| inventory.get(&clip.material_id).is_none())
            .map(|clip| clip.clip_id.clone())
            .collect();
        for id in dead {
            self.remove(&id);
        }
    }
}

impl From<Vec<Clip>> for Desk {
    fn from(items: Vec<Clip>) -> Self {
        let mut desk = Desk::default();
        for item in items {
            desk.insert(item);
        }
        desk
    }
}

impl From<Desk> for Vec<Clip> {
    fn from(desk: Desk) -> Self {
        desk.iter().cloned().collect()
    }
}

/// Transient cursor state. Persisted only as a convenience restore; never
/// authoritative beyond that.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Selection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_lane: Option<LaneId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_instance: Option<LensInstanceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused_draft: Option<DraftId>,
}

/// The schema version this build writes and reads natively.
pub const CURRENT_SCHEMA_VERSION: u32 = 6;

/// Persistence bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistenceMeta {
    pub schema_version: u32,
    pub dirty: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl Default for PersistenceMeta {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            dirty: false,
            last_error: None,
        }
    }
}

/// The hand-edited source of truth.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthoritativeState {
    pub workspace: Workspace,
    pub lenses: BTreeMap<LensInstanceId, LensInstance>,
    pub inventory: Inventory,
    pub desk: Desk,
    pub selection: Selection,
    pub persistence: PersistenceMeta,
}

impl AuthoritativeState {
    pub fn instance(&self, id: &LensInstanceId) -> Result<&LensInstance, CoreError> {
        self.lenses.get(id).ok_or_else(|| {
            LookupError::LensInstance {
                id: id.to_string(),
            }
            .into()
        })
    }

    pub fn instance_mut(&mut self, id: &LensInstanceId) -> Result<&mut LensInstance, CoreError> {
        self.lenses.get_mut(id).ok_or_else(|| {
            LookupError::LensInstance {
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Delete an instance: clears its cell and cascades to any selection
    /// referencing it.
    pub fn remove_instance(&mut self, id: &LensInstanceId) -> Option<LensInstance> {
        self.workspace.remove_instance(id);
        let removed = self.lenses.remove(id);
        if removed.is_some() && self.selection.focused_instance.as_ref() == Some(id) {
            self.selection.focused_instance = None;
            self.selection.focused_draft = None;
        }
        removed
    }

    /// Structural re-normalization after import: grid tables rebuilt,
    /// instances without a cell dropped, cells without an instance cleared,
    /// dangling selection references cleared, dangling clips dropped.
    pub fn normalize(&mut self) {
        self.workspace.normalize();

        let placed: Vec<LensInstanceId> = self.workspace.placements.keys().cloned().collect();
        self.lenses.retain(|id, _| placed.contains(id));
        let lenses = &self.lenses;
        self.workspace.cells.retain(|_, id| lenses.contains_key(id));
        self.workspace
            .placements
            .retain(|id, _| lenses.contains_key(id));

        self.desk.retain_materials(&self.inventory);

        if let Some(lane) = &self.selection.focused_lane
            && self.workspace.lane(lane).is_none()
        {
            self.selection.focused_lane = None;
        }
        if let Some(instance) = &self.selection.focused_instance
            && !self.lenses.contains_key(instance)
        {
            self.selection.focused_instance = None;
            self.selection.focused_draft = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::{CellKey, LensId};
    use crate::core::material::{MaterialOpts, make_material_from_draft};
    use crate::core::time::WallClock;
    use crate::core::workspace::Lane;

    fn state_with_instance() -> (AuthoritativeState, LensInstanceId) {
        let mut state = AuthoritativeState::default();
        let lane = LaneId::parse("melody").unwrap();
        state.workspace.add_lane(Lane {
            id: lane.clone(),
            name: "melody".into(),
        });
        let instance = LensInstance::new(LensId::parse("pulse").unwrap(), Default::default());
        let id = instance.id.clone();
        state
            .workspace
            .place(CellKey::new(lane, 0), id.clone())
            .unwrap();
        state.lenses.insert(id.clone(), instance);
        (state, id)
    }

    #[test]
    fn remove_instance_cascades_to_selection() {
        let (mut state, id) = state_with_instance();
        state.selection.focused_instance = Some(id.clone());
        state.selection.focused_draft = Some(DraftId::from_hash(7));

        state.remove_instance(&id);
        assert!(state.lenses.is_empty());
        assert!(state.workspace.cells.is_empty());
        assert!(state.selection.focused_instance.is_none());
        assert!(state.selection.focused_draft.is_none());
    }

    #[test]
    fn normalize_drops_unplaced_instances_and_dangling_selection() {
        let (mut state, _id) = state_with_instance();
        // An instance that exists in the map but occupies no cell.
        let stray = LensInstance::new(LensId::parse("pulse").unwrap(), Default::default());
        let stray_id = stray.id.clone();
        state.lenses.insert(stray_id.clone(), stray);
        state.selection.focused_instance = Some(stray_id.clone());

        state.normalize();
        assert!(!state.lenses.contains_key(&stray_id));
        assert!(state.selection.focused_instance.is_none());
    }

    #[test]
    fn inventory_keeps_insertion_order() {
        use crate::core::draft::{DraftSeed, Provenance, make_draft};
        use crate::core::tree::NumericTree;

        let mut inventory = Inventory::default();
        for i in 0..3u32 {
            let draft = make_draft(
                DraftSeed {
                    payload: Some(NumericTree::from_scalars([f64::from(i)])),
                    summary: Some(format!("m{i}")),
                    ..DraftSeed::default()
                },
                DraftId::from_hash(i),
                LensInstanceId::generate(),
                Provenance {
                    lens_type: "pulse".into(),
                    params_hash: "00000000".into(),
                    input_refs: vec![],
                    created_at: WallClock(0),
                },
                WallClock(0),
            );
            inventory.insert(make_material_from_draft(
                &draft,
                MaterialOpts::default(),
                WallClock(0),
            ));
        }
        assert_eq!(inventory.len(), 3);
        let names: Vec<&str> = inventory.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["m0", "m1", "m2"]);
    }
}
