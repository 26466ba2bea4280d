//! The command surface.
//!
//! `Session` is the single owner of both state halves and enforces the
//! ownership rule: the reducer methods here are the only writers of
//! authoritative state, and the recompute engine is the only writer of
//! derived state. Every authoritative edit marks the store dirty and
//! triggers a fresh pass; a pass runs to completion before any caller
//! observes the result.

use tracing::debug;

use crate::core::{
    AuthoritativeState, CellKey, Clip, ClipId, ClipOpts, Clock, CoreError, DerivedState, DraftId,
    InputConfig, LaneId, Lane, LensId, LensInstance, LensInstanceId, Limits, LookupError, Material,
    MaterialId, MaterialOpts, ParamMap, assert_clip, assert_material, make_clip_from_material,
    make_material_from_draft,
};
use crate::engine::{RecomputeContext, recompute};
use crate::lens::LensRegistry;
use crate::snapshot::{export_json, import_json};
use crate::{Error, Result};

pub struct Session {
    state: AuthoritativeState,
    derived: DerivedState,
    registry: LensRegistry,
    limits: Limits,
    clock: Clock,
}

impl Session {
    pub fn new(registry: LensRegistry, limits: Limits) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            state: AuthoritativeState::default(),
            derived: DerivedState::default(),
            registry,
            limits,
            clock: Clock::System,
        })
    }

    /// Pin every timestamp this session produces. Tests use this to make
    /// passes byte-for-byte reproducible.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &AuthoritativeState {
        &self.state
    }

    pub fn derived(&self) -> &DerivedState {
        &self.derived
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Re-run the engine against the current authoritative state. Safe to
    /// call at any time; a pass with unchanged input reproduces the same
    /// derived snapshot.
    pub fn recompute_now(&mut self) {
        let ctx = RecomputeContext {
            registry: &self.registry,
            limits: &self.limits,
            now: self.clock.now(),
        };
        self.derived = recompute(&self.state, &self.derived, &ctx);
    }

    fn touch(&mut self) {
        self.state.persistence.dirty = true;
        self.recompute_now();
    }

    // =========================================================================
    // Grid edits
    // =========================================================================

    /// Resize the grid. Shrinking drops instances below the new bound.
    pub fn set_row_count(&mut self, rows: u32) {
        self.state.workspace.row_count = rows.max(1);
        let evicted: Vec<LensInstanceId> = self
            .state
            .workspace
            .placements
            .iter()
            .filter(|(_, cell)| cell.row >= self.state.workspace.row_count)
            .map(|(id, _)| id.clone())
            .collect();
        for id in evicted {
            self.state.remove_instance(&id);
        }
        self.touch();
    }

    pub fn add_lane(&mut self, name: &str) -> LaneId {
        let lane = Lane {
            id: LaneId::generate(),
            name: name.to_string(),
        };
        let id = lane.id.clone();
        self.state.workspace.add_lane(lane);
        self.touch();
        id
    }

    pub fn remove_lane(&mut self, id: &LaneId) {
        let evicted = self.state.workspace.remove_lane(id);
        for instance in evicted {
            self.state.remove_instance(&instance);
        }
        if self.state.selection.focused_lane.as_ref() == Some(id) {
            self.state.selection.focused_lane = None;
        }
        self.touch();
    }

    /// Place a new instance of `lens_id` at `(lane, row)`.
    pub fn place_lens(
        &mut self,
        lane: &LaneId,
        row: u32,
        lens_id: &LensId,
        params: ParamMap,
    ) -> Result<LensInstanceId> {
        if !self.registry.contains(lens_id) {
            return Err(Error::Core(
                LookupError::Lens {
                    id: lens_id.to_string(),
                }
                .into(),
            ));
        }
        let instance = LensInstance::new(lens_id.clone(), params);
        let id = instance.id.clone();
        self.state
            .workspace
            .place(CellKey::new(lane.clone(), row), id.clone())
            .map_err(Error::Core)?;
        self.state.lenses.insert(id.clone(), instance);
        debug!(instance = %id, lens = %lens_id, %lane, row, "placed lens");
        self.touch();
        Ok(id)
    }

    /// Delete an instance; cascades to the cell and any selection on it.
    pub fn remove_lens(&mut self, id: &LensInstanceId) -> Result<()> {
        if self.state.remove_instance(id).is_none() {
            return Err(lookup_instance(id));
        }
        self.touch();
        Ok(())
    }

    pub fn set_params(&mut self, id: &LensInstanceId, params: ParamMap) -> Result<()> {
        self.state.instance_mut(id).map_err(Error::Core)?.params = params;
        self.touch();
        Ok(())
    }

    pub fn set_input(&mut self, id: &LensInstanceId, input: InputConfig) -> Result<()> {
        self.state.instance_mut(id).map_err(Error::Core)?.input = input;
        self.touch();
        Ok(())
    }

    /// Pin an instance to one draft id.
    pub fn pin_input(&mut self, id: &LensInstanceId, draft_id: DraftId) -> Result<()> {
        self.set_input(id, InputConfig::pinned(draft_id))
    }

    // =========================================================================
    // Draft cursor
    // =========================================================================

    /// Make one of an instance's committed drafts the active one.
    pub fn set_active_draft(&mut self, id: &LensInstanceId, draft_id: &DraftId) -> Result<()> {
        let slot = self
            .derived
            .slots
            .get_mut(id)
            .ok_or_else(|| lookup_instance(id))?;
        if !slot.draft_order.contains(draft_id) {
            return Err(lookup_draft(draft_id));
        }
        slot.active_draft = Some(draft_id.clone());
        Ok(())
    }

    /// Replace an instance's selected-draft set. Unknown ids are rejected;
    /// the set survives later passes by content-addressed intersection.
    pub fn select_drafts(&mut self, id: &LensInstanceId, drafts: Vec<DraftId>) -> Result<()> {
        let slot = self
            .derived
            .slots
            .get_mut(id)
            .ok_or_else(|| lookup_instance(id))?;
        if let Some(unknown) = drafts.iter().find(|d| !slot.draft_order.contains(d)) {
            return Err(lookup_draft(unknown));
        }
        slot.selected_drafts = drafts;
        Ok(())
    }

    // =========================================================================
    // Inventory and desk
    // =========================================================================

    /// Promote a committed draft into a material.
    pub fn promote_draft(
        &mut self,
        draft_id: &DraftId,
        name: Option<String>,
    ) -> Result<MaterialId> {
        let Some(draft) = self.derived.draft(draft_id) else {
            return Err(lookup_draft(draft_id));
        };
        let material = make_material_from_draft(draft, MaterialOpts { name }, self.clock.now());
        assert_material(&material).map_err(|e| Error::Core(CoreError::from(e)))?;
        let id = material.material_id.clone();
        self.state.inventory.insert(material);
        self.touch();
        Ok(id)
    }

    pub fn material(&self, id: &MaterialId) -> Option<&Material> {
        self.state.inventory.get(id)
    }

    /// Place a material on the desk as a timed clip.
    pub fn place_clip(
        &mut self,
        material_id: &MaterialId,
        lane: LaneId,
        start: f64,
        duration: f64,
    ) -> Result<ClipId> {
        if self.state.inventory.get(material_id).is_none() {
            return Err(Error::Core(
                LookupError::Material {
                    id: material_id.to_string(),
                }
                .into(),
            ));
        }
        let clip = make_clip_from_material(
            material_id.clone(),
            ClipOpts {
                lane,
                start,
                duration,
            },
        );
        assert_clip(&clip).map_err(|e| Error::Core(CoreError::from(e)))?;
        let id = clip.clip_id.clone();
        self.state.desk.insert(clip);
        self.touch();
        Ok(id)
    }

    pub fn remove_clip(&mut self, id: &ClipId) -> Result<Clip> {
        let removed = self.state.desk.remove(id).ok_or_else(|| {
            Error::Core(
                LookupError::Clip {
                    id: id.to_string(),
                }
                .into(),
            )
        })?;
        self.touch();
        Ok(removed)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Export the authoritative state; clears the dirty flag on success.
    pub fn export(&mut self) -> Result<String> {
        let text = export_json(&self.state, self.clock.now())?;
        self.state.persistence.dirty = false;
        self.state.persistence.last_error = None;
        Ok(text)
    }

    /// Replace the session's state with an imported snapshot and recompute.
    /// A failed import leaves the session untouched apart from `last_error`.
    pub fn import(&mut self, text: &str) -> Result<()> {
        match import_json(text) {
            Ok(state) => {
                self.state = state;
                self.derived = DerivedState::default();
                self.recompute_now();
                Ok(())
            }
            Err(err) => {
                self.state.persistence.last_error = Some(err.to_string());
                Err(err.into())
            }
        }
    }
}

fn lookup_instance(id: &LensInstanceId) -> Error {
    Error::Core(
        LookupError::LensInstance {
            id: id.to_string(),
        }
        .into(),
    )
}

fn lookup_draft(id: &DraftId) -> Error {
    Error::Core(
        LookupError::Draft {
            id: id.to_string(),
        }
        .into(),
    )
}
