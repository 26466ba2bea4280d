//! The grid: named lanes × fixed rows.
//!
//! A cell maps `(laneId, row)` to at most one lens instance; `placements`
//! is the reverse side table for quick lookup by instance. Row order within
//! a lane doubles as the dependency order: an instance may only consume
//! output from a strictly-earlier row. That invariant is enforced by input
//! resolution, not by a separate topological sort.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{CoreError, GridError};
use super::identity::{CellKey, LaneId, LensInstanceId};

pub const DEFAULT_ROW_COUNT: u32 = 8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub id: LaneId,
    pub name: String,
}

/// Where an instance sits, from the reverse side table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRef {
    pub lane_id: LaneId,
    pub row: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Workspace {
    pub lanes: Vec<Lane>,
    pub row_count: u32,
    #[serde(default)]
    pub cells: BTreeMap<CellKey, LensInstanceId>,
    #[serde(default)]
    pub placements: BTreeMap<LensInstanceId, CellRef>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            lanes: Vec::new(),
            row_count: DEFAULT_ROW_COUNT,
            cells: BTreeMap::new(),
            placements: BTreeMap::new(),
        }
    }
}

impl Workspace {
    pub fn new(row_count: u32) -> Self {
        Self {
            row_count,
            ..Self::default()
        }
    }

    pub fn lane(&self, id: &LaneId) -> Option<&Lane> {
        self.lanes.iter().find(|l| &l.id == id)
    }

    pub fn add_lane(&mut self, lane: Lane) {
        if self.lane(&lane.id).is_none() {
            self.lanes.push(lane);
        }
    }

    /// Remove a lane, returning the instance ids that occupied it.
    pub fn remove_lane(&mut self, id: &LaneId) -> Vec<LensInstanceId> {
        self.lanes.retain(|l| &l.id != id);
        let evicted: Vec<LensInstanceId> = self
            .cells
            .iter()
            .filter(|(key, _)| &key.lane == id)
            .map(|(_, inst)| inst.clone())
            .collect();
        self.cells.retain(|key, _| &key.lane != id);
        for inst in &evicted {
            self.placements.remove(inst);
        }
        evicted
    }

    pub fn instance_at(&self, key: &CellKey) -> Option<&LensInstanceId> {
        self.cells.get(key)
    }

    pub fn cell_of(&self, id: &LensInstanceId) -> Option<&CellRef> {
        self.placements.get(id)
    }

    /// Place an instance, keeping both tables in step.
    pub fn place(&mut self, key: CellKey, id: LensInstanceId) -> Result<(), CoreError> {
        if self.lane(&key.lane).is_none() {
            return Err(GridError::UnknownLane {
                lane: key.lane.to_string(),
            }
            .into());
        }
        if key.row >= self.row_count {
            return Err(GridError::RowOutOfRange {
                row: key.row,
                row_count: self.row_count,
            }
            .into());
        }
        if self.cells.contains_key(&key) {
            return Err(GridError::CellOccupied {
                cell: key.to_string(),
            }
            .into());
        }
        self.placements.insert(
            id.clone(),
            CellRef {
                lane_id: key.lane.clone(),
                row: key.row,
            },
        );
        self.cells.insert(key, id);
        Ok(())
    }

    /// Clear a cell, returning the evicted instance id.
    pub fn remove_at(&mut self, key: &CellKey) -> Option<LensInstanceId> {
        let id = self.cells.remove(key)?;
        self.placements.remove(&id);
        Some(id)
    }

    /// Clear whatever cell an instance occupies.
    pub fn remove_instance(&mut self, id: &LensInstanceId) -> Option<CellRef> {
        let cell = self.placements.remove(id)?;
        self.cells
            .remove(&CellKey::new(cell.lane_id.clone(), cell.row));
        Some(cell)
    }

    /// The nearest upstream producer: the last occupied row strictly above
    /// `row` in `lane`.
    pub fn nearest_upstream(&self, lane: &LaneId, row: u32) -> Option<&LensInstanceId> {
        (0..row)
            .rev()
            .find_map(|r| self.cells.get(&CellKey::new(lane.clone(), r)))
    }

    /// Occupied cells in the fixed walk order: lanes in lane order, rows
    /// ascending within a lane. This total order is the dependency order.
    pub fn walk_order(&self) -> Vec<(CellRef, LensInstanceId)> {
        let mut out = Vec::with_capacity(self.cells.len());
        for lane in &self.lanes {
            for row in 0..self.row_count {
                if let Some(id) = self.cells.get(&CellKey::new(lane.id.clone(), row)) {
                    out.push((
                        CellRef {
                            lane_id: lane.id.clone(),
                            row,
                        },
                        id.clone(),
                    ));
                }
            }
        }
        out
    }

    /// Rebuild the reverse table from `cells` and drop cells that point
    /// outside the grid. Used after import.
    pub fn normalize(&mut self) {
        let row_count = self.row_count;
        let lane_ids: Vec<LaneId> = self.lanes.iter().map(|l| l.id.clone()).collect();
        self.cells
            .retain(|key, _| key.row < row_count && lane_ids.contains(&key.lane));
        self.placements = self
            .cells
            .iter()
            .map(|(key, id)| {
                (
                    id.clone(),
                    CellRef {
                        lane_id: key.lane.clone(),
                        row: key.row,
                    },
                )
            })
            .collect();
    }
}
