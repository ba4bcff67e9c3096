//! Uniform-grid neighbor index on the ground plane.
//!
//! Rebuilt once per tick from committed positions. Entries are copies, so a
//! query result stays valid while the same tick mutates the world.

use std::collections::HashMap;

use glam::DVec3;
use hecs::{Entity, World};

use phalanx_core::components::Obstacle;
use phalanx_core::types::{Position, TeamId};

use crate::components::SoldierAgent;

/// What occupies a grid entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupantKind {
    Obstacle,
    Soldier { team: TeamId, unit: Entity },
}

/// A copied entry of the index.
#[derive(Debug, Clone, Copy)]
pub struct Occupant {
    pub entity: Entity,
    pub position: DVec3,
    pub kind: OccupantKind,
}

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f64,
    pub(crate) cells: HashMap<(i32, i32), Vec<Occupant>>,
    len: usize,
}

impl SpatialIndex {
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size: cell_size.max(f64::EPSILON),
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Rebuild from every soldier and obstacle in the world.
    pub fn rebuild(&mut self, world: &World) {
        self.clear();
        for (entity, (pos, _obstacle)) in world.query::<(&Position, &Obstacle)>().iter() {
            self.insert(Occupant {
                entity,
                position: pos.ground(),
                kind: OccupantKind::Obstacle,
            });
        }
        for (entity, (pos, agent)) in world.query::<(&Position, &SoldierAgent)>().iter() {
            self.insert(Occupant {
                entity,
                position: pos.ground(),
                kind: OccupantKind::Soldier {
                    team: agent.team,
                    unit: agent.unit,
                },
            });
        }
    }

    /// Empty the index. Cells occupied since the previous clear keep their
    /// allocation; the rest are dropped.
    pub fn clear(&mut self) {
        self.cells.retain(|_, cell| !cell.is_empty());
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.len = 0;
    }

    pub fn insert(&mut self, occupant: Occupant) {
        let key = self.cell_of(occupant.position);
        self.cells.entry(key).or_default().push(occupant);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Visit every entry within `radius` of `point` (ground distance).
    /// Cells are walked row by row, entries in insertion order.
    pub fn for_each_nearby(&self, point: DVec3, radius: f64, mut f: impl FnMut(&Occupant)) {
        let (min_cx, min_cz) = self.cell_of(point - DVec3::new(radius, 0.0, radius));
        let (max_cx, max_cz) = self.cell_of(point + DVec3::new(radius, 0.0, radius));
        let radius_sq = radius * radius;
        for cz in min_cz..=max_cz {
            for cx in min_cx..=max_cx {
                let Some(cell) = self.cells.get(&(cx, cz)) else {
                    continue;
                };
                for occupant in cell {
                    let dx = occupant.position.x - point.x;
                    let dz = occupant.position.z - point.z;
                    if dx * dx + dz * dz <= radius_sq {
                        f(occupant);
                    }
                }
            }
        }
    }

    /// Snapshot of the entries within `radius` of `point`.
    pub fn query_neighbors(&self, point: DVec3, radius: f64) -> Vec<Occupant> {
        let mut found = Vec::new();
        self.for_each_nearby(point, radius, |o| found.push(*o));
        found
    }

    fn cell_of(&self, point: DVec3) -> (i32, i32) {
        (
            (point.x / self.cell_size).floor() as i32,
            (point.z / self.cell_size).floor() as i32,
        )
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(phalanx_core::constants::SPATIAL_CELL_SIZE)
    }
}
