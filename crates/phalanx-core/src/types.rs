//! Fundamental geometric and simulation types.
//!
//! The battlefield is the XZ ground plane of a Y-up world. Soldiers live at
//! `y = 0`; everything that measures distance ignores height.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// World position of an entity (meters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub DVec3);

/// Velocity of an entity (m/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub DVec3);

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

/// Project a point onto the ground plane.
pub fn flatten(v: DVec3) -> DVec3 {
    DVec3::new(v.x, 0.0, v.z)
}

impl Position {
    /// Ground position (height dropped).
    pub fn ground(&self) -> DVec3 {
        flatten(self.0)
    }
}

impl SimTime {
    /// Seconds per tick at the fixed tick rate.
    pub fn dt(&self) -> f64 {
        crate::constants::DT
    }

    /// Advance by one tick.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.elapsed_secs += self.dt();
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    /// Smallest box enclosing every point. `None` for an empty set.
    pub fn enclosing(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut aabb = Aabb {
            min: first,
            max: first,
        };
        for p in points {
            aabb.min = aabb.min.min(p);
            aabb.max = aabb.max.max(p);
        }
        Some(aabb)
    }

    /// Grow the ground footprint by `padding` in total (half on each side)
    /// and flatten the box to `height`, centered on the ground.
    pub fn padded(&self, padding: f64, height: f64) -> Self {
        let half = padding / 2.0;
        Aabb {
            min: DVec3::new(self.min.x - half, -height / 2.0, self.min.z - half),
            max: DVec3::new(self.max.x + half, height / 2.0, self.max.z + half),
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Whether a point lies inside the ground footprint of the box.
    pub fn contains_ground(&self, point: DVec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.z >= self.min.z && point.z <= self.max.z
    }
}

/// Team identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u8);

/// Display color (sRGB).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Team identity. Immutable once assigned to a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub color: Rgb,
}

impl Team {
    pub fn new(id: u8, name: impl Into<String>, color: Rgb) -> Self {
        Self {
            id: TeamId(id),
            name: name.into(),
            color,
        }
    }
}
