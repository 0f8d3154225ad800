//! Planar positions and the travel-distance seam.
//!
//! Engines never call the world directly for distances; they go through
//! [TravelMetric] so tests can use plain Euclidean distance while the driver
//! adapts the world's routing (which may report that no route exists).

use serde::{Deserialize, Serialize};

/// A point in the simulated world's planar coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to `other`.
    pub fn distance_to(&self, other: Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Travel-distance oracle used by both engines.
///
/// `None` means travel between the two points is impossible (no route).
pub trait TravelMetric {
    fn travel_distance(&self, from: Position, to: Position) -> Option<f64>;
}

/// Straight-line metric; every pair of points is routable.
#[derive(Debug, Default, Clone, Copy)]
pub struct EuclideanMetric;

impl TravelMetric for EuclideanMetric {
    fn travel_distance(&self, from: Position, to: Position) -> Option<f64> {
        Some(from.distance_to(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(b.distance_to(a), 5.0);
    }
}
