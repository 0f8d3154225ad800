//! Static nearest-station index.
//!
//! Built once from the configured station set (rebuild on station changes).
//! Backed by an R-tree over station coordinates; queries return the station
//! minimizing Euclidean distance, ties broken by lowest station identity for
//! determinism.

use std::collections::BTreeMap;

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::geo::Position;
use crate::ids::StationId;

/// A station as configured: identity plus location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub location: Position,
}

/// Entry stored in the R-tree: a 2-D point with the station identity.
#[derive(Debug, Clone)]
struct StationEntry {
    point: [f64; 2],
    id: StationId,
}

impl RTreeObject for StationEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Immutable nearest-station lookup over the configured station set.
#[derive(Debug, Default)]
pub struct StationIndex {
    tree: RTree<StationEntry>,
    positions: BTreeMap<StationId, Position>,
}

impl StationIndex {
    /// Build the index from the full station set.
    pub fn build(stations: &[Station]) -> Self {
        let positions: BTreeMap<StationId, Position> =
            stations.iter().map(|s| (s.id, s.location)).collect();
        let entries: Vec<StationEntry> = positions
            .iter()
            .map(|(&id, &location)| StationEntry {
                point: [location.x, location.y],
                id,
            })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            positions,
        }
    }

    /// The station closest to `position`; lowest identity wins exact
    /// distance ties. `None` when no stations are loaded.
    pub fn nearest_station(&self, position: Position) -> Option<StationId> {
        let query = [position.x, position.y];
        let mut candidates = self.tree.nearest_neighbor_iter_with_distance_2(&query);
        let (first, best_d2) = candidates.next()?;
        let mut best = first.id;
        for (entry, d2) in candidates {
            if d2 > best_d2 {
                break;
            }
            if entry.id < best {
                best = entry.id;
            }
        }
        Some(best)
    }

    pub fn station_position(&self, id: StationId) -> Option<Position> {
        self.positions.get(&id).copied()
    }

    /// Station identities in ascending order.
    pub fn station_ids(&self) -> impl Iterator<Item = StationId> + '_ {
        self.positions.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_stations() -> Vec<Station> {
        vec![
            Station {
                id: StationId(1),
                location: Position::new(0.0, 0.0),
            },
            Station {
                id: StationId(2),
                location: Position::new(10.0, 0.0),
            },
            Station {
                id: StationId(3),
                location: Position::new(0.0, 10.0),
            },
        ]
    }

    #[test]
    fn finds_nearest_station() {
        let index = StationIndex::build(&grid_stations());
        assert_eq!(
            index.nearest_station(Position::new(1.0, 1.0)),
            Some(StationId(1))
        );
        assert_eq!(
            index.nearest_station(Position::new(9.0, 1.0)),
            Some(StationId(2))
        );
    }

    #[test]
    fn exact_ties_break_to_lowest_id() {
        // (5, 0) is equidistant from stations 1 and 2.
        let index = StationIndex::build(&grid_stations());
        assert_eq!(
            index.nearest_station(Position::new(5.0, 0.0)),
            Some(StationId(1))
        );
    }

    #[test]
    fn empty_index_returns_none() {
        let index = StationIndex::build(&[]);
        assert!(index.nearest_station(Position::new(0.0, 0.0)).is_none());
        assert!(index.is_empty());
    }
}
