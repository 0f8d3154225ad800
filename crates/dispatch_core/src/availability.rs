//! The set of currently dispatchable vehicles and their station affiliation.
//!
//! Invariants maintained here:
//! - a vehicle is in at most one station's idle set at any instant;
//! - every vehicle in a station's idle set is also in the available set
//!   (affiliation outlives availability, idle membership does not).

use std::collections::{BTreeMap, BTreeSet};

use crate::ids::{StationId, VehicleId};

/// Tracks which vehicles are free to dispatch and where they sit.
#[derive(Debug, Default, Clone)]
pub struct AvailabilityTracker {
    available: BTreeSet<VehicleId>,
    home_station: BTreeMap<VehicleId, StationId>,
    idle_at_station: BTreeMap<StationId, BTreeSet<VehicleId>>,
}

impl AvailabilityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a station visible in occupancy reports even while empty.
    pub fn register_station(&mut self, station: StationId) {
        self.idle_at_station.entry(station).or_default();
    }

    /// Mark a vehicle dispatchable. If it is affiliated with a station it
    /// joins that station's idle set.
    pub fn insert_available(&mut self, vehicle: VehicleId) {
        self.available.insert(vehicle);
        if let Some(&station) = self.home_station.get(&vehicle) {
            self.idle_at_station.entry(station).or_default().insert(vehicle);
        }
    }

    /// Take a vehicle out of circulation (dispatched or rebalancing).
    /// Affiliation is kept so the vehicle rejoins the right station later.
    pub fn remove_available(&mut self, vehicle: VehicleId) -> bool {
        let was_available = self.available.remove(&vehicle);
        if let Some(&station) = self.home_station.get(&vehicle) {
            if let Some(idle) = self.idle_at_station.get_mut(&station) {
                idle.remove(&vehicle);
            }
        }
        was_available
    }

    pub fn is_available(&self, vehicle: VehicleId) -> bool {
        self.available.contains(&vehicle)
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Dispatchable vehicles in ascending identity order.
    pub fn available_vehicles(&self) -> impl Iterator<Item = VehicleId> + '_ {
        self.available.iter().copied()
    }

    /// Re-affiliate a vehicle, moving its idle membership when available.
    pub fn set_station(&mut self, vehicle: VehicleId, station: StationId) {
        if let Some(old) = self.home_station.insert(vehicle, station) {
            if let Some(idle) = self.idle_at_station.get_mut(&old) {
                idle.remove(&vehicle);
            }
        }
        if self.available.contains(&vehicle) {
            self.idle_at_station.entry(station).or_default().insert(vehicle);
        } else {
            self.idle_at_station.entry(station).or_default();
        }
    }

    pub fn station_of(&self, vehicle: VehicleId) -> Option<StationId> {
        self.home_station.get(&vehicle).copied()
    }

    /// Idle vehicles at a station, ascending identity order.
    pub fn idle_vehicles(&self, station: StationId) -> Vec<VehicleId> {
        self.idle_at_station
            .get(&station)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn idle_count(&self, station: StationId) -> usize {
        self.idle_at_station.get(&station).map_or(0, BTreeSet::len)
    }

    /// Idle count per registered station.
    pub fn occupancy(&self) -> BTreeMap<StationId, usize> {
        self.idle_at_station
            .iter()
            .map(|(&station, idle)| (station, idle.len()))
            .collect()
    }
}
