//! Test helpers shared by unit tests, integration tests and examples.
//!
//! [SimpleWorld] is a deterministic in-memory [WorldState]: straight-line
//! routing, explicit time control, and trips that complete only when the
//! test says so.

use std::collections::{BTreeMap, BTreeSet};

use crate::booking::Booking;
use crate::geo::Position;
use crate::ids::{BookingId, CustomerId, StationId, VehicleId};
use crate::rebalancing::DemandEstimator;
use crate::world::{CustomerStatus, VehicleStatus, WorldError, WorldState};

#[derive(Debug, Clone, Copy)]
struct VehicleState {
    position: Position,
    status: VehicleStatus,
}

#[derive(Debug, Clone, Copy)]
struct ActiveMove {
    destination: Position,
    customer: Option<CustomerId>,
}

/// Minimal deterministic world for driving the dispatch core in tests.
#[derive(Debug, Default)]
pub struct SimpleWorld {
    time: f64,
    vehicles: BTreeMap<VehicleId, VehicleState>,
    customers: BTreeMap<CustomerId, (Position, CustomerStatus)>,
    active: BTreeMap<VehicleId, ActiveMove>,
    arrivals: Vec<VehicleId>,
    blocked_routes: Vec<(Position, Position)>,
    failing_bookings: BTreeSet<BookingId>,
}

impl SimpleWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&mut self, time: f64) {
        self.time = time;
    }

    pub fn advance_time(&mut self, delta: f64) {
        self.time += delta;
    }

    pub fn add_vehicle(&mut self, vehicle: VehicleId, position: Position) {
        self.vehicles.insert(
            vehicle,
            VehicleState {
                position,
                status: VehicleStatus::Free,
            },
        );
    }

    pub fn add_customer(&mut self, customer: CustomerId, position: Position) {
        self.customers
            .insert(customer, (position, CustomerStatus::Free));
    }

    pub fn set_customer_status(&mut self, customer: CustomerId, status: CustomerStatus) {
        if let Some(entry) = self.customers.get_mut(&customer) {
            entry.1 = status;
        }
    }

    /// Make routing between these two exact points impossible, both ways.
    pub fn block_route(&mut self, a: Position, b: Position) {
        self.blocked_routes.push((a, b));
    }

    /// Make the world refuse `service_booking` for this booking.
    pub fn fail_booking(&mut self, booking: BookingId) {
        self.failing_bookings.insert(booking);
    }

    /// Finish a vehicle's current trip or rebalance move: teleport it to
    /// its destination and queue the arrival notification.
    pub fn complete_move(&mut self, vehicle: VehicleId) {
        let Some(active) = self.active.remove(&vehicle) else {
            return;
        };
        if let Some(state) = self.vehicles.get_mut(&vehicle) {
            state.position = active.destination;
            state.status = VehicleStatus::Free;
        }
        if let Some(customer) = active.customer {
            if let Some(entry) = self.customers.get_mut(&customer) {
                entry.0 = active.destination;
                entry.1 = CustomerStatus::Free;
            }
        }
        self.arrivals.push(vehicle);
    }

    /// Finish every in-flight move.
    pub fn complete_all_moves(&mut self) {
        let moving: Vec<VehicleId> = self.active.keys().copied().collect();
        for vehicle in moving {
            self.complete_move(vehicle);
        }
    }

    pub fn moving_vehicles(&self) -> Vec<VehicleId> {
        self.active.keys().copied().collect()
    }

    fn route_blocked(&self, from: Position, to: Position) -> bool {
        self.blocked_routes
            .iter()
            .any(|&(a, b)| (a == from && b == to) || (a == to && b == from))
    }
}

impl WorldState for SimpleWorld {
    fn current_time(&self) -> f64 {
        self.time
    }

    fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.vehicles.keys().copied().collect()
    }

    fn vehicle_status(&self, vehicle: VehicleId) -> Option<VehicleStatus> {
        self.vehicles.get(&vehicle).map(|v| v.status)
    }

    fn vehicle_position(&self, vehicle: VehicleId) -> Option<Position> {
        self.vehicles.get(&vehicle).map(|v| v.position)
    }

    fn customer_status(&self, customer: CustomerId) -> Option<CustomerStatus> {
        self.customers.get(&customer).map(|c| c.1)
    }

    fn customer_position(&self, customer: CustomerId) -> Option<Position> {
        self.customers.get(&customer).map(|c| c.0)
    }

    fn driving_distance(&self, from: Position, to: Position) -> Option<f64> {
        if self.route_blocked(from, to) {
            None
        } else {
            Some(from.distance_to(to))
        }
    }

    fn service_booking(&mut self, booking: &Booking, vehicle: VehicleId) -> Result<(), WorldError> {
        if self.failing_bookings.contains(&booking.id) {
            return Err(WorldError::BookingRejected(booking.id));
        }
        let state = self
            .vehicles
            .get_mut(&vehicle)
            .ok_or(WorldError::UnknownVehicle(vehicle))?;
        state.status = VehicleStatus::EnRouteToPickup;
        self.active.insert(
            vehicle,
            ActiveMove {
                destination: booking.dropoff,
                customer: Some(booking.customer),
            },
        );
        if let Some(entry) = self.customers.get_mut(&booking.customer) {
            entry.1 = CustomerStatus::InVehicle;
        }
        Ok(())
    }

    fn dispatch_vehicle(
        &mut self,
        vehicle: VehicleId,
        destination: Position,
    ) -> Result<(), WorldError> {
        let state = self
            .vehicles
            .get_mut(&vehicle)
            .ok_or(WorldError::UnknownVehicle(vehicle))?;
        state.status = VehicleStatus::MovingToRebalance;
        self.active.insert(
            vehicle,
            ActiveMove {
                destination,
                customer: None,
            },
        );
        Ok(())
    }

    fn take_arrivals(&mut self) -> Vec<VehicleId> {
        std::mem::take(&mut self.arrivals)
    }
}

/// Predicts the same demand at every station, plus any queued bookings the
/// driver reports.
#[derive(Debug, Clone, Copy)]
pub struct UniformEstimator {
    pub demand: f64,
}

impl DemandEstimator for UniformEstimator {
    fn predict(&self, _station: StationId, _horizon: f64, queued: usize) -> f64 {
        self.demand + queued as f64
    }
}

/// Fixed per-station forecasts; stations not in the table predict zero.
#[derive(Debug, Default, Clone)]
pub struct TableEstimator {
    pub demand: BTreeMap<StationId, f64>,
}

impl TableEstimator {
    pub fn new(entries: impl IntoIterator<Item = (StationId, f64)>) -> Self {
        Self {
            demand: entries.into_iter().collect(),
        }
    }
}

impl DemandEstimator for TableEstimator {
    fn predict(&self, station: StationId, _horizon: f64, queued: usize) -> f64 {
        self.demand.get(&station).copied().unwrap_or(0.0) + queued as f64
    }
}
