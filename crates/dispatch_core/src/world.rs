//! The world-state collaborator contract.
//!
//! The simulated world (entity store, routing, event log) lives outside this
//! crate. The driver queries it for statuses and positions, issues dispatch
//! commands through it, and drains its arrival notifications to refresh the
//! availability set each tick.

use thiserror::Error;

use crate::booking::Booking;
use crate::geo::{Position, TravelMetric};
use crate::ids::{BookingId, CustomerId, VehicleId};

/// Vehicle status as reported by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    Free,
    Parked,
    EnRouteToPickup,
    OnTrip,
    MovingToRebalance,
}

impl VehicleStatus {
    /// Whether the vehicle may be handed a new booking or rebalance move.
    pub fn is_dispatchable(self) -> bool {
        matches!(self, VehicleStatus::Free | VehicleStatus::Parked)
    }
}

/// Customer status as reported by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomerStatus {
    Free,
    WaitingForAssignment,
    InVehicle,
}

impl CustomerStatus {
    pub fn can_book(self) -> bool {
        matches!(
            self,
            CustomerStatus::Free | CustomerStatus::WaitingForAssignment
        )
    }
}

/// Errors the world may raise on dispatch commands.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("world rejected booking {0}")]
    BookingRejected(BookingId),
    #[error("unknown vehicle {0}")]
    UnknownVehicle(VehicleId),
}

/// Read and command surface of the external world.
pub trait WorldState {
    /// Authoritative current simulation time.
    fn current_time(&self) -> f64;

    /// All vehicle identities known to the world.
    fn vehicle_ids(&self) -> Vec<VehicleId>;

    fn vehicle_status(&self, vehicle: VehicleId) -> Option<VehicleStatus>;

    fn vehicle_position(&self, vehicle: VehicleId) -> Option<Position>;

    fn customer_status(&self, customer: CustomerId) -> Option<CustomerStatus>;

    fn customer_position(&self, customer: CustomerId) -> Option<Position>;

    /// Driving distance between two points; `None` when no route exists.
    fn driving_distance(&self, from: Position, to: Position) -> Option<f64>;

    /// Command the world to serve `booking` with `vehicle`.
    fn service_booking(&mut self, booking: &Booking, vehicle: VehicleId) -> Result<(), WorldError>;

    /// Command the world to move `vehicle` empty to `destination`
    /// (a rebalancing move).
    fn dispatch_vehicle(
        &mut self,
        vehicle: VehicleId,
        destination: Position,
    ) -> Result<(), WorldError>;

    /// Vehicles that completed a trip or rebalance move since the last
    /// call. Each identity is reported once.
    fn take_arrivals(&mut self) -> Vec<VehicleId>;
}

/// [TravelMetric] adapter over a world's routing, for engine snapshots.
pub struct WorldMetric<'a, W: WorldState + ?Sized> {
    world: &'a W,
}

impl<'a, W: WorldState + ?Sized> WorldMetric<'a, W> {
    pub fn new(world: &'a W) -> Self {
        Self { world }
    }
}

impl<W: WorldState + ?Sized> TravelMetric for WorldMetric<'_, W> {
    fn travel_distance(&self, from: Position, to: Position) -> Option<f64> {
        self.world.driving_distance(from, to)
    }
}
