#![allow(dead_code)]

use dispatch_core::booking::Booking;
use dispatch_core::geo::Position;
use dispatch_core::ids::{BookingId, CustomerId, StationId, VehicleId};
use dispatch_core::spatial::Station;
use dispatch_core::test_helpers::SimpleWorld;

pub fn station(id: u64, x: f64, y: f64) -> Station {
    Station {
        id: StationId(id),
        location: Position::new(x, y),
    }
}

pub fn booking(id: u64, pickup: (f64, f64), dropoff: (f64, f64), time: f64) -> Booking {
    Booking {
        id: BookingId(id),
        customer: CustomerId(id),
        pickup: Position::new(pickup.0, pickup.1),
        dropoff: Position::new(dropoff.0, dropoff.1),
        booking_time: time,
    }
}

/// A world with `vehicles` free vehicles at the given positions and the
/// customer for each of `bookings` standing at their pickup point.
pub fn world_with(vehicles: &[(u64, f64, f64)], bookings: &[Booking]) -> SimpleWorld {
    let mut world = SimpleWorld::new();
    for &(id, x, y) in vehicles {
        world.add_vehicle(VehicleId(id), Position::new(x, y));
    }
    for b in bookings {
        world.add_customer(b.customer, b.pickup);
    }
    world
}
