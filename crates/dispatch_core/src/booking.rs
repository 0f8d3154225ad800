//! Bookings and admission validity.

use serde::{Deserialize, Serialize};

use crate::geo::Position;
use crate::ids::{BookingId, CustomerId};
use crate::world::WorldState;

/// How far a customer may stand from the declared pickup point and still
/// count as "at the location".
pub const PICKUP_TOLERANCE: f64 = 1e-6;

/// A customer's request to travel from a pickup to a drop-off location,
/// timestamped at request time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub customer: CustomerId,
    pub pickup: Position,
    pub dropoff: Position,
    /// Simulation time at which the request was made. Preserved across
    /// failed matching passes so waiting cost keeps accruing.
    pub booking_time: f64,
}

/// Why a booking was discarded instead of queued or dispatched.
///
/// Exhaustive by design: callers must handle every variant so a new reason
/// can never be silently swallowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The customer does not exist or is not at the declared pickup point.
    CustomerNotAtLocation,
    /// The customer is already in a vehicle or already matched.
    CustomerNotFree,
    /// The world rejected the dispatch call for this booking.
    ServiceBookingFailure,
    /// No route exists between pickup and drop-off.
    NoSuitablePath,
}

impl std::fmt::Display for DiscardReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiscardReason::CustomerNotAtLocation => "customer-not-at-location",
            DiscardReason::CustomerNotFree => "customer-not-free",
            DiscardReason::ServiceBookingFailure => "service-booking-failure",
            DiscardReason::NoSuitablePath => "no-suitable-path",
        };
        f.write_str(s)
    }
}

/// Preliminary checks before a booking enters the queue.
///
/// The routing check runs first (a booking nobody could ever serve is
/// rejected regardless of customer state), then customer presence, then
/// customer status. [DiscardReason::ServiceBookingFailure] is only raised
/// later, at dispatch time.
pub fn validate_booking<W: WorldState + ?Sized>(
    world: &W,
    booking: &Booking,
) -> Result<(), DiscardReason> {
    if world
        .driving_distance(booking.pickup, booking.dropoff)
        .is_none()
    {
        return Err(DiscardReason::NoSuitablePath);
    }

    let Some(position) = world.customer_position(booking.customer) else {
        return Err(DiscardReason::CustomerNotAtLocation);
    };
    if position.distance_to(booking.pickup) > PICKUP_TOLERANCE {
        return Err(DiscardReason::CustomerNotAtLocation);
    }

    match world.customer_status(booking.customer) {
        Some(status) if status.can_book() => Ok(()),
        _ => Err(DiscardReason::CustomerNotFree),
    }
}
