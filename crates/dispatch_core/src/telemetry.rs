//! Telemetry / KPIs: counters and records accumulated by the driver.

use crate::booking::DiscardReason;
use crate::ids::BookingId;

/// Discarded bookings broken down by reason.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiscardCounts {
    pub customer_not_at_location: u64,
    pub customer_not_free: u64,
    pub service_booking_failure: u64,
    pub no_suitable_path: u64,
}

impl DiscardCounts {
    pub fn record(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::CustomerNotAtLocation => self.customer_not_at_location += 1,
            DiscardReason::CustomerNotFree => self.customer_not_free += 1,
            DiscardReason::ServiceBookingFailure => self.service_booking_failure += 1,
            DiscardReason::NoSuitablePath => self.no_suitable_path += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.customer_not_at_location
            + self.customer_not_free
            + self.service_booking_failure
            + self.no_suitable_path
    }
}

/// One rebalancing pass, recorded when its plan is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RebalanceRecord {
    pub at: f64,
    /// Vehicles the plan asked to move.
    pub planned_vehicles: u32,
    /// Vehicles actually dispatched (capped by idle availability).
    pub dispatched_vehicles: u32,
}

/// Collects dispatch telemetry across the driver's lifetime.
#[derive(Debug, Default, Clone)]
pub struct DispatchTelemetry {
    pub bookings_ingested: u64,
    pub bookings_matched: u64,
    pub bookings_discarded: DiscardCounts,
    pub matching_passes: u64,
    /// Matching passes served by the greedy fallback after a solver failure.
    pub degraded_passes: u64,
    pub rebalancing_passes: u64,
    /// Rebalancing passes skipped because the solver failed.
    pub skipped_rebalancing_passes: u64,
    pub rebalance_history: Vec<RebalanceRecord>,
    /// Bookings discarded since startup, in discard order.
    pub discarded_bookings: Vec<(BookingId, DiscardReason)>,
}

impl DispatchTelemetry {
    pub fn record_discard(&mut self, booking: BookingId, reason: DiscardReason) {
        self.bookings_discarded.record(reason);
        self.discarded_bookings.push((booking, reason));
    }

    pub fn vehicles_rebalanced(&self) -> u64 {
        self.rebalance_history
            .iter()
            .map(|r| r.dispatched_vehicles as u64)
            .sum()
    }
}
