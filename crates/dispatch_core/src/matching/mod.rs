//! Booking-to-vehicle matching engine.
//!
//! Runs on the matching interval over a consistent snapshot of the
//! availability set and the booking queue, and returns a pure
//! [MatchAssignment] that the driver applies. Two interchangeable
//! strategies:
//!
//! - **Assignment**: minimum-cost bipartite matching over the complete
//!   vehicle × booking cost matrix (distance and accrued waiting time).
//! - **Greedy**: bookings strictly in queue order, nearest vehicle first.
//!
//! If the assignment solver fails, the pass falls back to greedy and the
//! result carries a degraded-mode flag.

pub mod assignment;
pub mod greedy;

pub use assignment::solve_assignment;
pub use greedy::solve_greedy;

use log::warn;

use crate::geo::{Position, TravelMetric};
use crate::ids::{BookingId, VehicleId};

/// Which matching strategy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchStrategy {
    /// Optimal assignment-problem matching.
    #[default]
    Assignment,
    /// FIFO by booking time, nearest vehicle by distance alone.
    Greedy,
}

/// Multiplicative factors for the matching cost components. Mutable between
/// passes, held fixed within one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostParams {
    /// Scales the vehicle-to-pickup travel distance term.
    pub distance_weight: f64,
    /// Scales the accrued customer waiting time term.
    pub waiting_weight: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            distance_weight: 1.0,
            waiting_weight: 1.0,
        }
    }
}

/// One dispatchable vehicle in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleCandidate {
    pub vehicle: VehicleId,
    pub position: Position,
}

/// One pending booking in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingCandidate {
    pub booking: BookingId,
    pub pickup: Position,
    pub booking_time: f64,
}

/// A single booking → vehicle pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPair {
    pub booking: BookingId,
    pub vehicle: VehicleId,
}

/// Result of one matching pass. Each booking and each vehicle appears in at
/// most one pair.
#[derive(Debug, Clone, Default)]
pub struct MatchAssignment {
    pub pairs: Vec<MatchPair>,
    /// True when the assignment solver failed and the pass was served by
    /// the greedy fallback instead.
    pub degraded: bool,
}

/// Cost of pairing `vehicle` with `booking` at time `now`; `None` when the
/// vehicle cannot reach the pickup.
pub(crate) fn pair_cost(
    vehicle: &VehicleCandidate,
    booking: &BookingCandidate,
    params: &CostParams,
    now: f64,
    metric: &dyn TravelMetric,
) -> Option<f64> {
    let distance = metric.travel_distance(vehicle.position, booking.pickup)?;
    let waited = (now - booking.booking_time).max(0.0);
    Some(params.distance_weight * distance + params.waiting_weight * waited)
}

/// Total cost of an assignment under the pass's cost model. Pairs whose
/// route disappeared count as zero; they could not have been produced by a
/// consistent snapshot.
pub fn total_cost(
    pairs: &[MatchPair],
    vehicles: &[VehicleCandidate],
    bookings: &[BookingCandidate],
    params: &CostParams,
    now: f64,
    metric: &dyn TravelMetric,
) -> f64 {
    pairs
        .iter()
        .filter_map(|pair| {
            let vehicle = vehicles.iter().find(|v| v.vehicle == pair.vehicle)?;
            let booking = bookings.iter().find(|b| b.booking == pair.booking)?;
            pair_cost(vehicle, booking, params, now, metric)
        })
        .sum()
}

/// Run one matching pass over a snapshot. Never mutates its inputs; the
/// caller applies the returned assignment.
///
/// `bookings` must be in queue order (oldest first) — the greedy strategy
/// and the fallback path rely on it.
pub fn run_matching(
    strategy: MatchStrategy,
    vehicles: &[VehicleCandidate],
    bookings: &[BookingCandidate],
    params: &CostParams,
    now: f64,
    metric: &dyn TravelMetric,
) -> MatchAssignment {
    if vehicles.is_empty() || bookings.is_empty() {
        return MatchAssignment::default();
    }

    match strategy {
        MatchStrategy::Greedy => MatchAssignment {
            pairs: solve_greedy(vehicles, bookings, metric),
            degraded: false,
        },
        MatchStrategy::Assignment => match solve_assignment(vehicles, bookings, params, now, metric)
        {
            Ok(pairs) => MatchAssignment {
                pairs,
                degraded: false,
            },
            Err(err) => {
                warn!("assignment solver failed ({err}); falling back to greedy for this pass");
                MatchAssignment {
                    pairs: solve_greedy(vehicles, bookings, metric),
                    degraded: true,
                }
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EuclideanMetric;

    fn vehicle(id: u64, x: f64, y: f64) -> VehicleCandidate {
        VehicleCandidate {
            vehicle: VehicleId(id),
            position: Position::new(x, y),
        }
    }

    fn booking(id: u64, x: f64, y: f64, time: f64) -> BookingCandidate {
        BookingCandidate {
            booking: BookingId(id),
            pickup: Position::new(x, y),
            booking_time: time,
        }
    }

    #[test]
    fn empty_inputs_are_a_noop() {
        let result = run_matching(
            MatchStrategy::Assignment,
            &[],
            &[booking(1, 0.0, 0.0, 0.0)],
            &CostParams::default(),
            10.0,
            &EuclideanMetric,
        );
        assert!(result.pairs.is_empty());
        assert!(!result.degraded);
    }

    // Scenario: one vehicle at the origin, a near booking and a far one;
    // with waiting weight zero both strategies pick the near booking.
    #[test]
    fn both_strategies_prefer_lower_distance_when_wait_weight_is_zero() {
        let vehicles = [vehicle(1, 0.0, 0.0)];
        let bookings = [
            booking(20, 5.0, 0.0, 0.0),
            booking(10, 1.0, 0.0, 10.0),
        ];
        let params = CostParams {
            distance_weight: 1.0,
            waiting_weight: 0.0,
        };

        for strategy in [MatchStrategy::Assignment, MatchStrategy::Greedy] {
            let result = run_matching(
                strategy,
                &vehicles,
                &bookings,
                &params,
                20.0,
                &EuclideanMetric,
            );
            match strategy {
                // Greedy is FIFO: the older booking (t=0, far pickup) wins.
                MatchStrategy::Greedy => {
                    assert_eq!(result.pairs.len(), 1);
                    assert_eq!(result.pairs[0].booking, BookingId(20));
                }
                // The optimizer picks the cheaper (closer) booking.
                MatchStrategy::Assignment => {
                    assert_eq!(result.pairs.len(), 1);
                    assert_eq!(result.pairs[0].booking, BookingId(10));
                }
            }
            assert!(!result.degraded);
        }
    }
}
