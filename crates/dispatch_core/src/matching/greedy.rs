//! Greedy FIFO matching.
//!
//! Bookings are served strictly in queue order (oldest first); each takes
//! the nearest available vehicle by distance alone, and both leave the pass
//! immediately. Waiting time never enters the cost: the FIFO order is the
//! waiting policy.

use crate::geo::TravelMetric;

use super::{BookingCandidate, MatchPair, VehicleCandidate};

/// Match bookings oldest-first to their nearest vehicle.
///
/// `bookings` are processed in slice order after a stable sort by booking
/// time, so the caller's queue order is the tie-break for equal timestamps.
/// Distance ties go to the lowest vehicle identity.
pub fn solve_greedy(
    vehicles: &[VehicleCandidate],
    bookings: &[BookingCandidate],
    metric: &dyn TravelMetric,
) -> Vec<MatchPair> {
    let mut order: Vec<usize> = (0..bookings.len()).collect();
    order.sort_by(|&a, &b| {
        bookings[a]
            .booking_time
            .partial_cmp(&bookings[b].booking_time)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut used = vec![false; vehicles.len()];
    let mut pairs = Vec::new();

    for b_idx in order {
        if pairs.len() == vehicles.len() {
            break;
        }
        let booking = &bookings[b_idx];

        let mut best: Option<(usize, f64)> = None;
        for (v_idx, vehicle) in vehicles.iter().enumerate() {
            if used[v_idx] {
                continue;
            }
            let Some(distance) = metric.travel_distance(vehicle.position, booking.pickup) else {
                continue;
            };
            let better = match best {
                None => true,
                Some((best_idx, best_distance)) => {
                    distance < best_distance
                        || (distance == best_distance
                            && vehicle.vehicle < vehicles[best_idx].vehicle)
                }
            };
            if better {
                best = Some((v_idx, distance));
            }
        }

        if let Some((v_idx, _)) = best {
            used[v_idx] = true;
            pairs.push(MatchPair {
                booking: booking.booking,
                vehicle: vehicles[v_idx].vehicle,
            });
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{EuclideanMetric, Position};
    use crate::ids::{BookingId, VehicleId};

    fn vehicle(id: u64, x: f64) -> VehicleCandidate {
        VehicleCandidate {
            vehicle: VehicleId(id),
            position: Position::new(x, 0.0),
        }
    }

    fn booking(id: u64, x: f64, time: f64) -> BookingCandidate {
        BookingCandidate {
            booking: BookingId(id),
            pickup: Position::new(x, 0.0),
            booking_time: time,
        }
    }

    #[test]
    fn oldest_booking_is_served_first() {
        let vehicles = [vehicle(1, 0.0)];
        let bookings = [booking(1, 1.0, 50.0), booking(2, 1.0, 10.0)];
        let pairs = solve_greedy(&vehicles, &bookings, &EuclideanMetric);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].booking, BookingId(2));
    }

    #[test]
    fn each_booking_takes_its_nearest_vehicle() {
        let vehicles = [vehicle(1, 0.0), vehicle(2, 10.0)];
        let bookings = [booking(1, 9.0, 0.0), booking(2, 1.0, 1.0)];
        let pairs = solve_greedy(&vehicles, &bookings, &EuclideanMetric);

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0], MatchPair { booking: BookingId(1), vehicle: VehicleId(2) });
        assert_eq!(pairs[1], MatchPair { booking: BookingId(2), vehicle: VehicleId(1) });
    }

    #[test]
    fn stops_when_vehicles_run_out() {
        let vehicles = [vehicle(1, 0.0)];
        let bookings = [booking(1, 1.0, 0.0), booking(2, 2.0, 1.0), booking(3, 3.0, 2.0)];
        let pairs = solve_greedy(&vehicles, &bookings, &EuclideanMetric);
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn unreachable_booking_is_skipped_not_fatal() {
        struct OnlyShortHops;
        impl TravelMetric for OnlyShortHops {
            fn travel_distance(&self, from: Position, to: Position) -> Option<f64> {
                let d = from.distance_to(to);
                (d < 5.0).then_some(d)
            }
        }

        let vehicles = [vehicle(1, 0.0)];
        let bookings = [booking(1, 100.0, 0.0), booking(2, 1.0, 10.0)];
        let pairs = solve_greedy(&vehicles, &bookings, &OnlyShortHops);

        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].booking, BookingId(2));
    }

    #[test]
    fn distance_ties_go_to_lowest_vehicle_id() {
        let vehicles = [vehicle(2, -1.0), vehicle(1, 1.0)];
        let bookings = [booking(1, 0.0, 0.0)];
        let pairs = solve_greedy(&vehicles, &bookings, &EuclideanMetric);
        assert_eq!(pairs[0].vehicle, VehicleId(1));
    }
}
