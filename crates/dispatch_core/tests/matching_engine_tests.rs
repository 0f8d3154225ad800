mod support;

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use dispatch_core::geo::{EuclideanMetric, Position};
use dispatch_core::ids::{BookingId, VehicleId};
use dispatch_core::matching::{
    run_matching, total_cost, BookingCandidate, CostParams, MatchStrategy, VehicleCandidate,
};

fn random_instance(
    rng: &mut StdRng,
    vehicles: usize,
    bookings: usize,
) -> (Vec<VehicleCandidate>, Vec<BookingCandidate>) {
    let vehicles = (0..vehicles)
        .map(|i| VehicleCandidate {
            vehicle: VehicleId(i as u64 + 1),
            position: Position::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)),
        })
        .collect();
    let mut bookings: Vec<BookingCandidate> = (0..bookings)
        .map(|i| BookingCandidate {
            booking: BookingId(i as u64 + 1),
            pickup: Position::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0)),
            booking_time: rng.gen_range(0.0..100.0),
        })
        .collect();
    bookings.sort_by(|a, b| a.booking_time.partial_cmp(&b.booking_time).unwrap());
    (vehicles, bookings)
}

#[test]
fn no_booking_or_vehicle_is_assigned_twice() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let (vehicles, bookings) = random_instance(&mut rng, 8, 12);
        for strategy in [MatchStrategy::Assignment, MatchStrategy::Greedy] {
            let result = run_matching(
                strategy,
                &vehicles,
                &bookings,
                &CostParams::default(),
                100.0,
                &EuclideanMetric,
            );
            let booking_ids: BTreeSet<_> = result.pairs.iter().map(|p| p.booking).collect();
            let vehicle_ids: BTreeSet<_> = result.pairs.iter().map(|p| p.vehicle).collect();
            assert_eq!(booking_ids.len(), result.pairs.len());
            assert_eq!(vehicle_ids.len(), result.pairs.len());
            assert_eq!(result.pairs.len(), vehicles.len().min(bookings.len()));
        }
    }
}

#[test]
fn optimal_total_cost_never_exceeds_greedy() {
    let mut rng = StdRng::seed_from_u64(99);
    for round in 0..30 {
        // Vehicles outnumber bookings so both strategies match every booking
        // and the totals are comparable.
        let (vehicles, bookings) = random_instance(&mut rng, 10, 6);
        let params = CostParams::default();
        let now = 150.0;

        let optimal = run_matching(
            MatchStrategy::Assignment,
            &vehicles,
            &bookings,
            &params,
            now,
            &EuclideanMetric,
        );
        let greedy = run_matching(
            MatchStrategy::Greedy,
            &vehicles,
            &bookings,
            &params,
            now,
            &EuclideanMetric,
        );
        assert_eq!(optimal.pairs.len(), greedy.pairs.len());

        let optimal_cost =
            total_cost(&optimal.pairs, &vehicles, &bookings, &params, now, &EuclideanMetric);
        let greedy_cost =
            total_cost(&greedy.pairs, &vehicles, &bookings, &params, now, &EuclideanMetric);
        // Small slack for the i64 weight quantization in the solver.
        assert!(
            optimal_cost <= greedy_cost + 1e-3,
            "round {round}: optimal {optimal_cost} > greedy {greedy_cost}"
        );
    }
}

#[test]
fn greedy_serves_older_bookings_first_at_equal_distance() {
    // All pickups equidistant from the single vehicle; only age differs.
    let vehicles = [VehicleCandidate {
        vehicle: VehicleId(1),
        position: Position::new(0.0, 0.0),
    }];
    let bookings = [
        BookingCandidate {
            booking: BookingId(1),
            pickup: Position::new(3.0, 0.0),
            booking_time: 40.0,
        },
        BookingCandidate {
            booking: BookingId(2),
            pickup: Position::new(0.0, 3.0),
            booking_time: 5.0,
        },
        BookingCandidate {
            booking: BookingId(3),
            pickup: Position::new(-3.0, 0.0),
            booking_time: 20.0,
        },
    ];

    let result = run_matching(
        MatchStrategy::Greedy,
        &vehicles,
        &bookings,
        &CostParams::default(),
        50.0,
        &EuclideanMetric,
    );
    assert_eq!(result.pairs.len(), 1);
    assert_eq!(result.pairs[0].booking, BookingId(2));
}

#[test]
fn greedy_matches_a_prefix_of_the_queue() {
    // With every pair routable, greedy consumes exactly the oldest bookings.
    let mut rng = StdRng::seed_from_u64(3);
    let (vehicles, bookings) = random_instance(&mut rng, 4, 9);
    let result = run_matching(
        MatchStrategy::Greedy,
        &vehicles,
        &bookings,
        &CostParams::default(),
        200.0,
        &EuclideanMetric,
    );

    assert_eq!(result.pairs.len(), 4);
    let matched: BTreeSet<_> = result.pairs.iter().map(|p| p.booking).collect();
    for oldest in &bookings[..4] {
        assert!(matched.contains(&oldest.booking));
    }
}

#[test]
fn lone_vehicle_goes_to_the_cheaper_booking_under_assignment() {
    // One vehicle at the origin, pickups at (1,0) booked late and (5,0)
    // booked first; with waiting weight zero the optimizer takes the near
    // one and the far booking stays unmatched.
    let vehicles = [VehicleCandidate {
        vehicle: VehicleId(1),
        position: Position::new(0.0, 0.0),
    }];
    let bookings = [
        BookingCandidate {
            booking: BookingId(2),
            pickup: Position::new(5.0, 0.0),
            booking_time: 0.0,
        },
        BookingCandidate {
            booking: BookingId(1),
            pickup: Position::new(1.0, 0.0),
            booking_time: 10.0,
        },
    ];
    let params = CostParams {
        distance_weight: 1.0,
        waiting_weight: 0.0,
    };

    let result = run_matching(
        MatchStrategy::Assignment,
        &vehicles,
        &bookings,
        &params,
        10.0,
        &EuclideanMetric,
    );
    assert_eq!(result.pairs.len(), 1);
    assert_eq!(result.pairs[0].booking, BookingId(1));
    assert_eq!(result.pairs[0].vehicle, VehicleId(1));
    assert!(!result.degraded);
}
