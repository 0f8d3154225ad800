//! Small end-to-end run: a 2x2 station grid, a handful of vehicles parked
//! in one corner, and a morning burst of bookings near the opposite corner.
//!
//!     RUST_LOG=debug cargo run --example station_grid_run

use dispatch_core::booking::Booking;
use dispatch_core::config::DispatchConfig;
use dispatch_core::error::DispatchError;
use dispatch_core::geo::Position;
use dispatch_core::ids::{BookingId, CustomerId, StationId, VehicleId};
use dispatch_core::manager::FleetManager;
use dispatch_core::spatial::Station;
use dispatch_core::test_helpers::{SimpleWorld, UniformEstimator};

fn main() -> Result<(), DispatchError> {
    env_logger::init();

    let stations: Vec<Station> = [
        (1, 0.0, 0.0),
        (2, 100.0, 0.0),
        (3, 0.0, 100.0),
        (4, 100.0, 100.0),
    ]
    .into_iter()
    .map(|(id, x, y)| Station {
        id: StationId(id),
        location: Position::new(x, y),
    })
    .collect();

    let mut world = SimpleWorld::new();
    for id in 1..=8 {
        world.add_vehicle(VehicleId(id), Position::new(0.0, 0.0));
    }

    let mut bookings = Vec::new();
    for i in 0..6_u64 {
        let pickup = Position::new(95.0 + i as f64, 95.0);
        let customer = CustomerId(100 + i);
        world.add_customer(customer, pickup);
        bookings.push(Booking {
            id: BookingId(i + 1),
            customer,
            pickup,
            dropoff: Position::new(5.0, 5.0),
            booking_time: 120.0 + i as f64 * 30.0,
        });
    }

    let mut manager = FleetManager::new(
        DispatchConfig::default()
            .with_matching_interval(60.0)
            .with_rebalancing_interval(300.0),
    );
    manager.load_stations(&stations);
    manager.load_bookings(bookings);
    manager.set_demand_estimator(Box::new(UniformEstimator { demand: 1.0 }));
    manager.init(&world)?;

    for tick in 0..=600_u64 {
        world.set_time(tick as f64);
        manager.step(&mut world)?;
        // Trips take a flat 30 ticks in this toy world.
        if tick % 30 == 0 {
            world.complete_all_moves();
        }
    }

    let telemetry = manager.telemetry();
    println!("matching passes:     {}", telemetry.matching_passes);
    println!("rebalancing passes:  {}", telemetry.rebalancing_passes);
    println!("bookings ingested:   {}", telemetry.bookings_ingested);
    println!("bookings matched:    {}", telemetry.bookings_matched);
    println!("bookings discarded:  {}", telemetry.bookings_discarded.total());
    println!("vehicles rebalanced: {}", telemetry.vehicles_rebalanced());
    for station in stations {
        println!(
            "station {}: {} idle",
            station.id,
            manager.idle_at(station.id).len()
        );
    }
    Ok(())
}
