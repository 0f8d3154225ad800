//! The simulation step driver.
//!
//! [FleetManager] owns the booking queue, the availability set and the
//! station index, and advances dispatch state once per simulation tick:
//! absorb arrivals, ingest due bookings, then run the matching and
//! rebalancing engines when their intervals elapse. The engines are pure;
//! every world mutation happens here.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::availability::AvailabilityTracker;
use crate::booking::{validate_booking, Booking, DiscardReason};
use crate::config::DispatchConfig;
use crate::error::{DispatchError, IngestionError};
use crate::ids::{StationId, VehicleId};
use crate::ingestion::BookingSource;
use crate::matching::{
    run_matching, BookingCandidate, CostParams, MatchStrategy, VehicleCandidate,
};
use crate::queue::BookingQueue;
use crate::rebalancing::{
    plan_rebalancing, DemandEstimator, RebalancePlan, StationBalance, TransportSolver,
    UnitAssignmentSolver,
};
use crate::spatial::{Station, StationIndex};
use crate::telemetry::{DispatchTelemetry, RebalanceRecord};
use crate::world::{WorldMetric, WorldState};

/// Drives matching and rebalancing over an external world.
pub struct FleetManager {
    config: DispatchConfig,
    queue: BookingQueue,
    availability: AvailabilityTracker,
    stations: StationIndex,
    /// Bulk-loaded bookings awaiting their booking time, ascending.
    backlog: Vec<Booking>,
    source: Option<Box<dyn BookingSource>>,
    estimator: Option<Box<dyn DemandEstimator>>,
    solver: Box<dyn TransportSolver>,
    telemetry: DispatchTelemetry,
    next_matching_time: f64,
    next_rebalancing_time: f64,
    initialized: bool,
}

impl FleetManager {
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            config,
            queue: BookingQueue::new(),
            availability: AvailabilityTracker::new(),
            stations: StationIndex::default(),
            backlog: Vec::new(),
            source: None,
            estimator: None,
            solver: Box::new(UnitAssignmentSolver),
            telemetry: DispatchTelemetry::default(),
            next_matching_time: 0.0,
            next_rebalancing_time: 0.0,
            initialized: false,
        }
    }

    /// Replace the station set. Existing vehicle affiliations are kept until
    /// the next arrival or [init](Self::init) refreshes them.
    pub fn load_stations(&mut self, stations: &[Station]) {
        self.stations = StationIndex::build(stations);
        for station in stations {
            self.availability.register_station(station.id);
        }
    }

    /// Queue bookings for release once simulation time reaches them.
    pub fn load_bookings(&mut self, bookings: impl IntoIterator<Item = Booking>) {
        self.backlog.extend(bookings);
        self.backlog.sort_by(|a, b| {
            a.booking_time
                .partial_cmp(&b.booking_time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    /// Attach a streaming booking source, replacing any previous one.
    pub fn set_booking_source(&mut self, source: Box<dyn BookingSource>) {
        self.source = Some(source);
    }

    pub fn set_demand_estimator(&mut self, estimator: Box<dyn DemandEstimator>) {
        self.estimator = Some(estimator);
    }

    /// Swap the transportation solver behind the rebalancing engine.
    pub fn set_transport_solver(&mut self, solver: Box<dyn TransportSolver>) {
        self.solver = solver;
    }

    pub fn set_match_strategy(&mut self, strategy: MatchStrategy) {
        self.config.strategy = strategy;
    }

    pub fn set_cost_weights(&mut self, cost: CostParams) {
        self.config.cost = cost;
    }

    pub fn set_matching_interval(&mut self, interval: f64) {
        self.config.matching_interval = interval;
    }

    /// Change the rebalancing interval. The next pass runs on the next step
    /// so the new cadence takes effect immediately.
    pub fn set_rebalancing_interval(&mut self, interval: f64) {
        self.config.rebalancing_interval = interval;
        self.next_rebalancing_time = 0.0;
    }

    pub fn set_use_queue_for_estimation(&mut self, enabled: bool) {
        self.config.use_queue_for_estimation = enabled;
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &DispatchTelemetry {
        &self.telemetry
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn available_count(&self) -> usize {
        self.availability.available_count()
    }

    pub fn availability(&self) -> &AvailabilityTracker {
        &self.availability
    }

    /// Seed dispatch state from the world: affiliate every dispatchable
    /// vehicle with its nearest station and schedule the first passes one
    /// full interval from now.
    ///
    /// Runs automatically on the first [step](Self::step) if not called.
    pub fn init<W: WorldState + ?Sized>(&mut self, world: &W) -> Result<(), DispatchError> {
        for vehicle in world.vehicle_ids() {
            let status = world.vehicle_status(vehicle).ok_or_else(|| {
                DispatchError::InvalidWorldState(format!("vehicle {vehicle} has no status"))
            })?;
            if !status.is_dispatchable() {
                continue;
            }
            if let Some(position) = world.vehicle_position(vehicle) {
                if let Some(station) = self.stations.nearest_station(position) {
                    self.availability.set_station(vehicle, station);
                }
            }
            self.availability.insert_available(vehicle);
        }
        let now = world.current_time();
        self.next_matching_time = now + self.config.matching_interval;
        self.next_rebalancing_time = now + self.config.rebalancing_interval;
        self.initialized = true;
        debug!(
            "initialized with {} available vehicles across {} stations",
            self.availability.available_count(),
            self.stations.len()
        );
        Ok(())
    }

    /// Advance one simulation tick.
    ///
    /// An ingestion failure does not abort the tick: the passes still run on
    /// what was already queued and the error is returned afterwards.
    pub fn step<W: WorldState + ?Sized>(&mut self, world: &mut W) -> Result<(), DispatchError> {
        if !self.initialized {
            self.init(world)?;
        }
        let now = world.current_time();

        self.absorb_arrivals(world);
        let ingestion_result = self.ingest_due_bookings(world, now);

        if now >= self.next_matching_time {
            self.run_matching_pass(world, now)?;
            self.next_matching_time = now + self.config.matching_interval;
        }
        if self.config.rebalancing_interval > 0.0 && now >= self.next_rebalancing_time {
            self.run_rebalancing_pass(world, now)?;
            self.next_rebalancing_time = now + self.config.rebalancing_interval;
        }

        ingestion_result?;
        Ok(())
    }

    /// Vehicles that finished a trip or rebalance move rejoin the available
    /// set, re-affiliated by where they actually stopped.
    fn absorb_arrivals<W: WorldState + ?Sized>(&mut self, world: &mut W) {
        for vehicle in world.take_arrivals() {
            match world.vehicle_position(vehicle) {
                Some(position) => {
                    if let Some(station) = self.stations.nearest_station(position) {
                        self.availability.set_station(vehicle, station);
                    }
                }
                None => warn!("arrived vehicle {vehicle} has no position"),
            }
            self.availability.insert_available(vehicle);
        }
    }

    fn ingest_due_bookings<W: WorldState + ?Sized>(
        &mut self,
        world: &W,
        now: f64,
    ) -> Result<(), DispatchError> {
        let due_backlog = self
            .backlog
            .partition_point(|b| b.booking_time <= now);
        let mut due: Vec<Booking> = self.backlog.drain(..due_backlog).collect();

        let mut source_error: Option<IngestionError> = None;
        if let Some(source) = self.source.as_mut() {
            match source.next_due(now) {
                Ok(bookings) => due.extend(bookings),
                Err(err) => source_error = Some(err),
            }
        }

        for booking in due {
            self.telemetry.bookings_ingested += 1;
            match validate_booking(world, &booking) {
                Ok(()) => self.queue.admit(booking),
                Err(reason) => {
                    info!("discarding booking {} ({reason})", booking.id);
                    self.telemetry.record_discard(booking.id, reason);
                }
            }
        }

        match source_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn run_matching_pass<W: WorldState + ?Sized>(
        &mut self,
        world: &mut W,
        now: f64,
    ) -> Result<(), DispatchError> {
        let mut vehicles = Vec::with_capacity(self.availability.available_count());
        for vehicle in self.availability.available_vehicles() {
            let status = world.vehicle_status(vehicle).ok_or_else(|| {
                DispatchError::InvalidWorldState(format!(
                    "available vehicle {vehicle} unknown to the world"
                ))
            })?;
            if !status.is_dispatchable() {
                // The world moved on since the last tick; skip quietly, the
                // arrival will re-admit it.
                continue;
            }
            let position = world.vehicle_position(vehicle).ok_or_else(|| {
                DispatchError::InvalidWorldState(format!("vehicle {vehicle} has no position"))
            })?;
            vehicles.push(VehicleCandidate { vehicle, position });
        }

        let bookings: Vec<BookingCandidate> = self
            .queue
            .iter()
            .map(|b| BookingCandidate {
                booking: b.id,
                pickup: b.pickup,
                booking_time: b.booking_time,
            })
            .collect();

        let assignment = {
            let metric = WorldMetric::new(&*world);
            run_matching(
                self.config.strategy,
                &vehicles,
                &bookings,
                &self.config.cost,
                now,
                &metric,
            )
        };

        self.telemetry.matching_passes += 1;
        if assignment.degraded {
            self.telemetry.degraded_passes += 1;
        }

        for pair in assignment.pairs {
            let Some(booking) = self.queue.remove(pair.booking) else {
                continue;
            };
            match world.service_booking(&booking, pair.vehicle) {
                Ok(()) => {
                    self.availability.remove_available(pair.vehicle);
                    // The vehicle ends up at the drop-off; affiliate it with
                    // the station it will idle at.
                    if let Some(station) = self.stations.nearest_station(booking.dropoff) {
                        self.availability.set_station(pair.vehicle, station);
                    }
                    self.telemetry.bookings_matched += 1;
                    debug!(
                        "matched booking {} to vehicle {} at t={now}",
                        booking.id, pair.vehicle
                    );
                }
                Err(err) => {
                    warn!("world refused booking {}: {err}", booking.id);
                    self.telemetry
                        .record_discard(booking.id, DiscardReason::ServiceBookingFailure);
                }
            }
        }
        Ok(())
    }

    fn run_rebalancing_pass<W: WorldState + ?Sized>(
        &mut self,
        world: &mut W,
        now: f64,
    ) -> Result<(), DispatchError> {
        let Some(estimator) = self.estimator.as_deref() else {
            return Ok(());
        };
        if self.stations.is_empty() {
            return Ok(());
        }
        self.telemetry.rebalancing_passes += 1;

        let queued = if self.config.use_queue_for_estimation {
            self.queued_per_station()
        } else {
            BTreeMap::new()
        };
        let horizon = self.config.rebalancing_interval;
        let balances: Vec<StationBalance> = self
            .availability
            .occupancy()
            .into_iter()
            .map(|(station, idle)| StationBalance {
                station,
                idle,
                predicted_demand: estimator.predict(
                    station,
                    horizon,
                    queued.get(&station).copied().unwrap_or(0),
                ),
            })
            .collect();

        let plan = {
            let metric = WorldMetric::new(&*world);
            plan_rebalancing(&balances, &self.stations, &metric, self.solver.as_ref())
        };
        let plan = match plan {
            Ok(plan) => plan,
            Err(err) => {
                warn!("rebalancing solver failed ({err}); skipping this cycle");
                self.telemetry.skipped_rebalancing_passes += 1;
                return Ok(());
            }
        };
        if plan.is_empty() {
            return Ok(());
        }

        let dispatched = self.apply_rebalance_plan(world, &plan);
        self.telemetry.rebalance_history.push(RebalanceRecord {
            at: now,
            planned_vehicles: plan.total_vehicles(),
            dispatched_vehicles: dispatched,
        });
        Ok(())
    }

    /// Send idle vehicles along each flow, lowest identity first. Returns
    /// how many actually left.
    fn apply_rebalance_plan<W: WorldState + ?Sized>(
        &mut self,
        world: &mut W,
        plan: &RebalancePlan,
    ) -> u32 {
        let mut dispatched = 0;
        for flow in &plan.flows {
            let Some(destination) = self.stations.station_position(flow.to) else {
                continue;
            };
            let candidates = self.availability.idle_vehicles(flow.from);
            for &vehicle in candidates.iter().take(flow.vehicles as usize) {
                match world.dispatch_vehicle(vehicle, destination) {
                    Ok(()) => {
                        self.availability.remove_available(vehicle);
                        self.availability.set_station(vehicle, flow.to);
                        dispatched += 1;
                        debug!(
                            "rebalancing vehicle {vehicle} from station {} to {}",
                            flow.from, flow.to
                        );
                    }
                    Err(err) => warn!("rebalance dispatch of {vehicle} failed: {err}"),
                }
            }
        }
        dispatched
    }

    /// Queued bookings grouped by the station nearest their pickup.
    fn queued_per_station(&self) -> BTreeMap<StationId, usize> {
        let mut counts = BTreeMap::new();
        for booking in self.queue.iter() {
            if let Some(station) = self.stations.nearest_station(booking.pickup) {
                *counts.entry(station).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Idle vehicles at `station`, for inspection and tests.
    pub fn idle_at(&self, station: StationId) -> Vec<VehicleId> {
        self.availability.idle_vehicles(station)
    }
}
