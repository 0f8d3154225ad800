//! Station rebalancing engine.
//!
//! Runs on the rebalancing interval over the station occupancy snapshot and
//! a per-station demand forecast, and returns a pure [RebalancePlan] of
//! integral inter-station flows that the driver turns into empty-vehicle
//! dispatches. The underlying transportation problem is solved behind the
//! [TransportSolver] boundary so the solver can be swapped without touching
//! the engine.

pub mod solver;

pub use solver::UnitAssignmentSolver;

use std::collections::BTreeMap;

use crate::error::SolverError;
use crate::geo::TravelMetric;
use crate::ids::StationId;
use crate::spatial::StationIndex;

/// Cost assigned to a station pair with no route between them. Large enough
/// that any routable alternative is preferred, finite so the problem stays
/// well-formed when no alternative exists.
pub const NO_ROUTE_COST: f64 = 1.0e11;

/// Per-station demand forecast over the next rebalancing horizon.
///
/// Implementations may be statistical models, historical lookups, or the
/// trivial uniform estimate; the engine only sees the numbers.
pub trait DemandEstimator {
    /// Expected number of customers requesting pickup at `station` within
    /// the next `horizon` time units. `queued` is the count of bookings
    /// currently waiting at that station, which the driver may ask the
    /// estimator to fold in.
    fn predict(&self, station: StationId, horizon: f64, queued: usize) -> f64;
}

/// One station's side of the balance: idle vehicles on hand versus forecast
/// demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StationBalance {
    pub station: StationId,
    pub idle: usize,
    pub predicted_demand: f64,
}

impl StationBalance {
    /// Whole vehicles this station can give up without dipping below its
    /// forecast demand.
    fn surplus(&self) -> u32 {
        let spare = self.idle as f64 - self.predicted_demand;
        if spare >= 1.0 {
            spare.floor() as u32
        } else {
            0
        }
    }

    /// Whole vehicles this station is short of its forecast demand.
    fn deficit(&self) -> u32 {
        let short = self.predicted_demand - self.idle as f64;
        if short >= 1.0 {
            short.floor() as u32
        } else {
            0
        }
    }
}

/// An integral vehicle flow from one station to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebalanceFlow {
    pub from: StationId,
    pub to: StationId,
    pub vehicles: u32,
}

/// Result of one rebalancing pass.
#[derive(Debug, Clone, Default)]
pub struct RebalancePlan {
    pub flows: Vec<RebalanceFlow>,
}

impl RebalancePlan {
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// Total vehicles the plan moves.
    pub fn total_vehicles(&self) -> u32 {
        self.flows.iter().map(|f| f.vehicles).sum()
    }

    /// Net outflow per station (outgoing minus incoming); stations not in
    /// any flow are absent.
    pub fn net_outflow(&self) -> BTreeMap<StationId, i64> {
        let mut net = BTreeMap::new();
        for flow in &self.flows {
            *net.entry(flow.from).or_insert(0) += flow.vehicles as i64;
            *net.entry(flow.to).or_insert(0) -= flow.vehicles as i64;
        }
        net
    }
}

/// The transportation problem handed to a [TransportSolver]: ship units from
/// supply nodes to demand nodes at minimum total cost.
#[derive(Debug, Clone)]
pub struct TransportProblem {
    /// Units available at each supply node.
    pub supplies: Vec<u32>,
    /// Units required at each demand node.
    pub demands: Vec<u32>,
    /// `costs[i][j]` is the per-unit cost of shipping from supply node `i`
    /// to demand node `j`. Finite and non-negative.
    pub costs: Vec<Vec<f64>>,
}

impl TransportProblem {
    pub fn total_supply(&self) -> u64 {
        self.supplies.iter().map(|&s| s as u64).sum()
    }

    pub fn total_demand(&self) -> u64 {
        self.demands.iter().map(|&d| d as u64).sum()
    }

    /// Units a valid solution must ship: all of the scarcer side.
    pub fn shipment_target(&self) -> u64 {
        self.total_supply().min(self.total_demand())
    }
}

/// Pluggable minimum-cost transportation solver.
///
/// A solution is a supply × demand flow matrix shipping
/// [TransportProblem::shipment_target] units without exceeding any supply or
/// demand. Fractional entries are permitted; the engine floors them.
pub trait TransportSolver {
    fn solve(&self, problem: &TransportProblem) -> Result<Vec<Vec<f64>>, SolverError>;
}

/// Plan one rebalancing pass over the given station balances.
///
/// Pure with respect to the fleet: the caller applies the plan. Returns an
/// empty plan when no station has a whole-vehicle surplus or deficit, and
/// propagates solver failure so the driver can skip the cycle.
pub fn plan_rebalancing(
    balances: &[StationBalance],
    stations: &StationIndex,
    metric: &dyn TravelMetric,
    solver: &dyn TransportSolver,
) -> Result<RebalancePlan, SolverError> {
    let mut suppliers: Vec<(StationId, u32)> = Vec::new();
    let mut demanders: Vec<(StationId, u32)> = Vec::new();
    for balance in balances {
        let surplus = balance.surplus();
        if surplus > 0 {
            suppliers.push((balance.station, surplus));
        }
        let deficit = balance.deficit();
        if deficit > 0 {
            demanders.push((balance.station, deficit));
        }
    }

    if suppliers.is_empty() || demanders.is_empty() {
        return Ok(RebalancePlan::default());
    }

    let mut costs = Vec::with_capacity(suppliers.len());
    for &(from, _) in &suppliers {
        let mut row = Vec::with_capacity(demanders.len());
        for &(to, _) in &demanders {
            let cost = match (stations.station_position(from), stations.station_position(to)) {
                (Some(a), Some(b)) => metric.travel_distance(a, b).unwrap_or(NO_ROUTE_COST),
                _ => NO_ROUTE_COST,
            };
            row.push(cost);
        }
        costs.push(row);
    }

    let problem = TransportProblem {
        supplies: suppliers.iter().map(|&(_, s)| s).collect(),
        demands: demanders.iter().map(|&(_, d)| d).collect(),
        costs,
    };

    let solution = solver.solve(&problem)?;
    if solution.len() != suppliers.len()
        || solution.iter().any(|row| row.len() != demanders.len())
    {
        return Err(SolverError::Failed(format!(
            "solution shape {}x{} does not match problem {}x{}",
            solution.len(),
            solution.first().map_or(0, Vec::len),
            suppliers.len(),
            demanders.len(),
        )));
    }

    let mut flows = Vec::new();
    for (i, row) in solution.iter().enumerate() {
        for (j, &amount) in row.iter().enumerate() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(SolverError::Failed(format!(
                    "invalid flow {amount} from {} to {}",
                    suppliers[i].0, demanders[j].0
                )));
            }
            let vehicles = amount.floor() as u32;
            if vehicles > 0 {
                flows.push(RebalanceFlow {
                    from: suppliers[i].0,
                    to: demanders[j].0,
                    vehicles,
                });
            }
        }
    }

    Ok(RebalancePlan { flows })
}
