//! Optimal matching via the assignment problem (Kuhn-Munkres).
//!
//! Costs are negated and scaled to i64 weights so the maximum-weight
//! matching minimizes total cost. Pairs without a route get a weight worse
//! than any feasible pairing and are filtered out of the result.

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

use crate::error::SolverError;
use crate::geo::TravelMetric;

use super::{pair_cost, BookingCandidate, CostParams, MatchPair, VehicleCandidate};

/// Scale factor converting f64 costs to i64 weights.
const SCALE: f64 = 1_000_000.0;

/// Weight for unreachable pairs (never selected). Worse than any feasible
/// weight, small enough that negating and summing cannot overflow i64.
const INFEASIBLE: i64 = -1_000_000_000_000_i64;

/// Matrix type implementing pathfinding's Weights for i64.
struct CostWeights(Vec<Vec<i64>>);

impl Weights<i64> for CostWeights {
    fn rows(&self) -> usize {
        self.0.len()
    }

    fn columns(&self) -> usize {
        self.0.first().map_or(0, |r| r.len())
    }

    fn at(&self, row: usize, col: usize) -> i64 {
        self.0[row][col]
    }

    fn neg(&self) -> Self {
        CostWeights(
            self.0
                .iter()
                .map(|r| r.iter().map(|&x| x.saturating_neg()).collect())
                .collect(),
        )
    }
}

/// Convert a pairing cost to a maximization weight (clamped into the
/// feasible band above [INFEASIBLE]).
fn cost_to_weight(cost: f64) -> i64 {
    let w = -cost * SCALE;
    if w <= INFEASIBLE as f64 {
        INFEASIBLE + 1
    } else if w >= 0.0 {
        0
    } else {
        w as i64
    }
}

/// Solve the minimum-cost one-to-one pairing between vehicles and bookings.
///
/// Produces `min(|vehicles|, |bookings|)` pairs minus any whose only option
/// was an unreachable pickup. Errors only on malformed cost input (the
/// degraded-mode guard the engine falls back to greedy on).
pub fn solve_assignment(
    vehicles: &[VehicleCandidate],
    bookings: &[BookingCandidate],
    params: &CostParams,
    now: f64,
    metric: &dyn TravelMetric,
) -> Result<Vec<MatchPair>, SolverError> {
    if vehicles.is_empty() || bookings.is_empty() {
        return Ok(Vec::new());
    }

    // Kuhn-Munkres requires rows <= columns; use the smaller set as rows.
    let bookings_as_rows = bookings.len() <= vehicles.len();
    let (rows, cols) = if bookings_as_rows {
        (bookings.len(), vehicles.len())
    } else {
        (vehicles.len(), bookings.len())
    };

    let mut matrix = vec![vec![INFEASIBLE; cols]; rows];
    let mut any_feasible = false;
    for (v_idx, vehicle) in vehicles.iter().enumerate() {
        for (b_idx, booking) in bookings.iter().enumerate() {
            let Some(cost) = pair_cost(vehicle, booking, params, now, metric) else {
                continue;
            };
            if !cost.is_finite() {
                return Err(SolverError::Failed(format!(
                    "non-finite cost for vehicle {} and booking {}",
                    vehicle.vehicle, booking.booking
                )));
            }
            any_feasible = true;
            let (row, col) = if bookings_as_rows {
                (b_idx, v_idx)
            } else {
                (v_idx, b_idx)
            };
            matrix[row][col] = cost_to_weight(cost);
        }
    }

    if !any_feasible {
        return Ok(Vec::new());
    }

    let weights = CostWeights(matrix);
    let (_total, assignment) = kuhn_munkres(&weights);

    let mut pairs = Vec::with_capacity(rows);
    for (row, &col) in assignment.iter().enumerate() {
        if weights.at(row, col) <= INFEASIBLE {
            continue;
        }
        let (b_idx, v_idx) = if bookings_as_rows { (row, col) } else { (col, row) };
        pairs.push(MatchPair {
            booking: bookings[b_idx].booking,
            vehicle: vehicles[v_idx].vehicle,
        });
    }
    Ok(pairs)
}
