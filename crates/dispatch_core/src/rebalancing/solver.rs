//! Default transportation solver.
//!
//! Expands the integral transportation problem into unit supply and demand
//! nodes and solves it as an assignment problem with Kuhn-Munkres. Exact for
//! the fleet sizes this crate targets; swap in an LP-backed
//! [TransportSolver](super::TransportSolver) through the driver when the
//! expansion grows too large.

use pathfinding::kuhn_munkres::{kuhn_munkres, Weights};

use crate::error::SolverError;

use super::{TransportProblem, TransportSolver};

/// Scale factor converting per-unit costs to i64 weights.
const SCALE: f64 = 1_000.0;

/// Weight floor; clamping keeps sums over the unit expansion inside i64.
const MIN_WEIGHT: i64 = -1_000_000_000_000_000_i64;

/// Upper bound on the unit-expanded matrix area before the solver refuses
/// the problem instead of stalling the tick.
const MAX_CELLS: usize = 4_000_000;

struct UnitWeights(Vec<Vec<i64>>);

impl Weights<i64> for UnitWeights {
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
        UnitWeights(
            self.0
                .iter()
                .map(|r| r.iter().map(|&x| x.saturating_neg()).collect())
                .collect(),
        )
    }
}

fn cost_to_weight(cost: f64) -> i64 {
    let w = -cost * SCALE;
    if w <= MIN_WEIGHT as f64 {
        MIN_WEIGHT
    } else if w >= 0.0 {
        0
    } else {
        w as i64
    }
}

/// Unit-expansion assignment solver; the crate's default.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitAssignmentSolver;

impl TransportSolver for UnitAssignmentSolver {
    fn solve(&self, problem: &TransportProblem) -> Result<Vec<Vec<f64>>, SolverError> {
        let supply_nodes = problem.supplies.len();
        let demand_nodes = problem.demands.len();
        if problem.costs.len() != supply_nodes
            || problem.costs.iter().any(|row| row.len() != demand_nodes)
        {
            return Err(SolverError::Failed(format!(
                "cost matrix shape does not match {supply_nodes} supplies x {demand_nodes} demands"
            )));
        }
        for row in &problem.costs {
            for &cost in row {
                if !cost.is_finite() || cost < 0.0 {
                    return Err(SolverError::Failed(format!("invalid cost {cost}")));
                }
            }
        }

        let total_supply = problem.total_supply();
        let total_demand = problem.total_demand();
        if total_supply == 0 || total_demand == 0 {
            return Err(SolverError::Infeasible);
        }
        let cells = (total_supply as usize).saturating_mul(total_demand as usize);
        if cells > MAX_CELLS {
            return Err(SolverError::Failed(format!(
                "unit expansion too large ({total_supply} x {total_demand} units)"
            )));
        }

        // One entry per unit, tagged with its originating node.
        let mut supply_units = Vec::with_capacity(total_supply as usize);
        for (i, &supply) in problem.supplies.iter().enumerate() {
            supply_units.extend(std::iter::repeat(i).take(supply as usize));
        }
        let mut demand_units = Vec::with_capacity(total_demand as usize);
        for (j, &demand) in problem.demands.iter().enumerate() {
            demand_units.extend(std::iter::repeat(j).take(demand as usize));
        }

        // Kuhn-Munkres needs rows <= columns; every row then gets assigned,
        // which ships exactly min(supply, demand) units.
        let supply_as_rows = supply_units.len() <= demand_units.len();
        let (row_units, col_units) = if supply_as_rows {
            (&supply_units, &demand_units)
        } else {
            (&demand_units, &supply_units)
        };

        let matrix: Vec<Vec<i64>> = row_units
            .iter()
            .map(|&r| {
                col_units
                    .iter()
                    .map(|&c| {
                        let (i, j) = if supply_as_rows { (r, c) } else { (c, r) };
                        cost_to_weight(problem.costs[i][j])
                    })
                    .collect()
            })
            .collect();

        let weights = UnitWeights(matrix);
        let (_total, assignment) = kuhn_munkres(&weights);

        let mut flows = vec![vec![0.0_f64; demand_nodes]; supply_nodes];
        for (row, &col) in assignment.iter().enumerate() {
            let (i, j) = if supply_as_rows {
                (row_units[row], col_units[col])
            } else {
                (col_units[col], row_units[row])
            };
            flows[i][j] += 1.0;
        }
        Ok(flows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(flows: &[Vec<f64>]) -> f64 {
        flows.iter().flatten().sum()
    }

    #[test]
    fn ships_all_supply_when_demand_exceeds_it() {
        let problem = TransportProblem {
            supplies: vec![2],
            demands: vec![3, 3],
            costs: vec![vec![1.0, 10.0]],
        };
        let flows = UnitAssignmentSolver.solve(&problem).expect("solvable");
        assert_eq!(total(&flows), 2.0);
        // Both units take the cheap edge.
        assert_eq!(flows[0][0], 2.0);
    }

    #[test]
    fn ships_all_demand_when_supply_exceeds_it() {
        let problem = TransportProblem {
            supplies: vec![5, 5],
            demands: vec![3],
            costs: vec![vec![4.0], vec![1.0]],
        };
        let flows = UnitAssignmentSolver.solve(&problem).expect("solvable");
        assert_eq!(total(&flows), 3.0);
        // The cheaper supplier covers the whole demand.
        assert_eq!(flows[1][0], 3.0);
    }

    #[test]
    fn splits_flow_across_suppliers_when_cheaper() {
        // Demand of 3; near supplier has only 2 units.
        let problem = TransportProblem {
            supplies: vec![2, 4],
            demands: vec![3],
            costs: vec![vec![1.0], vec![5.0]],
        };
        let flows = UnitAssignmentSolver.solve(&problem).expect("solvable");
        assert_eq!(flows[0][0], 2.0);
        assert_eq!(flows[1][0], 1.0);
    }

    #[test]
    fn respects_per_node_capacities() {
        let problem = TransportProblem {
            supplies: vec![3, 3],
            demands: vec![2, 2],
            costs: vec![vec![1.0, 2.0], vec![2.0, 1.0]],
        };
        let flows = UnitAssignmentSolver.solve(&problem).expect("solvable");
        for (i, row) in flows.iter().enumerate() {
            assert!(row.iter().sum::<f64>() <= problem.supplies[i] as f64);
        }
        for j in 0..2 {
            let arriving: f64 = flows.iter().map(|row| row[j]).sum();
            assert!(arriving <= problem.demands[j] as f64);
        }
        assert_eq!(total(&flows), 4.0);
    }

    #[test]
    fn rejects_malformed_costs() {
        let problem = TransportProblem {
            supplies: vec![1],
            demands: vec![1],
            costs: vec![vec![f64::NAN]],
        };
        assert!(matches!(
            UnitAssignmentSolver.solve(&problem),
            Err(SolverError::Failed(_))
        ));

        let wrong_shape = TransportProblem {
            supplies: vec![1, 1],
            demands: vec![1],
            costs: vec![vec![1.0]],
        };
        assert!(UnitAssignmentSolver.solve(&wrong_shape).is_err());
    }

    #[test]
    fn empty_side_is_infeasible() {
        let problem = TransportProblem {
            supplies: vec![0],
            demands: vec![2],
            costs: vec![vec![1.0]],
        };
        assert!(matches!(
            UnitAssignmentSolver.solve(&problem),
            Err(SolverError::Infeasible)
        ));
    }
}
