//! Dispatch configuration.
//!
//! Built with `Default` plus `with_*` methods so call sites only name what
//! they change. Intervals and weights can also be adjusted on a live driver
//! between passes.

use crate::matching::{CostParams, MatchStrategy};

/// Static configuration for a [FleetManager](crate::manager::FleetManager).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchConfig {
    pub strategy: MatchStrategy,
    pub cost: CostParams,
    /// Simulation time between matching passes.
    pub matching_interval: f64,
    /// Simulation time between rebalancing passes; also the demand forecast
    /// horizon.
    pub rebalancing_interval: f64,
    /// Whether the queued-booking count per station is handed to the demand
    /// estimator on top of its own forecast.
    pub use_queue_for_estimation: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::default(),
            cost: CostParams::default(),
            matching_interval: 60.0,
            rebalancing_interval: 300.0,
            use_queue_for_estimation: false,
        }
    }
}

impl DispatchConfig {
    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cost(mut self, cost: CostParams) -> Self {
        self.cost = cost;
        self
    }

    pub fn with_matching_interval(mut self, interval: f64) -> Self {
        self.matching_interval = interval;
        self
    }

    pub fn with_rebalancing_interval(mut self, interval: f64) -> Self {
        self.rebalancing_interval = interval;
        self
    }

    pub fn with_queue_for_estimation(mut self, enabled: bool) -> Self {
        self.use_queue_for_estimation = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_only_touches_named_fields() {
        let config = DispatchConfig::default()
            .with_strategy(MatchStrategy::Greedy)
            .with_matching_interval(30.0);
        assert_eq!(config.strategy, MatchStrategy::Greedy);
        assert_eq!(config.matching_interval, 30.0);
        assert_eq!(config.rebalancing_interval, 300.0);
        assert!(!config.use_queue_for_estimation);
    }
}
