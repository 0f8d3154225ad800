pub mod availability;
pub mod booking;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod ingestion;
pub mod manager;
pub mod matching;
pub mod queue;
pub mod rebalancing;
pub mod spatial;
pub mod telemetry;
pub mod world;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
