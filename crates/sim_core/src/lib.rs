pub mod clock;
pub mod distributions;
pub mod ecs;
pub mod error;
pub mod generator;
pub mod profiling;
pub mod report;
pub mod resources;
pub mod rng;
pub mod runner;
pub mod scenario;
pub mod systems;
pub mod telemetry;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
