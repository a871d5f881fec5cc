//! Replications and parameter sweeps for the fuel-station simulation.
//!
//! Each parameter set runs in its own world on a rayon thread pool. Results are
//! flattened into [SimulationResult] rows, folded across seeds with
//! [summarize_replications], and written out as CSV, JSON or Parquet.
//!
//! # Quick Start
//!
//! ```no_run
//! use sim_core::scenario::{AcquisitionPolicy, ArrivalProfile};
//! use sim_experiments::{run_parallel_experiments, summarize_replications, ParameterSpace};
//!
//! let space = ParameterSpace::grid()
//!     .employee_capacity(vec![1, 2, 3])
//!     .arrival_profile(vec![ArrivalProfile::Normal, ArrivalProfile::Peak])
//!     .acquisition_policy(vec![AcquisitionPolicy::Composite])
//!     .replications(1, 10);
//!
//! let results = run_parallel_experiments(space.generate(), None)?;
//! for summary in summarize_replications(&results) {
//!     println!("{} served {:?}", summary.experiment_id, summary.vehicles_served.mean);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! - [`parameters`]: parameter grid over a base station configuration
//! - [`runner`]: parallel simulation execution using rayon
//! - [`metrics`]: per-run metrics and replication summaries
//! - [`export`]: result export to CSV/JSON/Parquet

pub mod export;
pub mod metrics;
pub mod parameters;
pub mod runner;

pub use export::{
    export_summaries_to_csv, export_summaries_to_json, export_to_csv, export_to_json,
    export_to_parquet,
};
pub use metrics::{summarize_replications, MetricSummary, ReplicationSummary, SimulationResult};
pub use parameters::{ParameterSet, ParameterSpace};
pub use runner::{run_parallel_experiments, run_single_simulation, ExperimentError};
