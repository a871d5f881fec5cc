//! Parallel simulation execution using rayon.
//!
//! Every parameter set builds its own world, so runs share no state and can be
//! spread over a thread pool. Results come back in input order.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use sim_core::error::SimError;
use sim_core::runner::run_station;
use thiserror::Error;

use crate::metrics::SimulationResult;
use crate::parameters::ParameterSet;

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("failed to create thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("run {run_id} of {experiment_id} failed: {source}")]
    Run {
        experiment_id: String,
        run_id: usize,
        #[source]
        source: SimError,
    },
}

/// Run one station day for `param_set` and extract its metrics.
pub fn run_single_simulation(param_set: &ParameterSet) -> Result<SimulationResult, SimError> {
    let report = run_station(&param_set.station_config())?;
    Ok(SimulationResult::from_report(param_set, &report))
}

/// Run multiple simulations in parallel with a progress bar.
///
/// `num_threads` of `None` uses rayon's default. Stops with the first failing run.
pub fn run_parallel_experiments(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
) -> Result<Vec<SimulationResult>, ExperimentError> {
    run_parallel_experiments_with_progress(parameter_sets, num_threads, true)
}

/// [run_parallel_experiments] with the progress bar optional.
pub fn run_parallel_experiments_with_progress(
    parameter_sets: Vec<ParameterSet>,
    num_threads: Option<usize>,
    show_progress: bool,
) -> Result<Vec<SimulationResult>, ExperimentError> {
    let total = parameter_sets.len();
    let pb = if show_progress && total > 0 {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Some(bar)
    } else {
        None
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(threads) = num_threads {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build()?;

    tracing::info!(runs = total, threads = pool.current_num_threads(), "starting experiments");

    let pb_clone = pb.clone();
    let results = pool.install(|| {
        parameter_sets
            .par_iter()
            .map(|param_set| {
                let result = run_single_simulation(param_set).map_err(|source| {
                    tracing::warn!(
                        experiment_id = %param_set.experiment_id,
                        run_id = param_set.run_id,
                        error = %source,
                        "run failed"
                    );
                    ExperimentError::Run {
                        experiment_id: param_set.experiment_id.clone(),
                        run_id: param_set.run_id,
                        source,
                    }
                });
                if let Some(ref progress_bar) = pb_clone {
                    progress_bar.inc(1);
                }
                result
            })
            .collect::<Result<Vec<_>, _>>()
    });

    if let Some(ref progress_bar) = pb {
        progress_bar.finish_with_message("Completed");
    }

    let results = results?;
    tracing::info!(runs = results.len(), "experiments finished");
    Ok(results)
}
