//! Probability distributions for inter-arrival gaps and service durations.
//!
//! All draws take the run's [SimRng] explicitly; distributions hold parameters
//! only, never random state.

use serde::{Deserialize, Serialize};

use crate::rng::SimRng;

/// Trait for sampling inter-arrival times (in minutes).
pub trait InterArrivalDistribution: Send + Sync + std::fmt::Debug {
    /// Sample the gap until the next arrival.
    /// `spawn_count` is the number of vehicles admitted so far.
    /// `now` is the current simulation time in minutes.
    fn sample(&self, rng: &mut SimRng, spawn_count: u64, now: f64) -> f64;
}

/// Constant inter-arrival time.
#[derive(Debug, Clone)]
pub struct FixedInterArrival {
    pub interval: f64,
}

impl FixedInterArrival {
    pub fn new(interval: f64) -> Self {
        Self { interval }
    }
}

impl InterArrivalDistribution for FixedInterArrival {
    fn sample(&self, _rng: &mut SimRng, _spawn_count: u64, _now: f64) -> f64 {
        self.interval
    }
}

/// Exponential distribution: Poisson arrivals at a constant rate.
#[derive(Debug, Clone)]
pub struct ExponentialInterArrival {
    /// Expected number of arrivals per minute.
    pub rate_per_min: f64,
}

impl ExponentialInterArrival {
    pub fn new(rate_per_min: f64) -> Self {
        Self {
            rate_per_min: rate_per_min.max(0.0),
        }
    }
}

impl InterArrivalDistribution for ExponentialInterArrival {
    fn sample(&self, rng: &mut SimRng, _spawn_count: u64, _now: f64) -> f64 {
        rng.exponential_rate(self.rate_per_min)
    }
}

/// Replays a fixed list of absolute arrival times. Once the list is exhausted
/// the next gap is infinite, so no further arrivals happen.
#[derive(Debug, Clone)]
pub struct TraceInterArrival {
    pub arrival_times: Vec<f64>,
}

impl TraceInterArrival {
    pub fn new(mut arrival_times: Vec<f64>) -> Self {
        arrival_times.sort_by(f64::total_cmp);
        Self { arrival_times }
    }
}

impl InterArrivalDistribution for TraceInterArrival {
    fn sample(&self, _rng: &mut SimRng, spawn_count: u64, now: f64) -> f64 {
        usize::try_from(spawn_count)
            .ok()
            .and_then(|idx| self.arrival_times.get(idx))
            .map(|&at| (at - now).max(0.0))
            .unwrap_or(f64::INFINITY)
    }
}

/// Duration of one service step (fueling or payment), in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceTime {
    Fixed { minutes: f64 },
    Exponential { mean: f64 },
}

impl ServiceTime {
    pub fn sample(&self, rng: &mut SimRng) -> f64 {
        match *self {
            ServiceTime::Fixed { minutes } => minutes.max(0.0),
            ServiceTime::Exponential { mean } => rng.exponential_mean(mean),
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            ServiceTime::Fixed { minutes } => minutes,
            ServiceTime::Exponential { mean } => mean,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_inter_arrival_constant() {
        let mut rng = SimRng::seed_from_u64(0);
        let dist = FixedInterArrival::new(2.5);
        assert_eq!(dist.sample(&mut rng, 0, 0.0), 2.5);
        assert_eq!(dist.sample(&mut rng, 100, 40.0), 2.5);
    }

    #[test]
    fn exponential_inter_arrival() {
        let mut rng = SimRng::seed_from_u64(42);
        let dist = ExponentialInterArrival::new(1.0 / 3.0);
        let sample = dist.sample(&mut rng, 0, 0.0);
        assert!(sample > 0.0);
        assert!(sample.is_finite());
    }

    #[test]
    fn exponential_zero_rate() {
        let mut rng = SimRng::seed_from_u64(42);
        let dist = ExponentialInterArrival::new(0.0);
        assert_eq!(dist.sample(&mut rng, 0, 0.0), f64::INFINITY);
    }

    #[test]
    fn trace_replays_absolute_times() {
        let mut rng = SimRng::seed_from_u64(0);
        let dist = TraceInterArrival::new(vec![1.0, 0.0, 4.0]);
        assert_eq!(dist.sample(&mut rng, 0, 0.0), 0.0);
        assert_eq!(dist.sample(&mut rng, 1, 0.0), 1.0);
        assert_eq!(dist.sample(&mut rng, 2, 1.0), 3.0);
        assert_eq!(dist.sample(&mut rng, 3, 4.0), f64::INFINITY);
    }

    #[test]
    fn service_time_serde_shape() {
        let json = serde_json::to_string(&ServiceTime::Fixed { minutes: 0.4 }).expect("json");
        assert_eq!(json, r#"{"kind":"fixed","minutes":0.4}"#);
        let parsed: ServiceTime =
            serde_json::from_str(r#"{"kind":"exponential","mean":4.0}"#).expect("parse");
        assert_eq!(parsed, ServiceTime::Exponential { mean: 4.0 });
    }
}
