//! Wall-clock throughput of thunk-producing probes.
//!
//! Per contender: one thunk is warmed up untimed, then every timed round
//! runs a brand-new thunk so state built up by earlier rounds never leaks
//! into later ones. Setup stays outside the timing window unless
//! `include_setup_cost` is set.
//!
//! Throughput is `1000 / average_ms`: thunk calls per second.

use std::time::Duration;
use std::time::Instant;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::contender::BenchmarkEnvironment;
use crate::contender::Thunk;
use crate::error::Probe;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq)]
pub struct MicroBenchmark {
    pub name: String,
    pub warmup_rounds: usize,
    pub rounds: usize,
    pub include_setup_cost: bool,
}

/// One contender's averaged timing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub contender: String,
    pub average_ms: f64,
    pub throughput: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub fastest: String,
    pub slowest: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThroughputReport {
    pub name: String,
    pub warmup_rounds: usize,
    pub rounds: usize,
    pub include_setup_cost: bool,
    /// In contender order.
    pub results: Vec<Measurement>,
    pub summary: Option<Summary>,
}

impl MicroBenchmark {
    pub fn new(name: impl Into<String>) -> MicroBenchmark {
        return MicroBenchmark {
            name: name.into(),
            warmup_rounds: 3,
            rounds: 7,
            include_setup_cost: false,
        };
    }

    /// Time `factory`'s thunks for every contender. `probe` names the
    /// probe the factory calls, for error context.
    pub fn run<F>(
        &self,
        contenders: &[Box<dyn BenchmarkEnvironment>],
        probe: Probe,
        mut factory: F,
    ) -> Result<ThroughputReport>
    where
        F: FnMut(&dyn BenchmarkEnvironment) -> Result<Thunk>,
    {
        let mut results = Vec::with_capacity(contenders.len());
        for env in contenders {
            let name = env.name();
            let average = self
                .measure(env.as_ref(), &mut factory)
                .map_err(|err| err.in_probe(name, probe))?;
            let measurement = Measurement {
                contender: name.to_string(),
                average_ms: millis(average),
                throughput: throughput(average),
            };
            debug!(
                benchmark = %self.name,
                contender = name,
                throughput = measurement.throughput,
                "measured"
            );
            results.push(measurement);
        }

        let pairs: Vec<(&str, f64)> = results
            .iter()
            .map(|m| (m.contender.as_str(), m.throughput))
            .collect();
        let summary = summarize(&pairs);
        return Ok(ThroughputReport {
            name: self.name.clone(),
            warmup_rounds: self.warmup_rounds,
            rounds: self.rounds,
            include_setup_cost: self.include_setup_cost,
            results,
            summary,
        });
    }

    /// Average elapsed time of one thunk call.
    fn measure<F>(&self, env: &dyn BenchmarkEnvironment, factory: &mut F) -> Result<Duration>
    where
        F: FnMut(&dyn BenchmarkEnvironment) -> Result<Thunk>,
    {
        let mut warm = factory(env)?;
        for _ in 0..self.warmup_rounds {
            warm()?;
        }

        let mut total = Duration::ZERO;
        for round in 0..self.rounds {
            let elapsed = if self.include_setup_cost {
                let start = Instant::now();
                let mut thunk = factory(env)?;
                thunk()?;
                start.elapsed()
            } else {
                let mut thunk = factory(env)?;
                let start = Instant::now();
                thunk()?;
                start.elapsed()
            };
            debug!(round, ?elapsed, "round");
            total += elapsed;
        }
        let rounds = u32::try_from(self.rounds.max(1)).unwrap_or(u32::MAX);
        return Ok(total / rounds);
    }
}

fn millis(duration: Duration) -> f64 {
    return duration.as_nanos().max(1) as f64 / 1_000_000.0;
}

/// Thunk calls per second for an average call time; elapsed time is
/// floored at one nanosecond.
pub fn throughput(average: Duration) -> f64 {
    return 1000.0 / millis(average);
}

/// The strictly fastest and strictly slowest contenders. Ties keep the
/// first one seen.
pub fn summarize<S: AsRef<str>>(results: &[(S, f64)]) -> Option<Summary> {
    let (first, rest) = results.split_first()?;
    let mut fastest = first;
    let mut slowest = first;
    for entry in rest {
        if entry.1 > fastest.1 {
            fastest = entry;
        }
        if entry.1 < slowest.1 {
            slowest = entry;
        }
    }
    return Some(Summary {
        fastest: fastest.0.as_ref().to_string(),
        slowest: slowest.0.as_ref().to_string(),
    });
}
