//! The differential trial loop for the size dimensions.
//!
//! Every contender sees the same generated trees in the same trial, each
//! through its own clone. A delta trial whose two trees are identical is
//! dropped for every contender: replicas that start equal produce a
//! degenerate delta that would flatter whichever engine sends nothing.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::contender::BenchmarkEnvironment;
use crate::error::Probe;
use crate::error::Result;
use crate::fuzzer::Fuzzer;
use crate::metrics::FoldedMetrics;
use crate::metrics::fold;

/// Samples from a multi-trial dimension.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SampledReport {
    /// Trials requested.
    pub trials: usize,
    /// Trials dropped because both trees were equal.
    pub skipped: usize,
    #[serde(flatten)]
    pub contenders: FoldedMetrics,
}

/// Encoded sizes from the single-trial dimension.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    /// Serialized JSON length of the generated tree.
    pub input: u64,
    #[serde(flatten)]
    pub contenders: BTreeMap<String, u64>,
}

pub struct TrialRunner<'a> {
    contenders: &'a [Box<dyn BenchmarkEnvironment>],
}

impl<'a> TrialRunner<'a> {
    pub fn new(contenders: &'a [Box<dyn BenchmarkEnvironment>]) -> TrialRunner<'a> {
        return TrialRunner { contenders };
    }

    fn empty_report(&self, trials: usize) -> SampledReport {
        let mut report = SampledReport {
            trials,
            ..SampledReport::default()
        };
        for env in self.contenders {
            report.contenders.entry(env.name().to_string()).or_default();
        }
        return report;
    }

    pub fn delta_size(&self, fuzzer: &mut Fuzzer, trials: usize) -> Result<SampledReport> {
        debug!(seed = fuzzer.config().seed, trials, "delta size trials");
        let mut report = self.empty_report(trials);
        for trial in 0..trials {
            let (first, second) = fuzzer.generate_pair();
            if first == second {
                debug!(trial, "identical trees, skipping trial");
                report.skipped += 1;
                continue;
            }

            for env in self.contenders {
                let name = env.name();
                let sizes = env
                    .test_delta_size(first.clone(), second.clone())
                    .map_err(|err| err.in_trial(name, Probe::DeltaSize, trial))?;
                let acc = report.contenders.entry(name.to_string()).or_default();
                *acc = fold(std::mem::take(acc), &sizes);
            }
            debug!(trial, "delta trial done");
        }
        return Ok(report);
    }

    pub fn deletion_size(&self, fuzzer: &mut Fuzzer, trials: usize) -> Result<SampledReport> {
        debug!(seed = fuzzer.config().seed, trials, "deletion size trials");
        let mut report = self.empty_report(trials);
        for trial in 0..trials {
            let values = fuzzer.generate_content();
            for env in self.contenders {
                let name = env.name();
                let sizes = env
                    .test_size_after_deletion(values.clone())
                    .map_err(|err| err.in_trial(name, Probe::SizeAfterDeletion, trial))?;
                let acc = report.contenders.entry(name.to_string()).or_default();
                *acc = fold(std::mem::take(acc), &sizes);
            }
            debug!(trial, "deletion trial done");
        }
        return Ok(report);
    }

    pub fn crdt_size(&self, fuzzer: &mut Fuzzer) -> Result<SizeReport> {
        let values = fuzzer.generate_content();
        let mut report = SizeReport {
            input: serde_json::to_vec(&values)?.len() as u64,
            contenders: BTreeMap::new(),
        };
        for env in self.contenders {
            let name = env.name();
            let size = env
                .test_crdt_size(values.clone())
                .map_err(|err| err.in_trial(name, Probe::CrdtSize, 0))?;
            debug!(contender = name, size, "crdt size");
            report.contenders.insert(name.to_string(), size);
        }
        return Ok(report);
    }
}
