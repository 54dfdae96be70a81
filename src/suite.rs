//! Runs every dimension in order and writes each report as it completes.

use std::path::PathBuf;

use tracing::info;

use crate::config::SuiteConfig;
use crate::contender::BenchmarkEnvironment;
use crate::contender::environments;
use crate::error::Probe;
use crate::error::Result;
use crate::fuzzer::Fuzzer;
use crate::fuzzer::TreeShape;
use crate::micro::MicroBenchmark;
use crate::report::Dimension;
use crate::report::ReportWriter;
use crate::trials::TrialRunner;

pub struct Suite<'a> {
    config: &'a SuiteConfig,
    contenders: Vec<Box<dyn BenchmarkEnvironment>>,
    writer: ReportWriter,
}

impl<'a> Suite<'a> {
    /// A suite over the contenders `config` selects.
    pub fn new(config: &'a SuiteConfig) -> Result<Suite<'a>> {
        config.validate()?;
        let contenders = environments(&config.contenders);
        return Ok(Suite::with_contenders(config, contenders));
    }

    /// A suite over an explicit contender set; `config.contenders` is
    /// ignored.
    pub fn with_contenders(
        config: &'a SuiteConfig,
        contenders: Vec<Box<dyn BenchmarkEnvironment>>,
    ) -> Suite<'a> {
        return Suite {
            config,
            contenders,
            writer: ReportWriter::new(&config.output_dir),
        };
    }

    /// Each dimension restarts from the shared seed.
    fn fuzzer(&self, shape: TreeShape) -> Fuzzer {
        return Fuzzer::new(shape.with_seed(self.config.seed));
    }

    /// Run all dimensions; returns the written report paths in order. A
    /// failure leaves earlier reports on disk.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        let config = self.config;
        let runner = TrialRunner::new(&self.contenders);
        let mut written = Vec::with_capacity(Dimension::ALL.len());
        info!(
            dir = %self.writer.dir().display(),
            contenders = self.contenders.len(),
            seed = config.seed,
            "running suite"
        );

        info!(trials = config.delta_size.trials, "delta size");
        let mut fuzzer = self.fuzzer(config.delta_size.shape);
        let report = runner.delta_size(&mut fuzzer, config.delta_size.trials)?;
        info!(skipped = report.skipped, "delta size done");
        written.push(self.writer.write(Dimension::DeltaSize, &report)?);

        info!(trials = config.deletion_size.trials, "deletion size");
        let mut fuzzer = self.fuzzer(config.deletion_size.shape);
        let report = runner.deletion_size(&mut fuzzer, config.deletion_size.trials)?;
        written.push(self.writer.write(Dimension::DeletionSize, &report)?);

        info!("crdt size");
        let mut fuzzer = self.fuzzer(config.crdt_size.shape);
        let report = runner.crdt_size(&mut fuzzer)?;
        written.push(self.writer.write(Dimension::CrdtSize, &report)?);

        let additions = &config.additions;
        info!(batch = additions.batch, "additions");
        let bench = MicroBenchmark {
            name: Dimension::Additions.to_string(),
            warmup_rounds: additions.warmup_rounds,
            rounds: additions.rounds,
            include_setup_cost: additions.include_setup_cost,
        };
        let report = bench.run(&self.contenders, Probe::NAdditions, |env| {
            return env.test_n_additions(additions.batch);
        })?;
        written.push(self.writer.write(Dimension::Additions, &report)?);

        let merges = &config.merges;
        info!("merges");
        let bench = MicroBenchmark {
            name: Dimension::Merges.to_string(),
            warmup_rounds: merges.warmup_rounds,
            rounds: merges.rounds,
            include_setup_cost: merges.include_setup_cost,
        };
        let (first, second) = self.fuzzer(merges.shape).generate_pair();
        let report = bench.run(&self.contenders, Probe::Merge, |env| {
            return env.test_merge(first.clone(), second.clone());
        })?;
        written.push(self.writer.write(Dimension::Merges, &report)?);

        return Ok(written);
    }
}
