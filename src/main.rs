//! Runs the full suite and writes one JSON report per dimension.

use std::path::Path;

use anyhow::Context;
use shelf_bench::config::SuiteConfig;
use shelf_bench::suite::Suite;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "shelf-bench.toml";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = SuiteConfig::load_or_default(Path::new(CONFIG_PATH))
        .with_context(|| format!("loading {CONFIG_PATH}"))?;
    info!(
        seed = config.seed,
        output = %config.output_dir.display(),
        contenders = config.contenders.len(),
        "starting suite"
    );

    let suite = Suite::new(&config).context("building suite")?;
    let written = suite.run().context("running suite")?;
    info!(reports = written.len(), "suite finished");
    return Ok(());
}
