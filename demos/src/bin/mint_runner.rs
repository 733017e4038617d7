use std::process;

use anyhow::{Context as _, Result};
use loadtest_configs::LoadConfig;
use loadtest_core::sim::SimulationBuilder;
use loadtest_demos::SimulationBuilderExt as _;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    loadtest_demos::defaults::init_tracing();

    if let Err(err) = run_mint_case().await {
        warn!("mint load test failed: {err:#}");
        process::exit(1);
    }
}

async fn run_mint_case() -> Result<()> {
    let config = LoadConfig::from_env().context("reading LOADTEST_* configuration failed")?;

    info!(
        rpc_url = %config.rpc_url,
        users = config.users,
        pace_ms = config.pace.as_millis() as u64,
        run_secs = config.run_duration.as_secs(),
        "starting mint load test"
    );

    let report = SimulationBuilder::new(config)
        .mint_inscriptions()
        .build()
        .context("building the mint simulation failed")?
        .run()
        .await
        .context("running the mint simulation failed")?;

    info!(
        total_requests = report.total_requests(),
        "mint load test complete"
    );

    Ok(())
}
