//! Marks a random sample of fresh codes as prizes.
//!
//! Refuses to run once `redemption.opens_at` has passed; pass `--force` to override.

use anyhow::{Context, Result};
use promo_backend::{AppContext, Config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let force = std::env::args().skip(1).any(|a| a == "--force");

    let config = Config::from_toml()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to load configuration")?;
    let ctx = AppContext::open(&config)
        .await
        .context("Failed to open code store")?;

    let assignments = ctx
        .provisioning_service()
        .assign_prizes(
            config.provisioning.prize_count,
            &config.provisioning.prizes,
            config.redemption.opens_at,
            force,
        )
        .await
        .context("Prize assignment failed")?;

    for a in &assignments {
        log::info!("Prize {} assigned to {}", a.prize_type, a.code);
    }
    log::info!(
        "Assigned {} of {} requested prizes",
        assignments.len(),
        config.provisioning.prize_count
    );

    ctx.close().await.context("Failed to close code store")?;
    Ok(())
}
