//! Generates the code universe in batches. Run once before launch.

use anyhow::{Context, Result};
use promo_backend::database::CodeStore;
use promo_backend::{AppContext, Config, logging};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::from_toml()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("Failed to load configuration")?;
    let ctx = AppContext::open(&config)
        .await
        .context("Failed to open code store")?;

    let p = &config.provisioning;
    log::info!(
        "Generating {} codes of length {} in batches of {}",
        p.total_codes,
        p.code_length,
        p.batch_size
    );

    let created = ctx
        .provisioning_service()
        .generate_codes(p.total_codes, p.code_length, p.batch_size)
        .await
        .context("Code generation failed")?;
    let total = ctx.codes.count_codes().await.context("Failed to count codes")?;
    log::info!("Created {created} codes ({total} in store)");

    ctx.close().await.context("Failed to close code store")?;
    Ok(())
}
