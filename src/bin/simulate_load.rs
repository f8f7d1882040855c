//! Fires concurrent `check-code` requests with random codes at a running server.
//!
//! Environment: `LOAD_URL` (default `http://localhost:3000/api/check-code`),
//! `LOAD_CONCURRENCY` (default 500), `LOAD_REQUESTS` (default 2000).

use anyhow::{Context, Result};
use futures_util::{StreamExt, stream};
use promo_backend::{logging, utils::generate_code};
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Instant;

#[derive(Debug, Default)]
struct Tally {
    ok: usize,
    rate_limited: usize,
    errors: usize,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let url = std::env::var("LOAD_URL")
        .unwrap_or_else(|_| "http://localhost:3000/api/check-code".to_string());
    let concurrency: usize = env_or("LOAD_CONCURRENCY", 500);
    let total: usize = env_or("LOAD_REQUESTS", 2000);

    let client = Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    log::info!("Sending {total} requests to {url} with concurrency {concurrency}");
    let started = Instant::now();

    let statuses: Vec<Option<StatusCode>> = stream::iter(0..total)
        .map(|_| {
            let client = client.clone();
            let url = url.clone();
            let code = generate_code(&mut rand::thread_rng(), 8);
            async move {
                match client.post(&url).json(&json!({ "code": code })).send().await {
                    Ok(resp) => Some(resp.status()),
                    Err(e) => {
                        log::debug!("Request failed: {e}");
                        None
                    }
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut tally = Tally::default();
    for status in statuses {
        match status {
            Some(StatusCode::OK) => tally.ok += 1,
            Some(StatusCode::TOO_MANY_REQUESTS) => tally.rate_limited += 1,
            _ => tally.errors += 1,
        }
    }

    let secs = started.elapsed().as_secs_f64();
    log::info!(
        "Finished in {secs:.2}s: ok={} rate_limited={} errors={} throughput={:.2} req/s",
        tally.ok,
        tally.rate_limited,
        tally.errors,
        total as f64 / secs.max(f64::EPSILON)
    );

    if tally.errors > 0 {
        log::error!("Server returned errors under load, check the server logs");
    }
    Ok(())
}
