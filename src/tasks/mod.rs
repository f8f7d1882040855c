//! Background jobs.
//!
//! Call `spawn_all` once during startup; tasks are detached with `tokio::spawn`.

use crate::services::ReconciliationService;
use chrono::Utc;

const RECONCILIATION_INTERVAL_SECS: u64 = 60;

pub fn spawn_all(reconciliation_service: ReconciliationService) {
    // 每分钟检查长时间停留在 pending 的兑换码
    {
        let svc = reconciliation_service.clone();
        tokio::spawn(async move {
            loop {
                match svc.report_stale(Utc::now()).await {
                    Ok(stale) if !stale.is_empty() => {
                        log::warn!("{} claims awaiting reconciliation", stale.len())
                    }
                    Ok(_) => {}
                    Err(e) => log::error!("Failed to scan pending claims: {e:?}"),
                }
                tokio::time::sleep(std::time::Duration::from_secs(RECONCILIATION_INTERVAL_SECS))
                    .await;
            }
        });
    }
}
