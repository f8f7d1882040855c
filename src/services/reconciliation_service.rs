use crate::database::CodeStore;
use crate::entities::code_entity as codes;
use crate::error::AppResult;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

const PENDING_SCAN_LIMIT: u64 = 500;

/// 对账：找出已占用但中奖登记未完成（result = pending）的兑换码
#[derive(Clone)]
pub struct ReconciliationService {
    codes: Arc<dyn CodeStore>,
    alert_after: Duration,
}

impl ReconciliationService {
    pub fn new(codes: Arc<dyn CodeStore>, alert_after_secs: i64) -> Self {
        Self {
            codes,
            alert_after: Duration::seconds(alert_after_secs),
        }
    }

    pub async fn list_pending(&self) -> AppResult<Vec<codes::Model>> {
        self.codes.list_pending(PENDING_SCAN_LIMIT).await
    }

    /// 返回 pending 时间超过阈值的码，并逐条记 error 日志
    pub async fn report_stale(&self, now: DateTime<Utc>) -> AppResult<Vec<codes::Model>> {
        let stale: Vec<codes::Model> = self
            .list_pending()
            .await?
            .into_iter()
            .filter(|c| c.claimed_at.is_some_and(|at| now - at >= self.alert_after))
            .collect();

        for c in &stale {
            log::error!(
                "Reconciliation required: code={} winner_id={} claimed_at={}",
                c.code,
                c.claimant_ref.map(|id| id.to_string()).unwrap_or_default(),
                c.claimed_at.map(|at| at.to_rfc3339()).unwrap_or_default()
            );
        }
        Ok(stale)
    }
}
