use crate::config::Config;
use crate::database::{
    CodeStore, DbPool, MemoryStore, SeaOrmStore, WinnerRegistry, create_pool, run_migrations,
};
use crate::error::AppResult;
use crate::external::{MailerService, Notifier};
use crate::services::{
    ClaimService, ProvisioningService, ReconciliationService, WinnerService,
};
use std::sync::Arc;

pub const MEMORY_DATABASE_URL: &str = "memory://";

/// 进程级资源：存储与通知句柄。启动时 `open`，退出时 `close`
#[derive(Clone)]
pub struct AppContext {
    pub codes: Arc<dyn CodeStore>,
    pub winners: Arc<dyn WinnerRegistry>,
    pub notifier: Arc<dyn Notifier>,
    pool: Option<DbPool>,
}

impl AppContext {
    /// 连接数据库并执行迁移；`memory://` 使用进程内存储
    pub async fn open(config: &Config) -> AppResult<Self> {
        let notifier: Arc<dyn Notifier> = Arc::new(MailerService::new(config.mailer.clone()));

        if config.database.url == MEMORY_DATABASE_URL {
            log::warn!("Using in-memory store; data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            return Ok(Self::with_stores(store.clone(), store, notifier));
        }

        let pool = create_pool(&config.database).await?;
        run_migrations(&pool).await?;

        let store = Arc::new(SeaOrmStore::new(pool.clone()));
        Ok(Self {
            codes: store.clone(),
            winners: store,
            notifier,
            pool: Some(pool),
        })
    }

    pub fn with_stores(
        codes: Arc<dyn CodeStore>,
        winners: Arc<dyn WinnerRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            codes,
            winners,
            notifier,
            pool: None,
        }
    }

    pub fn claim_service(&self) -> ClaimService {
        ClaimService::new(
            self.codes.clone(),
            self.winners.clone(),
            self.notifier.clone(),
        )
    }

    pub fn winner_service(&self, config: &Config) -> WinnerService {
        WinnerService::new(self.winners.clone(), config.admin.export_key.clone())
    }

    pub fn provisioning_service(&self) -> ProvisioningService {
        ProvisioningService::new(self.codes.clone())
    }

    pub fn reconciliation_service(&self, config: &Config) -> ReconciliationService {
        ReconciliationService::new(
            self.codes.clone(),
            config.redemption.pending_alert_after_secs,
        )
    }

    pub async fn close(self) -> AppResult<()> {
        if let Some(pool) = self.pool {
            pool.close().await?;
            log::info!("Database connections closed");
        }
        Ok(())
    }
}
