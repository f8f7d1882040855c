use crate::database::DbPool;
use crate::database::store::{CodeGuard, CodeStore, CodeUpdate, ConditionalUpdate, WinnerRegistry};
use crate::entities::{ClaimResult, ClaimState, code_entity as codes, winner_entity as winners};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

// 每行 10 个绑定参数；SQLite 单条语句上限 32766，Postgres 为 65535
const INSERT_CHUNK_ROWS: usize = 3_000;

/// 基于 SeaORM 的存储实现（生产环境使用 Postgres）
#[derive(Clone)]
pub struct SeaOrmStore {
    pool: DbPool,
}

impl SeaOrmStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_active_model(m: codes::Model) -> codes::ActiveModel {
    codes::ActiveModel {
        code: Set(m.code),
        is_prize: Set(m.is_prize),
        prize_type: Set(m.prize_type),
        claim_state: Set(m.claim_state),
        claimed_at: Set(m.claimed_at),
        claimant_ref: Set(m.claimant_ref),
        audit_ip: Set(m.audit_ip),
        audit_user_agent: Set(m.audit_user_agent),
        result: Set(m.result),
        created_at: Set(m.created_at),
    }
}

#[async_trait]
impl CodeStore for SeaOrmStore {
    async fn find_code(&self, code: &str) -> AppResult<Option<codes::Model>> {
        Ok(codes::Entity::find_by_id(code.to_string())
            .one(&self.pool)
            .await?)
    }

    /// 单条 `UPDATE ... WHERE code = ? AND <guard>`，由数据库行锁保证并发下只有一个请求生效
    async fn update_code_if(
        &self,
        code: &str,
        guard: CodeGuard,
        update: CodeUpdate,
    ) -> AppResult<ConditionalUpdate> {
        let mut stmt = codes::Entity::update_many().filter(codes::Column::Code.eq(code));

        stmt = match guard {
            CodeGuard::Unclaimed => {
                stmt.filter(codes::Column::ClaimState.eq(ClaimState::Unclaimed))
            }
            CodeGuard::PendingFor(claimant) => stmt
                .filter(codes::Column::Result.eq(ClaimResult::Pending))
                .filter(codes::Column::ClaimantRef.eq(claimant)),
        };

        if let Some(state) = update.claim_state {
            stmt = stmt.col_expr(codes::Column::ClaimState, Expr::value(state));
        }
        if let Some(at) = update.claimed_at {
            stmt = stmt.col_expr(codes::Column::ClaimedAt, Expr::value(at));
        }
        if let Some(claimant) = update.claimant_ref {
            stmt = stmt.col_expr(codes::Column::ClaimantRef, Expr::value(claimant));
        }
        if let Some(ip) = update.audit_ip {
            stmt = stmt.col_expr(codes::Column::AuditIp, Expr::value(ip));
        }
        if let Some(ua) = update.audit_user_agent {
            stmt = stmt.col_expr(codes::Column::AuditUserAgent, Expr::value(ua));
        }
        if let Some(result) = update.result {
            stmt = stmt.col_expr(codes::Column::Result, Expr::value(result));
        }

        // 更新与回读放在同一事务中，回读结果即本次写入后的状态
        let txn = self.pool.begin().await?;
        let res = stmt.exec(&txn).await?;
        if res.rows_affected == 0 {
            txn.commit().await?;
            return Ok(ConditionalUpdate::Rejected);
        }

        let stored = codes::Entity::find_by_id(code.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Code {code} vanished after update")))?;
        txn.commit().await?;

        Ok(ConditionalUpdate::Applied(stored))
    }

    async fn insert_codes(&self, batch: Vec<codes::Model>) -> AppResult<u64> {
        let mut inserted = 0;
        let mut rows = batch.into_iter().peekable();
        while rows.peek().is_some() {
            let chunk: Vec<codes::ActiveModel> =
                rows.by_ref().take(INSERT_CHUNK_ROWS).map(to_active_model).collect();
            inserted += codes::Entity::insert_many(chunk)
                .on_conflict(
                    OnConflict::column(codes::Column::Code)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&self.pool)
                .await?;
        }

        Ok(inserted)
    }

    async fn sample_unassigned(&self, count: usize) -> AppResult<Vec<String>> {
        let sampled = codes::Entity::find()
            .select_only()
            .column(codes::Column::Code)
            .filter(codes::Column::IsPrize.eq(false))
            .filter(codes::Column::ClaimState.eq(ClaimState::Unclaimed))
            .order_by(Expr::cust("RANDOM()"), Order::Asc)
            .limit(count as u64)
            .into_tuple::<String>()
            .all(&self.pool)
            .await?;
        Ok(sampled)
    }

    async fn assign_prize(&self, code: &str, label: &str) -> AppResult<bool> {
        let res = codes::Entity::update_many()
            .col_expr(codes::Column::IsPrize, Expr::value(true))
            .col_expr(codes::Column::PrizeType, Expr::value(label.to_string()))
            .filter(codes::Column::Code.eq(code))
            .filter(codes::Column::IsPrize.eq(false))
            .filter(codes::Column::ClaimState.eq(ClaimState::Unclaimed))
            .exec(&self.pool)
            .await?;
        Ok(res.rows_affected == 1)
    }

    async fn count_codes(&self) -> AppResult<u64> {
        Ok(codes::Entity::find().count(&self.pool).await?)
    }

    async fn list_pending(&self, limit: u64) -> AppResult<Vec<codes::Model>> {
        Ok(codes::Entity::find()
            .filter(codes::Column::Result.eq(ClaimResult::Pending))
            .order_by_asc(codes::Column::ClaimedAt)
            .limit(limit)
            .all(&self.pool)
            .await?)
    }
}

#[async_trait]
impl WinnerRegistry for SeaOrmStore {
    async fn insert_winner(&self, winner: winners::Model) -> AppResult<winners::Model> {
        let saved = winners::ActiveModel {
            id: Set(winner.id),
            name: Set(winner.name),
            surname: Set(winner.surname),
            email: Set(winner.email),
            phone: Set(winner.phone),
            address: Set(winner.address),
            winning_code: Set(winner.winning_code),
            prize_awarded: Set(winner.prize_awarded),
            created_at: Set(winner.created_at),
        }
        .insert(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn list_winners(&self) -> AppResult<Vec<winners::Model>> {
        Ok(winners::Entity::find()
            .order_by_desc(winners::Column::CreatedAt)
            .all(&self.pool)
            .await?)
    }

    async fn count_winners(&self) -> AppResult<u64> {
        Ok(winners::Entity::find().count(&self.pool).await?)
    }
}
