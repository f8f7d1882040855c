use crate::database::{
    CodeGuard, CodeStore, CodeUpdate, ConditionalUpdate, RequestContext, WinnerRegistry,
};
use crate::entities::{ClaimResult, winner_entity as winners};
use crate::error::{AppError, AppResult};
use crate::external::Notifier;
use crate::utils::normalize_code;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// 查询兑换码的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Invalid,
    AlreadyClaimed,
    Valid {
        is_prize: bool,
        prize_type: Option<String>,
    },
}

/// 领奖的结果；持久化失败以 `AppError` 返回
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    InvalidOrAlreadyUsed,
    NotAPrizeCode,
    Success { prize_type: String, winner_id: Uuid },
}

/// 中奖者个人信息，只校验必填项存在
#[derive(Debug, Clone, Default)]
pub struct PersonalInfo {
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl PersonalInfo {
    fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("Missing name".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(AppError::ValidationError("Missing email".to_string()));
        }
        Ok(())
    }
}

fn normalized(raw: &str) -> AppResult<String> {
    let code = normalize_code(raw);
    if code.is_empty() {
        return Err(AppError::ValidationError("Missing code".to_string()));
    }
    Ok(code)
}

/// 兑换码核验与领奖
///
/// 不持有任何内存状态：并发控制完全依赖 `CodeStore::update_code_if` 的原子条件更新，
/// 每次领奖最多发起一次占用兑换码的条件写入。
#[derive(Clone)]
pub struct ClaimService {
    codes: Arc<dyn CodeStore>,
    winners: Arc<dyn WinnerRegistry>,
    notifier: Arc<dyn Notifier>,
}

impl ClaimService {
    pub fn new(
        codes: Arc<dyn CodeStore>,
        winners: Arc<dyn WinnerRegistry>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            codes,
            winners,
            notifier,
        }
    }

    /// 查询兑换码
    ///
    /// 副作用：未领取且无奖品的码在第一次查询时即被标记为 claimed/lose，
    /// 之后无法再次查询或转给他人使用。有奖品的码不做任何修改。
    pub async fn check_code(&self, raw: &str, ctx: &RequestContext) -> AppResult<CheckOutcome> {
        let code = normalized(raw)?;

        let Some(found) = self.codes.find_code(&code).await? else {
            return Ok(CheckOutcome::Invalid);
        };

        if found.is_claimed() {
            return Ok(CheckOutcome::AlreadyClaimed);
        }

        if found.is_prize {
            return Ok(CheckOutcome::Valid {
                is_prize: true,
                prize_type: found.prize_type,
            });
        }

        let burn = CodeUpdate::claim(Utc::now(), ClaimResult::Lose, None, ctx);
        match self.codes.update_code_if(&code, CodeGuard::Unclaimed, burn).await? {
            ConditionalUpdate::Applied(_) => Ok(CheckOutcome::Valid {
                is_prize: false,
                prize_type: None,
            }),
            // 并发请求先一步占用了该码
            ConditionalUpdate::Rejected => Ok(CheckOutcome::AlreadyClaimed),
        }
    }

    /// 领奖
    ///
    /// 1. 预先生成中奖记录 ID
    /// 2. 条件更新（claim_state = unclaimed）占用兑换码，result = pending，写入审计字段与 ID
    /// 3. 无奖品 -> 降级为 lose
    /// 4. 写入中奖记录，再把 result 更新为 win
    /// 5. 发送通知（失败只记日志）
    pub async fn claim_prize(
        &self,
        raw: &str,
        info: PersonalInfo,
        ctx: &RequestContext,
    ) -> AppResult<ClaimOutcome> {
        let code = normalized(raw)?;
        info.validate()?;

        let winner_id = Uuid::new_v4();
        let claimed_at = Utc::now();
        let claim = CodeUpdate::claim(claimed_at, ClaimResult::Pending, Some(winner_id), ctx);

        let claimed = match self.codes.update_code_if(&code, CodeGuard::Unclaimed, claim).await? {
            ConditionalUpdate::Applied(model) => model,
            ConditionalUpdate::Rejected => return Ok(ClaimOutcome::InvalidOrAlreadyUsed),
        };

        if !claimed.is_prize {
            log::warn!("Prize claim attempted on non-prize code {code}");
            match self
                .codes
                .update_code_if(
                    &code,
                    CodeGuard::PendingFor(winner_id),
                    CodeUpdate::resolve(ClaimResult::Lose),
                )
                .await
            {
                Ok(ConditionalUpdate::Applied(_)) => {}
                Ok(ConditionalUpdate::Rejected) => log::error!(
                    "Code {code} was not pending for reservation {winner_id} when downgrading to lose; needs reconciliation"
                ),
                Err(e) => log::error!(
                    "Failed to downgrade code {code} to lose (reservation {winner_id}); needs reconciliation: {e}"
                ),
            }
            return Ok(ClaimOutcome::NotAPrizeCode);
        }

        let prize_type = claimed.prize_type.clone().unwrap_or_default();
        let winner = winners::Model {
            id: winner_id,
            name: info.name.trim().to_string(),
            surname: info.surname.filter(|s| !s.trim().is_empty()),
            email: info.email.trim().to_string(),
            phone: info.phone.filter(|s| !s.trim().is_empty()),
            address: info.address.filter(|s| !s.trim().is_empty()),
            winning_code: code.clone(),
            prize_awarded: prize_type.clone(),
            created_at: Utc::now(),
        };

        // 兑换码已被占用：不回滚，保留 pending 供人工对账，避免重复发奖
        let winner = match self.winners.insert_winner(winner).await {
            Ok(saved) => saved,
            Err(e) => {
                log::error!(
                    "Winner record failed after claim: code={code} winner_id={winner_id} claimed_at={}: {e}",
                    claimed_at.to_rfc3339()
                );
                return Err(AppError::ReconciliationRequired {
                    code,
                    winner_id,
                    claimed_at,
                });
            }
        };

        match self
            .codes
            .update_code_if(
                &code,
                CodeGuard::PendingFor(winner_id),
                CodeUpdate::resolve(ClaimResult::Win),
            )
            .await
        {
            Ok(ConditionalUpdate::Applied(_)) => {}
            Ok(ConditionalUpdate::Rejected) => log::error!(
                "Code {code} was not pending for winner {winner_id} when finalizing; needs reconciliation"
            ),
            Err(e) => log::error!(
                "Failed to mark code {code} as won (winner_id={winner_id}); needs reconciliation: {e}"
            ),
        }

        log::info!("New winner registered: code {code} won {prize_type}");

        if let Err(e) = self.notifier.notify_winner(&winner).await {
            log::warn!("Winner notification failed for code {code}: {e}");
        }

        Ok(ClaimOutcome::Success {
            prize_type,
            winner_id,
        })
    }
}
