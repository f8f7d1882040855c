use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 兑换码的领取状态，只允许 Unclaimed -> Claimed
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    #[sea_orm(string_value = "unclaimed")]
    Unclaimed,
    #[sea_orm(string_value = "claimed")]
    Claimed,
}

impl std::fmt::Display for ClaimState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimState::Unclaimed => write!(f, "unclaimed"),
            ClaimState::Claimed => write!(f, "claimed"),
        }
    }
}

/// 领取结果；Pending 表示已占用兑换码、中奖登记尚未完成
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum ClaimResult {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "win")]
    Win,
    #[sea_orm(string_value = "lose")]
    Lose,
}

impl std::fmt::Display for ClaimResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimResult::Pending => write!(f, "pending"),
            ClaimResult::Win => write!(f, "win"),
            ClaimResult::Lose => write!(f, "lose"),
        }
    }
}

/// 兑换码实体
/// - code 主键，大写，创建后不可变
/// - is_prize / prize_type 在发码与派奖阶段写入，活动开始后不再修改
/// - claimant_ref 仅保存中奖记录 ID（弱引用），可能早于中奖记录写入
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "codes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    pub is_prize: bool,
    pub prize_type: Option<String>,
    pub claim_state: ClaimState,
    pub claimed_at: Option<DateTime<Utc>>,
    pub claimant_ref: Option<Uuid>,
    pub audit_ip: Option<String>,
    pub audit_user_agent: Option<String>,
    pub result: Option<ClaimResult>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 新建一个未领取、无奖品的兑换码
    pub fn fresh(code: String) -> Self {
        Self {
            code,
            is_prize: false,
            prize_type: None,
            claim_state: ClaimState::Unclaimed,
            claimed_at: None,
            claimant_ref: None,
            audit_ip: None,
            audit_user_agent: None,
            result: None,
            created_at: Some(Utc::now()),
        }
    }

    pub fn is_claimed(&self) -> bool {
        self.claim_state == ClaimState::Claimed
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
