use crate::entities::{ClaimResult, code_entity as codes};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// 管理接口的密钥参数
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminKeyQuery {
    /// 管理密钥
    pub key: Option<String>,
}

/// 待对账的兑换码（已占用、中奖记录未完成）
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PendingClaimResponse {
    pub code: String,
    pub prize_type: Option<String>,
    pub claimant_ref: Option<Uuid>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub audit_ip: Option<String>,
    pub result: Option<ClaimResult>,
}

impl From<codes::Model> for PendingClaimResponse {
    fn from(m: codes::Model) -> Self {
        PendingClaimResponse {
            code: m.code,
            prize_type: m.prize_type,
            claimant_ref: m.claimant_ref,
            claimed_at: m.claimed_at,
            audit_ip: m.audit_ip,
            result: m.result,
        }
    }
}
