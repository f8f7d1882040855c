use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 中奖登记实体
/// - id 由领奖流程预先生成并写入 codes.claimant_ref
/// - winning_code / prize_awarded 为领奖时刻的快照，之后不可修改
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "winners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[sea_orm(unique)]
    pub winning_code: String,
    pub prize_awarded: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
