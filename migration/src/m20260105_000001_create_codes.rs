use sea_orm_migration::prelude::*;

/// Codes (兑换码全集)
#[derive(DeriveIden)]
enum Codes {
    Table,
    Code,
    IsPrize,
    PrizeType,
    ClaimState,
    ClaimedAt,
    ClaimantRef,
    AuditIp,
    AuditUserAgent,
    Result,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// claim_state: 'unclaimed' | 'claimed'
/// result: NULL | 'pending' | 'win' | 'lose'
///
/// 状态值以文本列保存（不使用 Postgres ENUM 类型），便于后续增加取值。
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Codes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Codes::Code)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Codes::IsPrize)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Codes::PrizeType).string_len(255).null())
                    .col(
                        ColumnDef::new(Codes::ClaimState)
                            .string_len(16)
                            .not_null()
                            .default("unclaimed"),
                    )
                    .col(
                        ColumnDef::new(Codes::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Codes::ClaimantRef).uuid().null())
                    .col(ColumnDef::new(Codes::AuditIp).string_len(64).null())
                    .col(ColumnDef::new(Codes::AuditUserAgent).text().null())
                    .col(ColumnDef::new(Codes::Result).string_len(16).null())
                    .col(
                        ColumnDef::new(Codes::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 抽奖分配时按 (is_prize, claim_state) 过滤
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_codes_prize_state")
                    .table(Codes::Table)
                    .col(Codes::IsPrize)
                    .col(Codes::ClaimState)
                    .to_owned(),
            )
            .await?;

        // 对账时查询 result = 'pending'
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_codes_result")
                    .table(Codes::Table)
                    .col(Codes::Result)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Codes::Table).to_owned())
            .await?;
        Ok(())
    }
}
