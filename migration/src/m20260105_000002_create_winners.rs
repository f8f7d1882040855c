use sea_orm_migration::prelude::*;

/// Winners (中奖登记)
#[derive(DeriveIden)]
enum Winners {
    Table,
    Id,
    Name,
    Surname,
    Email,
    Phone,
    Address,
    WinningCode,
    PrizeAwarded,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Codes {
    Table,
    Code,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // id 由应用预先生成（codes.claimant_ref 先于本表写入），不使用自增
        manager
            .create_table(
                Table::create()
                    .table(Winners::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Winners::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Winners::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Winners::Surname).string_len(255).null())
                    .col(ColumnDef::new(Winners::Email).string_len(255).not_null())
                    .col(ColumnDef::new(Winners::Phone).string_len(64).null())
                    .col(ColumnDef::new(Winners::Address).text().null())
                    .col(
                        ColumnDef::new(Winners::WinningCode)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Winners::PrizeAwarded)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Winners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        // 一个兑换码最多对应一条中奖记录
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_winners_winning_code_unique")
                    .table(Winners::Table)
                    .col(Winners::WinningCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 导出按创建时间倒序
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_winners_created_at")
                    .table(Winners::Table)
                    .col(Winners::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // 不加 ON DELETE CASCADE，中奖记录永不删除
        manager
            .alter_table(
                Table::alter()
                    .table(Winners::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_winners_winning_code")
                            .from_tbl(Winners::Table)
                            .from_col(Winners::WinningCode)
                            .to_tbl(Codes::Table)
                            .to_col(Codes::Code),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Winners::Table).to_owned())
            .await?;
        Ok(())
    }
}
