use sea_orm_migration::prelude::*;

use crate::db::ReltsSeries;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ReltsSeries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReltsSeries::Name)
                            .string_len(128)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ReltsSeries::ValueKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReltsSeries::ValueSqlType).string())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReltsSeries::Table).to_owned())
            .await
    }
}
