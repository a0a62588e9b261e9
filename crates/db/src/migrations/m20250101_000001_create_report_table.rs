//! Create report table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Report::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Report::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Report::Ticket).string_len(16).not_null())
                    .col(ColumnDef::new(Report::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Report::Category).string_len(64))
                    .col(ColumnDef::new(Report::Body).text().not_null())
                    .col(ColumnDef::new(Report::CodeHash).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Report::Status)
                            .string_len(24)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(Report::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: ticket is the public lookup key; a generation
        // collision must fail the insert so the caller re-mints.
        manager
            .create_index(
                Index::create()
                    .name("idx_report_ticket")
                    .table(Report::Table)
                    .col(Report::Ticket)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Report::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
    Ticket,
    Title,
    Category,
    Body,
    CodeHash,
    Status,
    CreatedAt,
}
