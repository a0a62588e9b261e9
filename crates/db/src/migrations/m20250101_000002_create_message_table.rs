//! Create message table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::ReportId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::Role).string_len(16).not_null())
                    .col(ColumnDef::new(Message::Body).text().not_null())
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_report")
                            .from(Message::Table, Message::ReportId)
                            .to(Report::Table, Report::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: report_id (for listing a report's thread)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_report_id")
                    .table(Message::Table)
                    .col(Message::ReportId)
                    .to_owned(),
            )
            .await?;

        // Index: (report_id, created_at, id) - thread ordering
        manager
            .create_index(
                Index::create()
                    .name("idx_message_report_order")
                    .table(Message::Table)
                    .col(Message::ReportId)
                    .col(Message::CreatedAt)
                    .col(Message::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    ReportId,
    Role,
    Body,
    CreatedAt,
}

#[derive(Iden)]
enum Report {
    Table,
    Id,
}
