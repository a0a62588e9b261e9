//! Message entity for the report conversation thread.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Author role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    #[sea_orm(string_value = "reporter")]
    Reporter,
    #[sea_orm(string_value = "moderator")]
    Moderator,
}

/// Message model.
///
/// Messages are append-only: no update or delete path exists above the
/// schema level. Ordering is `(created_at, id)` ascending, with the
/// monotonic ULID id breaking same-millisecond ties in commit order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Parent report row ID.
    #[sea_orm(indexed)]
    pub report_id: String,

    /// Who authored the entry.
    pub role: MessageRole,

    /// Message text content.
    #[sea_orm(column_type = "Text")]
    pub body: String,

    /// Captured at insert time, inside the insert transaction.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::report::Entity",
        from = "Column::ReportId",
        to = "super::report::Column::Id"
    )]
    Report,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
