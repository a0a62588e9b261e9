//! Report entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ReportStatus {
    #[sea_orm(string_value = "open")]
    #[default]
    Open,
    #[sea_orm(string_value = "closed")]
    Closed,
}

/// Report model.
///
/// `code_hash` is the only credential material ever persisted; the raw access
/// code is returned once at creation and is not recoverable from this row.
/// The field is skipped during serialization so no read path can leak it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Public lookup key. Unique, immutable, grants no access by itself.
    #[sea_orm(unique, indexed)]
    pub ticket: String,
    /// Short human-entered summary.
    pub title: String,
    /// Optional free-form category label.
    pub category: Option<String>,
    /// Full report text.
    #[sea_orm(column_type = "Text")]
    pub body: String,
    /// Argon2id PHC hash of the access code. Set once at creation.
    #[serde(skip_serializing)]
    pub code_hash: String,
    /// Current status of the report.
    pub status: ReportStatus,
    /// When the report was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::message::Entity")]
    Message,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_code_hash_is_never_serialized() {
        let model = Model {
            id: "r1".to_string(),
            ticket: "ABCDEFGH".to_string(),
            title: "Incident A".to_string(),
            category: None,
            body: "details".to_string(),
            code_hash: "$argon2id$v=19$secret".to_string(),
            status: ReportStatus::Open,
            created_at: Utc::now().into(),
        };

        let value = serde_json::to_value(&model).unwrap();

        assert!(value.get("code_hash").is_none());
        assert!(!value.to_string().contains("argon2id"));
        assert_eq!(value["ticket"], "ABCDEFGH");
    }
}
