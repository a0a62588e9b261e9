//! Message repository.

use std::sync::Arc;

use crate::entities::{
    message::{self, MessageRole},
    Message,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tipline_common::{AppError, AppResult, IdGenerator};

/// Message repository for database operations.
#[derive(Clone)]
pub struct MessageRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl MessageRepository {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Append a message to a report's thread.
    ///
    /// The timestamp and the monotonic row ID are captured here, at insert
    /// time, so concurrent appends order by commit rather than by request
    /// arrival.
    pub async fn append(
        &self,
        report_id: &str,
        role: MessageRole,
        body: &str,
    ) -> AppResult<message::Model> {
        let model = message::ActiveModel {
            id: Set(self.id_gen.generate()),
            report_id: Set(report_id.to_string()),
            role: Set(role),
            body: Set(body.to_string()),
            created_at: Set(Utc::now().into()),
        };

        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a report's messages in thread order.
    pub async fn list_for_report(&self, report_id: &str) -> AppResult<Vec<message::Model>> {
        Message::find()
            .filter(message::Column::ReportId.eq(report_id))
            .order_by_asc(message::Column::CreatedAt)
            .order_by_asc(message::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn test_message(id: &str, body: &str) -> message::Model {
        message::Model {
            id: id.to_string(),
            report_id: "r1".to_string(),
            role: MessageRole::Reporter,
            body: body.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_append_message() {
        let message = test_message("m1", "hello");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[message]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.append("r1", MessageRole::Reporter, "hello").await.unwrap();

        assert_eq!(result.report_id, "r1");
        assert_eq!(result.role, MessageRole::Reporter);
    }

    #[tokio::test]
    async fn test_list_for_report_preserves_order() {
        let m1 = test_message("m1", "first");
        let m2 = test_message("m2", "second");
        let m3 = test_message("m3", "third");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[m1, m2, m3]])
                .into_connection(),
        );

        let repo = MessageRepository::new(db);
        let result = repo.list_for_report("r1").await.unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0].body, "first");
        assert_eq!(result[2].body, "third");
    }
}
