//! Report repository.

use std::sync::Arc;

use crate::entities::{
    report::{self, ReportStatus},
    Report,
};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    SqlErr,
};
use tipline_common::{AppError, AppResult};

/// Report repository for database operations.
#[derive(Clone)]
pub struct ReportRepository {
    db: Arc<DatabaseConnection>,
}

impl ReportRepository {
    /// Create a new report repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Insert a new report.
    ///
    /// A unique-constraint violation on the ticket column maps to
    /// [`AppError::DuplicateTicket`] so the caller can re-mint and retry
    /// instead of silently accepting a collision.
    pub async fn create(&self, model: report::ActiveModel) -> AppResult<report::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::DuplicateTicket
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Find a report by its public ticket.
    ///
    /// Only the authorization gate calls this; every report-scoped operation
    /// goes through the gate rather than querying by ticket directly.
    pub async fn find_by_ticket(&self, ticket: &str) -> AppResult<Option<report::Model>> {
        Report::find()
            .filter(report::Column::Ticket.eq(ticket))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Transition a report's status.
    ///
    /// The update is filtered on the expected current status, so two racing
    /// transitions serialize at the store: the loser matches zero rows and
    /// gets [`AppError::InvalidTransition`].
    pub async fn set_status(
        &self,
        report_id: &str,
        from: ReportStatus,
        to: ReportStatus,
    ) -> AppResult<report::Model> {
        let result = Report::update_many()
            .col_expr(report::Column::Status, Expr::value(to))
            .filter(report::Column::Id.eq(report_id))
            .filter(report::Column::Status.eq(from))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::InvalidTransition(format!(
                "report is no longer {}",
                match from {
                    ReportStatus::Open => "open",
                    ReportStatus::Closed => "closed",
                }
            )));
        }

        Report::find_by_id(report_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or(AppError::ReportNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn test_report(id: &str, ticket: &str, status: ReportStatus) -> report::Model {
        report::Model {
            id: id.to_string(),
            ticket: ticket.to_string(),
            title: "Incident A".to_string(),
            category: Some("safety".to_string()),
            body: "details".to_string(),
            code_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$hash".to_string(),
            status,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create_report() {
        let report = test_report("r1", "ABCDEFGH", ReportStatus::Open);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let active = report::ActiveModel {
            id: Set("r1".to_string()),
            ticket: Set("ABCDEFGH".to_string()),
            title: Set("Incident A".to_string()),
            category: Set(Some("safety".to_string())),
            body: Set("details".to_string()),
            code_hash: Set(report.code_hash.clone()),
            status: Set(ReportStatus::Open),
            created_at: Set(report.created_at),
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.ticket, "ABCDEFGH");
    }

    #[tokio::test]
    async fn test_find_by_ticket_present() {
        let report = test_report("r1", "ABCDEFGH", ReportStatus::Open);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[report]])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.find_by_ticket("ABCDEFGH").await.unwrap();

        assert!(result.is_some());
    }

    #[tokio::test]
    async fn test_find_by_ticket_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<report::Model>::new()])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo.find_by_ticket("NOSUCHTK").await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_set_status_rejects_stale_transition() {
        // Conditional update matches zero rows when the status already moved
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = ReportRepository::new(db);
        let result = repo
            .set_status("r1", ReportStatus::Open, ReportStatus::Closed)
            .await;

        assert!(matches!(result, Err(AppError::InvalidTransition(_))));
    }
}
