//! Report service: creation, the authorization gate, and thread operations.

use chrono::Utc;
use sea_orm::Set;
use tipline_common::{AppError, AppResult, CredentialConfig, IdGenerator};
use tipline_db::{
    entities::{
        message::{self, MessageRole},
        report::{self, ReportStatus},
    },
    repositories::{MessageRepository, ReportRepository},
};
use tracing::{info, warn};

use crate::credentials::{CodeHasher, CredentialMinter};

/// How many times a colliding ticket is re-minted before giving up.
const MAX_MINT_ATTEMPTS: u32 = 5;

/// Input for creating a report.
pub struct CreateReportInput {
    pub title: String,
    pub category: Option<String>,
    pub body: String,
}

/// Result of creating a report.
///
/// `access_code` appears here and nowhere else; it is not persisted and no
/// later operation can reproduce it.
pub struct CreatedReport {
    pub ticket: String,
    pub access_code: String,
    pub report: report::Model,
}

/// A report together with its ordered conversation thread.
pub struct ReportWithThread {
    pub report: report::Model,
    pub messages: Vec<message::Model>,
}

/// Report service.
///
/// [`ReportService::authorize`] is the single path to a report for every
/// ticket-scoped operation; nothing else resolves a ticket against the store.
#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    message_repo: MessageRepository,
    minter: CredentialMinter,
    hasher: CodeHasher,
    id_gen: IdGenerator,
}

impl ReportService {
    /// Create a new report service.
    pub fn new(
        report_repo: ReportRepository,
        message_repo: MessageRepository,
        credentials: &CredentialConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            report_repo,
            message_repo,
            minter: CredentialMinter::new(credentials),
            hasher: CodeHasher::new(credentials)?,
            id_gen: IdGenerator::new(),
        })
    }

    /// Create a new report, minting its ticket and access code.
    ///
    /// Returns the raw access code exactly once. A ticket collision at the
    /// store's unique index re-mints and retries up to [`MAX_MINT_ATTEMPTS`]
    /// times, then escalates; a collision is never silently accepted.
    pub async fn create_report(&self, input: CreateReportInput) -> AppResult<CreatedReport> {
        let title = input.title.trim();
        let body = input.body.trim();
        let category = input
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        if title.is_empty() || body.is_empty() {
            return Err(AppError::Validation(
                "title and body must not be empty".to_string(),
            ));
        }
        if title.chars().count() > 200 {
            return Err(AppError::Validation(
                "title must be at most 200 characters".to_string(),
            ));
        }
        if category.is_some_and(|c| c.chars().count() > 64) {
            return Err(AppError::Validation(
                "category must be at most 64 characters".to_string(),
            ));
        }

        let access_code = self.minter.mint_access_code();
        let code_hash = self.hasher.hash(&access_code)?;

        for attempt in 1..=MAX_MINT_ATTEMPTS {
            let ticket = self.minter.mint_ticket();

            let model = report::ActiveModel {
                id: Set(self.id_gen.generate()),
                ticket: Set(ticket.clone()),
                title: Set(title.to_string()),
                category: Set(category.map(ToString::to_string)),
                body: Set(body.to_string()),
                code_hash: Set(code_hash.clone()),
                status: Set(ReportStatus::Open),
                created_at: Set(Utc::now().into()),
            };

            match self.report_repo.create(model).await {
                Ok(report) => {
                    info!(ticket = %ticket, "Report created");
                    return Ok(CreatedReport {
                        ticket,
                        access_code,
                        report,
                    });
                }
                Err(AppError::DuplicateTicket) => {
                    warn!(attempt, "Minted ticket collided, re-minting");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::Internal(format!(
            "Ticket generation collided {MAX_MINT_ATTEMPTS} times"
        )))
    }

    /// Authorization gate.
    ///
    /// Resolves the ticket and verifies the presented access code against
    /// the stored hash. Every report-scoped operation obtains its report
    /// through this method and no other way.
    ///
    /// [`AppError::ReportNotFound`] and [`AppError::InvalidCredential`]
    /// render identically at the boundary, so callers probing tickets learn
    /// nothing either way. An absent code fails before the lookup for the
    /// same reason: a caller presenting no credential gets the same answer
    /// whether or not the ticket exists.
    pub async fn authorize(&self, ticket: &str, presented_code: &str) -> AppResult<report::Model> {
        if !self.minter.ticket_shape_ok(ticket) {
            return Err(AppError::Validation("malformed ticket".to_string()));
        }

        if presented_code.trim().is_empty() {
            return Err(AppError::MissingCredential);
        }

        let Some(report) = self.report_repo.find_by_ticket(ticket).await? else {
            return Err(AppError::ReportNotFound);
        };

        if !self.hasher.verify(presented_code, &report.code_hash) {
            return Err(AppError::InvalidCredential);
        }

        Ok(report)
    }

    /// Fetch a report and its thread.
    pub async fn fetch_report(&self, ticket: &str, code: &str) -> AppResult<ReportWithThread> {
        let report = self.authorize(ticket, code).await?;
        let messages = self.message_repo.list_for_report(&report.id).await?;

        Ok(ReportWithThread { report, messages })
    }

    /// Append a reporter message to the thread.
    pub async fn post_message(
        &self,
        ticket: &str,
        code: &str,
        body: &str,
    ) -> AppResult<message::Model> {
        self.append(ticket, code, MessageRole::Reporter, body).await
    }

    /// Append a moderator message to the thread.
    ///
    /// Design gap carried over from the original system: there is no
    /// separate moderator credential, so the same access code authorizes
    /// both roles and anyone holding it can author either side of the
    /// thread. See DESIGN.md before building on this.
    pub async fn post_moderator_message(
        &self,
        ticket: &str,
        code: &str,
        body: &str,
    ) -> AppResult<message::Model> {
        self.append(ticket, code, MessageRole::Moderator, body)
            .await
    }

    async fn append(
        &self,
        ticket: &str,
        code: &str,
        role: MessageRole,
        body: &str,
    ) -> AppResult<message::Model> {
        let report = self.authorize(ticket, code).await?;

        let body = body.trim();
        if body.is_empty() {
            return Err(AppError::Validation(
                "message body must not be empty".to_string(),
            ));
        }

        self.message_repo.append(&report.id, role, body).await
    }

    /// Transition a report's status.
    ///
    /// Legal transitions are `open -> closed` and `closed -> open`; a
    /// transition to the current status is rejected. The store serializes
    /// racing transitions via a conditional update.
    pub async fn set_status(
        &self,
        ticket: &str,
        code: &str,
        new_status: ReportStatus,
    ) -> AppResult<report::Model> {
        let report = self.authorize(ticket, code).await?;

        if report.status == new_status {
            return Err(AppError::InvalidTransition(format!(
                "report is already {}",
                match new_status {
                    ReportStatus::Open => "open",
                    ReportStatus::Closed => "closed",
                }
            )));
        }

        self.report_repo
            .set_status(&report.id, report.status, new_status)
            .await
    }
}
