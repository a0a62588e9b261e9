//! Business logic services.

#![allow(missing_docs)]

pub mod report;

pub use report::{CreateReportInput, CreatedReport, ReportService, ReportWithThread};
