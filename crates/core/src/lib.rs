//! Core business logic for tipline.
//!
//! The credential model lives here: ticket/access-code minting
//! ([`CredentialMinter`]), one-way code hashing ([`CodeHasher`]), and the
//! authorization gate every report-scoped operation goes through
//! ([`ReportService::authorize`]).

pub mod credentials;
pub mod services;

pub use credentials::{CodeHasher, CredentialMinter, TICKET_ALPHABET};
pub use services::*;
