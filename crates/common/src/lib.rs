//! Common utilities and shared types for tipline.
//!
//! This crate provides foundational components used across all tipline crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based row identifiers via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use tipline_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;

pub use config::{CodePolicy, Config, CredentialConfig, RateLimitConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
