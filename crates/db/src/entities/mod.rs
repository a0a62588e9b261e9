//! Database entities.

pub mod message;
pub mod report;

pub use message::Entity as Message;
pub use report::Entity as Report;
