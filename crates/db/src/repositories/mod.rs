//! Repository layer.

mod message;
mod report;

pub use message::MessageRepository;
pub use report::ReportRepository;
