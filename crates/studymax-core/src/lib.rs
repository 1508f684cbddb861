//! Core domain models for studymax
//!
//! This crate contains:
//! - Record shapes (Class, Task, Document, User) and the `Record` trait
//! - Attachment metadata carried on records
//! - Mapping to the hosted backend's row shapes
//! - In-memory agenda helpers (filters, ordering, per-day views)

pub mod agenda;
pub mod attachment;
pub mod calendar;
pub mod class;
pub mod document;
pub mod error;
pub mod record;
pub mod row;
pub mod task;
pub mod user;

pub use agenda::TaskFilter;
pub use attachment::{FileAttachment, FileContent};
pub use calendar::Day;
pub use class::ClassRecord;
pub use document::DocumentRecord;
pub use error::{CoreError, Result};
pub use record::{Record, RecordId, collections};
pub use row::{ClassRow, DocumentRow, TaskRow};
pub use task::{TaskRecord, Workload};
pub use user::UserRecord;
