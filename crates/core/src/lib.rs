//! `unitdesk-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error taxonomy shared by every module, string identifiers, the
//! aggregate traits the catalog and assignment modules implement, and the
//! read-side query helpers (search, grouping, date ranges).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod query;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult};
pub use id::{AssignmentId, PerformerId, ServiceId};
pub use query::{Searchable, Timestamped, filter_by_date_range, group_by_key, search};
