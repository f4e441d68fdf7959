//! Infrastructure layer: the in-memory unit store, its event journal,
//! metrics, demo seeding and runtime configuration.

pub mod config;
pub mod journal;
pub mod metrics;
pub mod seed;
pub mod store;
pub mod table;

pub use config::{AppConfig, ConfigError};
pub use journal::Journal;
pub use metrics::Metrics;
pub use seed::seed_demo;
pub use store::{
    AssignmentFilter, AssignmentView, AvailabilityPolicy, PerformerFilter, PerformerSort,
    ServiceFilter, ServiceSort, Snapshot, UnitStore,
};
