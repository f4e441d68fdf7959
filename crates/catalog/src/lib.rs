//! Catalog domain module (services and performers).
//!
//! Business rules for the sellable services and the performers who carry
//! them out, implemented purely as deterministic domain logic (no IO, no
//! HTTP, no storage).

pub mod input;
pub mod performer;
mod search;
pub mod service;

pub use input::{parse_non_negative, split_skills};
pub use performer::{
    ChangeAvailability, NewPerformer, Performer, PerformerAvailabilityChanged, PerformerCommand,
    PerformerEvent, PerformerRegistered, PerformerStatus, RegisterPerformer,
};
pub use service::{
    AddService, DeactivateService, DeleteService, NewService, Service, ServiceAdded, ServiceCommand,
    ServiceDeactivated, ServiceDeleted, ServiceEvent, ServiceStatus,
};
