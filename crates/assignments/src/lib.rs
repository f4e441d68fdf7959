//! Assignments domain module (service ↔ performer links).
//!
//! Lifecycle: created → active → completed (terminal). Cross-entity checks
//! (both ids resolve, performer availability) belong to the store that owns
//! the catalog; this crate only guards the assignment's own state machine.

pub mod assignment;

pub use assignment::{
    Assignment, AssignmentCommand, AssignmentCompleted, AssignmentCreated, AssignmentEvent,
    AssignmentStatus, CompleteAssignment, CreateAssignment,
};
