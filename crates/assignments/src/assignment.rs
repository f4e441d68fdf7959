use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use unitdesk_core::{Aggregate, AggregateRoot, AssignmentId, DomainError, PerformerId, ServiceId};
use unitdesk_events::Event;

/// Assignment lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Active,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "active",
            AssignmentStatus::Completed => "completed",
        }
    }
}

impl core::str::FromStr for AssignmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(AssignmentStatus::Active),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(DomainError::validation(format!(
                "assignment status must be one of: active, completed (got {other:?})"
            ))),
        }
    }
}

/// Aggregate root: Assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    id: AssignmentId,
    service_id: ServiceId,
    performer_id: PerformerId,
    status: AssignmentStatus,
    assigned_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Assignment {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: AssignmentId) -> Self {
        Self {
            id,
            service_id: ServiceId::from(""),
            performer_id: PerformerId::from(""),
            status: AssignmentStatus::Active,
            assigned_at: DateTime::<Utc>::default(),
            completed_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> &AssignmentId {
        &self.id
    }

    pub fn service_id(&self) -> &ServiceId {
        &self.service_id
    }

    pub fn performer_id(&self) -> &PerformerId {
        &self.performer_id
    }

    pub fn status(&self) -> AssignmentStatus {
        self.status
    }

    pub fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_active(&self) -> bool {
        self.created && self.status == AssignmentStatus::Active
    }
}

impl AggregateRoot for Assignment {
    type Id = AssignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateAssignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssignment {
    pub assignment_id: AssignmentId,
    pub service_id: ServiceId,
    pub performer_id: PerformerId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteAssignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteAssignment {
    pub assignment_id: AssignmentId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentCommand {
    CreateAssignment(CreateAssignment),
    CompleteAssignment(CompleteAssignment),
}

/// Event: AssignmentCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCreated {
    pub assignment_id: AssignmentId,
    pub service_id: ServiceId,
    pub performer_id: PerformerId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: AssignmentCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentCompleted {
    pub assignment_id: AssignmentId,
    pub service_id: ServiceId,
    pub performer_id: PerformerId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentEvent {
    AssignmentCreated(AssignmentCreated),
    AssignmentCompleted(AssignmentCompleted),
}

impl Event for AssignmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AssignmentEvent::AssignmentCreated(_) => "assignments.assignment.created",
            AssignmentEvent::AssignmentCompleted(_) => "assignments.assignment.completed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AssignmentEvent::AssignmentCreated(e) => e.occurred_at,
            AssignmentEvent::AssignmentCompleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Assignment {
    type Command = AssignmentCommand;
    type Event = AssignmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AssignmentEvent::AssignmentCreated(e) => {
                self.id = e.assignment_id.clone();
                self.service_id = e.service_id.clone();
                self.performer_id = e.performer_id.clone();
                self.status = AssignmentStatus::Active;
                self.assigned_at = e.occurred_at;
                self.completed_at = None;
                self.created = true;
            }
            AssignmentEvent::AssignmentCompleted(e) => {
                self.status = AssignmentStatus::Completed;
                self.completed_at = Some(e.occurred_at);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AssignmentCommand::CreateAssignment(cmd) => self.handle_create(cmd),
            AssignmentCommand::CompleteAssignment(cmd) => self.handle_complete(cmd),
        }
    }
}

impl Assignment {
    fn ensure_assignment_id(&self, assignment_id: &AssignmentId) -> Result<(), DomainError> {
        if &self.id != assignment_id {
            return Err(DomainError::validation("assignment_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateAssignment) -> Result<Vec<AssignmentEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict(format!(
                "assignment {} already exists",
                cmd.assignment_id
            )));
        }
        self.ensure_assignment_id(&cmd.assignment_id)?;

        if cmd.service_id.as_str().trim().is_empty() {
            return Err(DomainError::validation("service_id is required"));
        }
        if cmd.performer_id.as_str().trim().is_empty() {
            return Err(DomainError::validation("performer_id is required"));
        }

        Ok(vec![AssignmentEvent::AssignmentCreated(AssignmentCreated {
            assignment_id: cmd.assignment_id.clone(),
            service_id: cmd.service_id.clone(),
            performer_id: cmd.performer_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(
        &self,
        cmd: &CompleteAssignment,
    ) -> Result<Vec<AssignmentEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("assignment {}", cmd.assignment_id)));
        }
        self.ensure_assignment_id(&cmd.assignment_id)?;

        if self.status == AssignmentStatus::Completed {
            return Err(DomainError::invalid_state(format!(
                "assignment {} is already completed",
                self.id
            )));
        }

        Ok(vec![AssignmentEvent::AssignmentCompleted(AssignmentCompleted {
            assignment_id: cmd.assignment_id.clone(),
            service_id: self.service_id.clone(),
            performer_id: self.performer_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_cmd(id: &str) -> AssignmentCommand {
        AssignmentCommand::CreateAssignment(CreateAssignment {
            assignment_id: AssignmentId::from(id),
            service_id: ServiceId::from("s1"),
            performer_id: PerformerId::from("p1"),
            occurred_at: Utc::now(),
        })
    }

    fn complete_cmd(id: &str) -> AssignmentCommand {
        AssignmentCommand::CompleteAssignment(CompleteAssignment {
            assignment_id: AssignmentId::from(id),
            occurred_at: Utc::now(),
        })
    }

    fn run(assignment: &mut Assignment, cmd: &AssignmentCommand) -> Result<(), DomainError> {
        let events = assignment.handle(cmd)?;
        for e in &events {
            assignment.apply(e);
        }
        Ok(())
    }

    #[test]
    fn create_starts_active() {
        let mut a = Assignment::empty(AssignmentId::from("a1"));
        run(&mut a, &create_cmd("a1")).unwrap();

        assert!(a.is_active());
        assert_eq!(a.service_id().as_str(), "s1");
        assert_eq!(a.performer_id().as_str(), "p1");
        assert_eq!(a.completed_at(), None);
    }

    #[test]
    fn complete_succeeds_once_then_rejects() {
        let mut a = Assignment::empty(AssignmentId::from("a1"));
        run(&mut a, &create_cmd("a1")).unwrap();

        run(&mut a, &complete_cmd("a1")).unwrap();
        assert_eq!(a.status(), AssignmentStatus::Completed);
        assert!(a.completed_at().is_some());
        assert!(a.completed_at().unwrap() >= a.assigned_at());

        let err = run(&mut a, &complete_cmd("a1")).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(a.version(), 2);
    }

    #[test]
    fn complete_unknown_is_not_found() {
        let a = Assignment::empty(AssignmentId::from("a9"));
        let err = a.handle(&complete_cmd("a9")).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn completed_event_carries_both_references() {
        let mut a = Assignment::empty(AssignmentId::from("a1"));
        run(&mut a, &create_cmd("a1")).unwrap();
        let events = a.handle(&complete_cmd("a1")).unwrap();
        match &events[0] {
            AssignmentEvent::AssignmentCompleted(e) => {
                assert_eq!(e.service_id.as_str(), "s1");
                assert_eq!(e.performer_id.as_str(), "p1");
            }
            _ => panic!("Expected AssignmentCompleted event"),
        }
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// However many times completion is retried, exactly one attempt succeeds.
            #[test]
            fn completion_succeeds_exactly_once(attempts in 1usize..10) {
                let mut a = Assignment::empty(AssignmentId::from("a1"));
                run(&mut a, &create_cmd("a1")).unwrap();

                let ok = (0..attempts)
                    .filter(|_| run(&mut a, &complete_cmd("a1")).is_ok())
                    .count();
                prop_assert_eq!(ok, 1);
                prop_assert_eq!(a.status(), AssignmentStatus::Completed);
            }
        }
    }
}
