//! The unit store: catalog, performers and assignments behind one lock.
//!
//! Every mutation follows the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Resolve the target aggregate (clone of the stored row, or `empty`)
//!   ↓
//! 2. Cross-aggregate checks (ids resolve, performer availability)
//!   ↓
//! 3. Handle command + apply events on the clone (pure)
//!   ↓
//! 4. Journal events (global sequence) and publish them on the bus
//!   ↓
//! 5. Write the evolved aggregate back
//! ```
//!
//! Steps 1–5 run under a single `Mutex`, so check-then-act sequences such
//! as "performer is available → assign → mark busy" cannot interleave.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;

use unitdesk_assignments::{
    Assignment, AssignmentCommand, AssignmentStatus, CompleteAssignment, CreateAssignment,
};
use unitdesk_catalog::{
    AddService, ChangeAvailability, DeactivateService, DeleteService, NewPerformer, NewService,
    Performer, PerformerCommand, PerformerStatus, RegisterPerformer, Service, ServiceCommand,
    ServiceStatus,
};
use unitdesk_core::{
    AssignmentId, DomainError, DomainResult, PerformerId, ServiceId, group_by_key, search,
};
use unitdesk_events::{Event, EventBus, EventEnvelope, execute};

use crate::journal::Journal;
use crate::metrics::Metrics;
use crate::table::Table;

const SERVICE_AGGREGATE: &str = "catalog.service";
const PERFORMER_AGGREGATE: &str = "catalog.performer";
const ASSIGNMENT_AGGREGATE: &str = "assignments.assignment";

/// How assignments drive the performer's busy flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityPolicy {
    /// Assigning marks the performer busy; completing their last active
    /// assignment marks them available again.
    #[default]
    AutoFlip,
    /// Availability only changes through explicit status updates.
    Manual,
}

impl core::str::FromStr for AvailabilityPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auto_flip" | "auto" => Ok(AvailabilityPolicy::AutoFlip),
            "manual" => Ok(AvailabilityPolicy::Manual),
            other => Err(DomainError::validation(format!(
                "availability policy must be auto_flip or manual (got {other:?})"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceSort {
    /// Insertion order.
    #[default]
    Insertion,
    /// `created_at` descending, ties in reverse insertion order.
    Recent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilter {
    pub category: Option<String>,
    pub status: Option<ServiceStatus>,
    pub sort: ServiceSort,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PerformerSort {
    /// Insertion order.
    #[default]
    Insertion,
    /// Available before busy, then rating descending; ties keep insertion order.
    StatusThenRating,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerformerFilter {
    pub status: Option<PerformerStatus>,
    /// Case-insensitive match on the primary skill.
    pub skill: Option<String>,
    pub sort: PerformerSort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    pub status: Option<AssignmentStatus>,
    pub service_id: Option<ServiceId>,
    pub performer_id: Option<PerformerId>,
}

/// Assignment joined with the display names of what it references.
///
/// Names are `None` once the referenced row is gone (hard-deleted service).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentView {
    pub assignment: Assignment,
    pub service_name: Option<String>,
    pub performer_name: Option<String>,
}

/// Consistent copy of every table, taken under one lock.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub services: Vec<Service>,
    pub performers: Vec<Performer>,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Default)]
struct UnitState {
    services: Table<ServiceId, Service>,
    performers: Table<PerformerId, Performer>,
    assignments: Table<AssignmentId, Assignment>,
    journal: Journal,
}

impl UnitState {
    fn service(&self, id: &ServiceId) -> DomainResult<&Service> {
        self.services
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("service {id}")))
    }

    fn performer(&self, id: &PerformerId) -> DomainResult<&Performer> {
        self.performers
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("performer {id}")))
    }

    fn has_active_assignment(&self, performer_id: &PerformerId, except: &AssignmentId) -> bool {
        self.assignments
            .values()
            .any(|a| a.is_active() && a.performer_id() == performer_id && a.id_typed() != except)
    }
}

/// Thread-safe in-memory store publishing to `B`.
pub struct UnitStore<B> {
    state: Mutex<UnitState>,
    bus: B,
    policy: AvailabilityPolicy,
}

impl<B> core::fmt::Debug for UnitStore<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnitStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<B> UnitStore<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(bus: B, policy: AvailabilityPolicy) -> Self {
        Self {
            state: Mutex::new(UnitState::default()),
            bus,
            policy,
        }
    }

    pub fn policy(&self) -> AvailabilityPolicy {
        self.policy
    }

    // Rows are only written back after every step succeeded, so a poisoned
    // lock never guards a half-applied mutation.
    fn lock(&self) -> MutexGuard<'_, UnitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Journal and publish already-applied events.
    ///
    /// Publication failures are logged, not returned: the change is committed
    /// and the journal stays the source of truth.
    fn commit<E>(&self, journal: &mut Journal, aggregate_type: &str, aggregate_id: &str, events: &[E])
    where
        E: Event + Serialize,
    {
        for event in events {
            let envelope = journal.record(aggregate_type, aggregate_id, event);
            let sequence = envelope.sequence_number();
            if let Err(e) = self.bus.publish(envelope) {
                tracing::warn!(sequence, error = ?e, "event publication failed");
            }
        }
    }

    // ---- services -------------------------------------------------------

    /// Add a service under a freshly generated id.
    pub fn add_service(&self, input: NewService) -> DomainResult<Service> {
        self.add_service_with_id(ServiceId::generate(), input)
    }

    /// Add a service under a caller-chosen id (seeding, tests).
    pub fn add_service_with_id(&self, id: ServiceId, input: NewService) -> DomainResult<Service> {
        let mut state = self.lock();

        let mut service = state
            .services
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Service::empty(id.clone()));
        let events = execute(
            &mut service,
            &ServiceCommand::AddService(AddService {
                service_id: id.clone(),
                input,
                occurred_at: Utc::now(),
            }),
        )?;

        self.commit(&mut state.journal, SERVICE_AGGREGATE, id.as_str(), &events);
        state.services.upsert(id, service.clone());

        tracing::info!(service_id = %service.id_typed(), category = %service.category(), "service added");
        Ok(service)
    }

    pub fn get_service(&self, id: &ServiceId) -> DomainResult<Service> {
        self.lock().service(id).cloned()
    }

    pub fn list_services(&self, filter: &ServiceFilter) -> Vec<Service> {
        let state = self.lock();

        let mut services: Vec<Service> = state
            .services
            .values()
            .filter(|s| filter.category.as_deref().is_none_or(|c| s.category() == c))
            .filter(|s| filter.status.is_none_or(|st| s.status() == st))
            .cloned()
            .collect();

        if filter.sort == ServiceSort::Recent {
            sort_recent_first(&mut services);
        }
        services
    }

    /// Services grouped by category.
    pub fn services_by_category(&self) -> BTreeMap<String, Vec<Service>> {
        let services = self.list_services(&ServiceFilter::default());
        group_by_key(services, |s| s.category().to_string())
    }

    pub fn search_services(&self, query: &str, fields: &[&str]) -> Vec<Service> {
        search(self.list_services(&ServiceFilter::default()), query, fields)
    }

    /// Hard delete. Refused while the service has active assignments.
    pub fn delete_service(&self, id: &ServiceId) -> DomainResult<Service> {
        let mut state = self.lock();

        let mut service = state.service(id)?.clone();
        if state
            .assignments
            .values()
            .any(|a| a.is_active() && a.service_id() == id)
        {
            tracing::warn!(service_id = %id, "delete refused: active assignments");
            return Err(DomainError::invalid_state(format!(
                "service {id} has active assignments"
            )));
        }

        let events = execute(
            &mut service,
            &ServiceCommand::DeleteService(DeleteService {
                service_id: id.clone(),
                occurred_at: Utc::now(),
            }),
        )?;

        self.commit(&mut state.journal, SERVICE_AGGREGATE, id.as_str(), &events);
        state.services.remove(id);

        tracing::info!(service_id = %id, "service deleted");
        Ok(service)
    }

    /// Soft delete: flip the service to inactive.
    pub fn deactivate_service(&self, id: &ServiceId) -> DomainResult<Service> {
        let mut state = self.lock();

        let mut service = state.service(id)?.clone();
        let events = execute(
            &mut service,
            &ServiceCommand::DeactivateService(DeactivateService {
                service_id: id.clone(),
                occurred_at: Utc::now(),
            }),
        )?;

        self.commit(&mut state.journal, SERVICE_AGGREGATE, id.as_str(), &events);
        state.services.upsert(id.clone(), service.clone());

        tracing::info!(service_id = %id, "service deactivated");
        Ok(service)
    }

    // ---- performers -----------------------------------------------------

    /// Register an available performer under a freshly generated id.
    pub fn add_performer(&self, input: NewPerformer) -> DomainResult<Performer> {
        self.add_performer_with_id(PerformerId::generate(), input, PerformerStatus::Available)
    }

    /// Register a performer under a caller-chosen id and starting status.
    pub fn add_performer_with_id(
        &self,
        id: PerformerId,
        input: NewPerformer,
        initial_status: PerformerStatus,
    ) -> DomainResult<Performer> {
        let mut state = self.lock();

        let mut performer = state
            .performers
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Performer::empty(id.clone()));
        let events = execute(
            &mut performer,
            &PerformerCommand::RegisterPerformer(RegisterPerformer {
                performer_id: id.clone(),
                input,
                initial_status,
                occurred_at: Utc::now(),
            }),
        )?;

        self.commit(&mut state.journal, PERFORMER_AGGREGATE, id.as_str(), &events);
        state.performers.upsert(id, performer.clone());

        tracing::info!(
            performer_id = %performer.id_typed(),
            primary_skill = %performer.primary_skill(),
            "performer registered"
        );
        Ok(performer)
    }

    pub fn get_performer(&self, id: &PerformerId) -> DomainResult<Performer> {
        self.lock().performer(id).cloned()
    }

    pub fn list_performers(&self, filter: &PerformerFilter) -> Vec<Performer> {
        let state = self.lock();

        let skill = filter.skill.as_deref().map(|s| s.trim().to_lowercase());
        let mut performers: Vec<Performer> = state
            .performers
            .values()
            .filter(|p| filter.status.is_none_or(|st| p.status() == st))
            .filter(|p| {
                skill
                    .as_deref()
                    .is_none_or(|s| p.primary_skill().to_lowercase() == s)
            })
            .cloned()
            .collect();

        if filter.sort == PerformerSort::StatusThenRating {
            performers.sort_by(|a, b| {
                a.status()
                    .cmp(&b.status())
                    .then_with(|| b.rating().total_cmp(&a.rating()))
            });
        }
        performers
    }

    /// Performers grouped by primary skill.
    pub fn performers_by_skill(&self) -> BTreeMap<String, Vec<Performer>> {
        let performers = self.list_performers(&PerformerFilter::default());
        group_by_key(performers, |p| p.primary_skill().to_string())
    }

    pub fn search_performers(&self, query: &str, fields: &[&str]) -> Vec<Performer> {
        search(self.list_performers(&PerformerFilter::default()), query, fields)
    }

    /// Manual availability change.
    pub fn set_performer_status(
        &self,
        id: &PerformerId,
        status: PerformerStatus,
    ) -> DomainResult<Performer> {
        let mut state = self.lock();

        let mut performer = state.performer(id)?.clone();
        let events = execute(
            &mut performer,
            &PerformerCommand::ChangeAvailability(ChangeAvailability {
                performer_id: id.clone(),
                status,
                reason: Some("manual".to_string()),
                occurred_at: Utc::now(),
            }),
        )?;

        self.commit(&mut state.journal, PERFORMER_AGGREGATE, id.as_str(), &events);
        state.performers.upsert(id.clone(), performer.clone());

        tracing::info!(performer_id = %id, status = status.as_str(), "performer status changed");
        Ok(performer)
    }

    // ---- assignments ----------------------------------------------------

    /// Link a service to an available performer.
    ///
    /// Under [`AvailabilityPolicy::AutoFlip`] the performer is marked busy in
    /// the same critical section.
    pub fn create_assignment(
        &self,
        service_id: &ServiceId,
        performer_id: &PerformerId,
    ) -> DomainResult<Assignment> {
        let mut state = self.lock();

        state.service(service_id)?;
        let mut performer = state.performer(performer_id)?.clone();
        if !performer.can_take_assignment() {
            tracing::warn!(
                performer_id = %performer_id,
                status = performer.status().as_str(),
                "assignment refused: performer unavailable"
            );
            return Err(DomainError::unavailable(format!(
                "performer {performer_id} is {}",
                performer.status().as_str()
            )));
        }

        let now = Utc::now();
        let id = AssignmentId::generate();
        let mut assignment = Assignment::empty(id.clone());
        let assignment_events = execute(
            &mut assignment,
            &AssignmentCommand::CreateAssignment(CreateAssignment {
                assignment_id: id.clone(),
                service_id: service_id.clone(),
                performer_id: performer_id.clone(),
                occurred_at: now,
            }),
        )?;

        let performer_events = match self.policy {
            AvailabilityPolicy::AutoFlip => execute(
                &mut performer,
                &PerformerCommand::ChangeAvailability(ChangeAvailability {
                    performer_id: performer_id.clone(),
                    status: PerformerStatus::Busy,
                    reason: Some(format!("assignment {id}")),
                    occurred_at: now,
                }),
            )?,
            AvailabilityPolicy::Manual => Vec::new(),
        };

        self.commit(&mut state.journal, ASSIGNMENT_AGGREGATE, id.as_str(), &assignment_events);
        self.commit(&mut state.journal, PERFORMER_AGGREGATE, performer_id.as_str(), &performer_events);
        state.assignments.upsert(id.clone(), assignment.clone());
        state.performers.upsert(performer_id.clone(), performer);

        tracing::info!(
            assignment_id = %id,
            service_id = %service_id,
            performer_id = %performer_id,
            "assignment created"
        );
        Ok(assignment)
    }

    /// Complete an active assignment.
    ///
    /// Under [`AvailabilityPolicy::AutoFlip`] the performer becomes available
    /// again when this was their last active assignment.
    pub fn complete_assignment(&self, id: &AssignmentId) -> DomainResult<Assignment> {
        let mut state = self.lock();

        let mut assignment = state
            .assignments
            .get(id)
            .cloned()
            .unwrap_or_else(|| Assignment::empty(id.clone()));
        let now = Utc::now();
        let assignment_events = execute(
            &mut assignment,
            &AssignmentCommand::CompleteAssignment(CompleteAssignment {
                assignment_id: id.clone(),
                occurred_at: now,
            }),
        )?;

        let performer_id = assignment.performer_id().clone();
        let release = self.policy == AvailabilityPolicy::AutoFlip
            && !state.has_active_assignment(&performer_id, id);

        let mut released = None;
        if release {
            if let Some(current) = state.performers.get(&performer_id) {
                if current.status() == PerformerStatus::Busy {
                    let mut performer = current.clone();
                    let events = execute(
                        &mut performer,
                        &PerformerCommand::ChangeAvailability(ChangeAvailability {
                            performer_id: performer_id.clone(),
                            status: PerformerStatus::Available,
                            reason: Some(format!("assignment {id} completed")),
                            occurred_at: now,
                        }),
                    )?;
                    released = Some((performer, events));
                }
            }
        }

        self.commit(&mut state.journal, ASSIGNMENT_AGGREGATE, id.as_str(), &assignment_events);
        state.assignments.upsert(id.clone(), assignment.clone());
        if let Some((performer, events)) = released {
            self.commit(&mut state.journal, PERFORMER_AGGREGATE, performer_id.as_str(), &events);
            state.performers.upsert(performer_id.clone(), performer);
        }

        tracing::info!(assignment_id = %id, performer_id = %performer_id, "assignment completed");
        Ok(assignment)
    }

    pub fn get_assignment(&self, id: &AssignmentId) -> DomainResult<Assignment> {
        self.lock()
            .assignments
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("assignment {id}")))
    }

    /// Assignments newest first (ties in reverse insertion order), joined
    /// with service and performer names.
    pub fn list_assignments(&self, filter: &AssignmentFilter) -> Vec<AssignmentView> {
        let state = self.lock();

        let mut views: Vec<AssignmentView> = state
            .assignments
            .values()
            .filter(|a| filter.status.is_none_or(|st| a.status() == st))
            .filter(|a| filter.service_id.as_ref().is_none_or(|s| a.service_id() == s))
            .filter(|a| filter.performer_id.as_ref().is_none_or(|p| a.performer_id() == p))
            .map(|a| AssignmentView {
                service_name: state.services.get(a.service_id()).map(|s| s.name().to_string()),
                performer_name: state
                    .performers
                    .get(a.performer_id())
                    .map(|p| p.name().to_string()),
                assignment: a.clone(),
            })
            .collect();

        views.reverse();
        views.sort_by(|a, b| b.assignment.assigned_at().cmp(&a.assignment.assigned_at()));
        views
    }

    // ---- read side ------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            services: state.services.values().cloned().collect(),
            performers: state.performers.values().cloned().collect(),
            assignments: state.assignments.values().cloned().collect(),
        }
    }

    pub fn metrics(&self) -> Metrics {
        let snapshot = self.snapshot();
        Metrics::compute(&snapshot.services, &snapshot.performers, &snapshot.assignments)
    }

    /// Journal entries whose `occurred_at` lies in `[from, to]`.
    pub fn events(&self, from: Option<&str>, to: Option<&str>) -> Vec<EventEnvelope<JsonValue>> {
        self.lock().journal.range(from, to)
    }

    pub fn journal_len(&self) -> usize {
        self.lock().journal.len()
    }
}

/// `created_at` descending; equal timestamps end up in reverse insertion order.
fn sort_recent_first(services: &mut [Service]) {
    services.reverse();
    services.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use unitdesk_catalog::split_skills;
    use unitdesk_events::InMemoryEventBus;

    type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

    fn store(policy: AvailabilityPolicy) -> UnitStore<Bus> {
        UnitStore::new(Arc::new(InMemoryEventBus::new()), policy)
    }

    fn new_service(name: &str, category: &str, price: &str) -> NewService {
        NewService::try_new(
            Some(name.to_string()),
            Some(category.to_string()),
            Some(price.to_string()),
            Some("1 час".to_string()),
            None,
        )
        .unwrap()
    }

    fn new_performer(name: &str, skills: &str, rating: f64) -> NewPerformer {
        NewPerformer::try_new(
            Some(name.to_string()),
            None,
            None,
            split_skills(skills),
            Some(rating),
            None,
            None,
        )
        .unwrap()
    }

    /// Three services, three performers; p3 starts busy.
    fn demo(policy: AvailabilityPolicy) -> UnitStore<Bus> {
        let s = store(policy);
        s.add_service_with_id("s1".into(), new_service("Ремонт компьютеров", "IT", "1500"))
            .unwrap();
        s.add_service_with_id("s2".into(), new_service("Уборка офиса", "Клининг", "3000"))
            .unwrap();
        s.add_service_with_id("s3".into(), new_service("Консультация юриста", "Юридические", "2000"))
            .unwrap();
        s.add_performer_with_id(
            "p1".into(),
            new_performer("Иван Петров", "IT,Ремонт,Настройка", 4.8),
            PerformerStatus::Available,
        )
        .unwrap();
        s.add_performer_with_id(
            "p2".into(),
            new_performer("Мария Сидорова", "Клининг,Уборка", 4.9),
            PerformerStatus::Available,
        )
        .unwrap();
        s.add_performer_with_id(
            "p3".into(),
            new_performer("Алексей Юристов", "Юридические,Консультации", 4.7),
            PerformerStatus::Busy,
        )
        .unwrap();
        s
    }

    #[test]
    fn demo_scenario_end_to_end() {
        let s = demo(AvailabilityPolicy::AutoFlip);

        let err = s.create_assignment(&"s3".into(), &"p3".into()).unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));

        let a = s.create_assignment(&"s1".into(), &"p1".into()).unwrap();
        assert_eq!(a.status(), AssignmentStatus::Active);

        let active = s.list_assignments(&AssignmentFilter {
            status: Some(AssignmentStatus::Active),
            ..AssignmentFilter::default()
        });
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].service_name.as_deref(), Some("Ремонт компьютеров"));
        assert_eq!(active[0].performer_name.as_deref(), Some("Иван Петров"));

        let m = s.metrics();
        assert_eq!(m.active_assignments_count, 1);
        assert_eq!(m.services_count, 3);
        assert_eq!(m.performers_count, 3);
        assert_eq!(m.utilization, 33);
        assert_eq!(m.pending, 2);
    }

    #[test]
    fn search_finds_lawyer_by_cyrillic_fragment() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let hits = s.search_performers("юрист", &["name"]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name(), "Алексей Юристов");
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        assert!(matches!(
            s.create_assignment(&"nope".into(), &"p1".into()),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            s.create_assignment(&"s1".into(), &"nope".into()),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            s.complete_assignment(&"nope".into()),
            Err(DomainError::NotFound(_))
        ));
        assert_eq!(s.list_assignments(&AssignmentFilter::default()).len(), 0);
    }

    #[test]
    fn double_completion_is_invalid_state() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let a = s.create_assignment(&"s1".into(), &"p1".into()).unwrap();

        let done = s.complete_assignment(a.id_typed()).unwrap();
        assert_eq!(done.status(), AssignmentStatus::Completed);
        assert!(done.completed_at().unwrap() >= done.assigned_at());

        let err = s.complete_assignment(a.id_typed()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(s.metrics().completed_count, 1);
    }

    #[test]
    fn auto_flip_blocks_second_assignment_until_completion() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let first = s.create_assignment(&"s1".into(), &"p1".into()).unwrap();
        assert_eq!(s.get_performer(&"p1".into()).unwrap().status(), PerformerStatus::Busy);

        let err = s.create_assignment(&"s2".into(), &"p1".into()).unwrap_err();
        assert!(matches!(err, DomainError::Unavailable(_)));

        s.complete_assignment(first.id_typed()).unwrap();
        assert_eq!(
            s.get_performer(&"p1".into()).unwrap().status(),
            PerformerStatus::Available
        );
        assert!(s.create_assignment(&"s2".into(), &"p1".into()).is_ok());
    }

    #[test]
    fn manual_policy_leaves_status_alone() {
        let s = demo(AvailabilityPolicy::Manual);
        let a = s.create_assignment(&"s1".into(), &"p1".into()).unwrap();
        assert_eq!(
            s.get_performer(&"p1".into()).unwrap().status(),
            PerformerStatus::Available
        );

        let b = s.create_assignment(&"s2".into(), &"p1".into()).unwrap();
        s.set_performer_status(&"p1".into(), PerformerStatus::Busy).unwrap();
        s.complete_assignment(a.id_typed()).unwrap();
        s.complete_assignment(b.id_typed()).unwrap();
        assert_eq!(s.get_performer(&"p1".into()).unwrap().status(), PerformerStatus::Busy);
    }

    #[test]
    fn pending_counts_each_covered_service_once() {
        let s = demo(AvailabilityPolicy::Manual);
        s.create_assignment(&"s1".into(), &"p1".into()).unwrap();
        s.create_assignment(&"s1".into(), &"p2".into()).unwrap();

        let m = s.metrics();
        assert_eq!(m.active_assignments_count, 2);
        assert_eq!(m.pending, 2);
    }

    #[test]
    fn pending_includes_deactivated_services() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        s.deactivate_service(&"s2".into()).unwrap();

        let m = s.metrics();
        assert_eq!(m.services_count, 3);
        assert_eq!(m.active_assignments_count, 0);
        assert_eq!(m.pending, 3);

        s.create_assignment(&"s2".into(), &"p2".into()).unwrap();
        assert_eq!(s.metrics().pending, 2);
    }

    #[test]
    fn generated_ids_are_unique() {
        let s = store(AvailabilityPolicy::AutoFlip);
        let a = s.add_service(new_service("A", "IT", "1")).unwrap();
        let b = s.add_service(new_service("A", "IT", "1")).unwrap();
        assert_ne!(a.id_typed(), b.id_typed());
    }

    #[test]
    fn duplicate_seed_id_is_conflict() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let err = s
            .add_service_with_id("s1".into(), new_service("Again", "IT", "1"))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(s.get_service(&"s1".into()).unwrap().name(), "Ремонт компьютеров");
    }

    #[test]
    fn services_filter_and_sort() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        s.deactivate_service(&"s2".into()).unwrap();

        let it = s.list_services(&ServiceFilter {
            category: Some("IT".to_string()),
            ..ServiceFilter::default()
        });
        assert_eq!(it.len(), 1);

        let active = s.list_services(&ServiceFilter {
            status: Some(ServiceStatus::Active),
            ..ServiceFilter::default()
        });
        assert_eq!(active.len(), 2);

        let recent = s.list_services(&ServiceFilter {
            sort: ServiceSort::Recent,
            ..ServiceFilter::default()
        });
        assert_eq!(recent[0].id_typed().as_str(), "s3");
        assert_eq!(recent[2].id_typed().as_str(), "s1");

        assert!(matches!(
            s.deactivate_service(&"s2".into()),
            Err(DomainError::InvalidState(_))
        ));
    }

    #[test]
    fn performers_sort_available_first_then_rating() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let sorted: Vec<String> = s
            .list_performers(&PerformerFilter {
                sort: PerformerSort::StatusThenRating,
                ..PerformerFilter::default()
            })
            .into_iter()
            .map(|p| p.id_typed().to_string())
            .collect();
        assert_eq!(sorted, vec!["p2", "p1", "p3"]);

        let cleaners = s.list_performers(&PerformerFilter {
            skill: Some("клининг".to_string()),
            ..PerformerFilter::default()
        });
        assert_eq!(cleaners.len(), 1);
    }

    #[test]
    fn equal_status_and_rating_keep_insertion_order() {
        let s = store(AvailabilityPolicy::AutoFlip);
        for (id, name) in [("p1", "Первый"), ("p2", "Второй"), ("p3", "Третий")] {
            s.add_performer_with_id(
                id.into(),
                new_performer(name, "IT", 4.5),
                PerformerStatus::Available,
            )
            .unwrap();
        }
        s.add_performer_with_id(
            "p4".into(),
            new_performer("Лучший", "IT", 5.0),
            PerformerStatus::Available,
        )
        .unwrap();

        let sorted: Vec<String> = s
            .list_performers(&PerformerFilter {
                sort: PerformerSort::StatusThenRating,
                ..PerformerFilter::default()
            })
            .into_iter()
            .map(|p| p.id_typed().to_string())
            .collect();
        assert_eq!(sorted, vec!["p4", "p1", "p2", "p3"]);
    }

    #[test]
    fn recent_sort_breaks_timestamp_ties_by_reverse_insertion() {
        let at = Utc::now();
        let added = |id: &str, offset_secs: i64| {
            let mut service = Service::empty(id.into());
            execute(
                &mut service,
                &ServiceCommand::AddService(AddService {
                    service_id: id.into(),
                    input: new_service(id, "IT", "100"),
                    occurred_at: at + chrono::Duration::seconds(offset_secs),
                }),
            )
            .unwrap();
            service
        };

        let mut services = vec![added("a", 0), added("b", 0), added("c", 5), added("d", 0)];
        sort_recent_first(&mut services);

        let order: Vec<&str> = services.iter().map(|s| s.id_typed().as_str()).collect();
        assert_eq!(order, vec!["c", "d", "b", "a"]);
    }

    #[test]
    fn grouping_by_category_and_primary_skill() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let by_category = s.services_by_category();
        assert_eq!(by_category.len(), 3);
        assert_eq!(by_category["IT"][0].id_typed().as_str(), "s1");

        let by_skill = s.performers_by_skill();
        assert_eq!(by_skill["Юридические"][0].id_typed().as_str(), "p3");
    }

    #[test]
    fn delete_refused_while_assigned() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let a = s.create_assignment(&"s1".into(), &"p1".into()).unwrap();

        assert!(matches!(
            s.delete_service(&"s1".into()),
            Err(DomainError::InvalidState(_))
        ));

        s.complete_assignment(a.id_typed()).unwrap();
        s.delete_service(&"s1".into()).unwrap();
        assert!(matches!(s.get_service(&"s1".into()), Err(DomainError::NotFound(_))));

        let views = s.list_assignments(&AssignmentFilter::default());
        assert_eq!(views[0].service_name, None);
    }

    #[test]
    fn assignments_list_newest_first() {
        let s = demo(AvailabilityPolicy::Manual);
        let first = s.create_assignment(&"s1".into(), &"p1".into()).unwrap();
        let second = s.create_assignment(&"s2".into(), &"p2".into()).unwrap();

        let ids: Vec<AssignmentId> = s
            .list_assignments(&AssignmentFilter::default())
            .into_iter()
            .map(|v| v.assignment.id_typed().clone())
            .collect();
        assert_eq!(ids, vec![second.id_typed().clone(), first.id_typed().clone()]);

        let for_p1 = s.list_assignments(&AssignmentFilter {
            performer_id: Some("p1".into()),
            ..AssignmentFilter::default()
        });
        assert_eq!(for_p1.len(), 1);
    }

    #[test]
    fn every_mutation_is_journaled_and_published() {
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let sub = bus.subscribe();
        let s = UnitStore::new(bus.clone(), AvailabilityPolicy::AutoFlip);

        s.add_service_with_id("s1".into(), new_service("A", "IT", "1")).unwrap();
        s.add_performer_with_id("p1".into(), new_performer("P", "IT", 1.0), PerformerStatus::Available)
            .unwrap();
        s.create_assignment(&"s1".into(), &"p1".into()).unwrap();

        // added, registered, assignment created, performer flipped busy
        assert_eq!(s.journal_len(), 4);

        let received: Vec<_> = std::iter::from_fn(|| sub.try_recv().ok()).collect();
        let sequences: Vec<u64> = received.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
        assert_eq!(received[2].event_type(), "assignments.assignment.created");
        assert_eq!(received[3].event_type(), "catalog.performer.availability_changed");
    }

    #[test]
    fn rejected_commands_leave_no_trace() {
        let s = demo(AvailabilityPolicy::AutoFlip);
        let before = s.journal_len();

        let _ = s.create_assignment(&"s3".into(), &"p3".into());
        let _ = s.set_performer_status(&"p3".into(), PerformerStatus::Busy);

        assert_eq!(s.journal_len(), before);
        assert_eq!(s.events(None, None).len(), before);
    }

    #[test]
    fn concurrent_assignments_to_one_performer_admit_exactly_one() {
        let s = Arc::new(demo(AvailabilityPolicy::AutoFlip));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&s);
                thread::spawn(move || s.create_assignment(&"s2".into(), &"p2".into()).is_ok())
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn policy_parses_from_text() {
        assert_eq!("auto-flip".parse::<AvailabilityPolicy>().unwrap(), AvailabilityPolicy::AutoFlip);
        assert_eq!("MANUAL".parse::<AvailabilityPolicy>().unwrap(), AvailabilityPolicy::Manual);
        assert!("sometimes".parse::<AvailabilityPolicy>().is_err());
    }
}
