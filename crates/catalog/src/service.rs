use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use unitdesk_core::{Aggregate, AggregateRoot, DomainError, DomainResult, ServiceId};
use unitdesk_events::Event;

use crate::input::{optional_text, parse_non_negative, required_text};

/// Service status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Active,
    Inactive,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Active => "active",
            ServiceStatus::Inactive => "inactive",
        }
    }
}

impl core::str::FromStr for ServiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(ServiceStatus::Active),
            "inactive" => Ok(ServiceStatus::Inactive),
            other => Err(DomainError::validation(format!(
                "service status must be one of: active, inactive (got {other:?})"
            ))),
        }
    }
}

/// Validated input for adding a service.
///
/// Only constructible through [`NewService::try_new`], so holding one means
/// every required field is present and well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewService {
    name: String,
    category: String,
    price: u64,
    duration: String,
    description: Option<String>,
}

impl NewService {
    /// Validate raw fields. `price` is the textual form of the amount in
    /// minor currency units.
    pub fn try_new(
        name: Option<String>,
        category: Option<String>,
        price: Option<String>,
        duration: Option<String>,
        description: Option<String>,
    ) -> DomainResult<Self> {
        let name = required_text("name", name)?;
        let category = required_text("category", category)?;
        let price = match price {
            Some(raw) => parse_non_negative("price", &raw)?,
            None => return Err(DomainError::validation("price is required")),
        };
        let duration = required_text("duration", duration)?;

        Ok(Self {
            name,
            category,
            price,
            duration,
            description: optional_text(description),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Aggregate root: Service (a sellable unit of work).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    id: ServiceId,
    name: String,
    category: String,
    price: u64,
    duration: String,
    description: Option<String>,
    status: ServiceStatus,
    created_at: DateTime<Utc>,
    version: u64,
    created: bool,
    deleted: bool,
}

impl Service {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ServiceId) -> Self {
        Self {
            id,
            name: String::new(),
            category: String::new(),
            price: 0,
            duration: String::new(),
            description: None,
            status: ServiceStatus::Active,
            created_at: DateTime::<Utc>::default(),
            version: 0,
            created: false,
            deleted: false,
        }
    }

    pub fn id_typed(&self) -> &ServiceId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn duration(&self) -> &str {
        &self.duration
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_active(&self) -> bool {
        self.status == ServiceStatus::Active
    }
}

impl AggregateRoot for Service {
    type Id = ServiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddService.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddService {
    pub service_id: ServiceId,
    pub input: NewService,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateService (soft delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateService {
    pub service_id: ServiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeleteService (hard delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteService {
    pub service_id: ServiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceCommand {
    AddService(AddService),
    DeactivateService(DeactivateService),
    DeleteService(DeleteService),
}

/// Event: ServiceAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAdded {
    pub service_id: ServiceId,
    pub name: String,
    pub category: String,
    pub price: u64,
    pub duration: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ServiceDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDeactivated {
    pub service_id: ServiceId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ServiceDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDeleted {
    pub service_id: ServiceId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceEvent {
    ServiceAdded(ServiceAdded),
    ServiceDeactivated(ServiceDeactivated),
    ServiceDeleted(ServiceDeleted),
}

impl Event for ServiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ServiceEvent::ServiceAdded(_) => "catalog.service.added",
            ServiceEvent::ServiceDeactivated(_) => "catalog.service.deactivated",
            ServiceEvent::ServiceDeleted(_) => "catalog.service.deleted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ServiceEvent::ServiceAdded(e) => e.occurred_at,
            ServiceEvent::ServiceDeactivated(e) => e.occurred_at,
            ServiceEvent::ServiceDeleted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Service {
    type Command = ServiceCommand;
    type Event = ServiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ServiceEvent::ServiceAdded(e) => {
                self.id = e.service_id.clone();
                self.name = e.name.clone();
                self.category = e.category.clone();
                self.price = e.price;
                self.duration = e.duration.clone();
                self.description = e.description.clone();
                self.status = ServiceStatus::Active;
                self.created_at = e.occurred_at;
                self.created = true;
            }
            ServiceEvent::ServiceDeactivated(_) => {
                self.status = ServiceStatus::Inactive;
            }
            ServiceEvent::ServiceDeleted(_) => {
                self.deleted = true;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ServiceCommand::AddService(cmd) => self.handle_add(cmd),
            ServiceCommand::DeactivateService(cmd) => self.handle_deactivate(cmd),
            ServiceCommand::DeleteService(cmd) => self.handle_delete(cmd),
        }
    }
}

impl Service {
    fn ensure_service_id(&self, service_id: &ServiceId) -> Result<(), DomainError> {
        if &self.id != service_id {
            return Err(DomainError::validation("service_id mismatch"));
        }
        Ok(())
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if !self.created || self.deleted {
            return Err(DomainError::not_found(format!("service {}", self.id)));
        }
        Ok(())
    }

    fn handle_add(&self, cmd: &AddService) -> Result<Vec<ServiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict(format!("service {} already exists", cmd.service_id)));
        }
        self.ensure_service_id(&cmd.service_id)?;

        let input = &cmd.input;
        if input.name().trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![ServiceEvent::ServiceAdded(ServiceAdded {
            service_id: cmd.service_id.clone(),
            name: input.name().to_string(),
            category: input.category().to_string(),
            price: input.price(),
            duration: input.duration().to_string(),
            description: input.description().map(str::to_string),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(&self, cmd: &DeactivateService) -> Result<Vec<ServiceEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_service_id(&cmd.service_id)?;

        if self.status == ServiceStatus::Inactive {
            return Err(DomainError::invalid_state(format!(
                "service {} is already inactive",
                self.id
            )));
        }

        Ok(vec![ServiceEvent::ServiceDeactivated(ServiceDeactivated {
            service_id: cmd.service_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_delete(&self, cmd: &DeleteService) -> Result<Vec<ServiceEvent>, DomainError> {
        self.ensure_live()?;
        self.ensure_service_id(&cmd.service_id)?;

        Ok(vec![ServiceEvent::ServiceDeleted(ServiceDeleted {
            service_id: cmd.service_id.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
