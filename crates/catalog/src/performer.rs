use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use unitdesk_core::{Aggregate, AggregateRoot, DomainError, DomainResult, PerformerId};
use unitdesk_events::Event;

use crate::input::{optional_text, parse_non_negative, required_text};

/// Highest rating a performer can hold.
pub const MAX_RATING: f64 = 5.0;

/// Performer availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformerStatus {
    Available,
    Busy,
}

impl PerformerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformerStatus::Available => "available",
            PerformerStatus::Busy => "busy",
        }
    }
}

impl core::str::FromStr for PerformerStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(PerformerStatus::Available),
            "busy" => Ok(PerformerStatus::Busy),
            other => Err(DomainError::validation(format!(
                "performer status must be one of: available, busy (got {other:?})"
            ))),
        }
    }
}

/// Validated input for registering a performer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPerformer {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    skills: Vec<String>,
    rating: f64,
    hourly_rate: u64,
    experience: Option<String>,
}

impl NewPerformer {
    /// Validate raw fields.
    ///
    /// `skills` must hold at least one non-blank entry (entries are trimmed,
    /// blanks dropped, order kept). `rating` defaults to 0 and must lie in
    /// `0..=5`; `hourly_rate` defaults to 0.
    pub fn try_new(
        name: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        skills: Vec<String>,
        rating: Option<f64>,
        hourly_rate: Option<String>,
        experience: Option<String>,
    ) -> DomainResult<Self> {
        let name = required_text("name", name)?;

        let skills: Vec<String> = skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if skills.is_empty() {
            return Err(DomainError::validation("skills are required"));
        }

        let email = optional_text(email);
        if let Some(e) = &email {
            if !e.contains('@') {
                return Err(DomainError::validation(format!("email {e:?} is malformed")));
            }
        }

        let rating = rating.unwrap_or(0.0);
        if !rating.is_finite() || !(0.0..=MAX_RATING).contains(&rating) {
            return Err(DomainError::validation("rating must be between 0 and 5"));
        }

        let hourly_rate = match optional_text(hourly_rate) {
            Some(raw) => parse_non_negative("hourly_rate", &raw)?,
            None => 0,
        };

        Ok(Self {
            name,
            email,
            phone: optional_text(phone),
            skills,
            rating,
            hourly_rate,
            experience: optional_text(experience),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }
}

/// Aggregate root: Performer (a worker who carries out services).
#[derive(Debug, Clone, PartialEq)]
pub struct Performer {
    id: PerformerId,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    skills: Vec<String>,
    rating: f64,
    status: PerformerStatus,
    hourly_rate: u64,
    experience: Option<String>,
    created_at: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl Performer {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: PerformerId) -> Self {
        Self {
            id,
            name: String::new(),
            email: None,
            phone: None,
            skills: Vec::new(),
            rating: 0.0,
            status: PerformerStatus::Available,
            hourly_rate: 0,
            experience: None,
            created_at: DateTime::<Utc>::default(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> &PerformerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn skills(&self) -> &[String] {
        &self.skills
    }

    /// First skill, used as the grouping key.
    pub fn primary_skill(&self) -> &str {
        self.skills.first().map(String::as_str).unwrap_or("")
    }

    /// Skills joined back into their comma-separated form.
    pub fn skills_line(&self) -> String {
        self.skills.join(",")
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn status(&self) -> PerformerStatus {
        self.status
    }

    pub fn hourly_rate(&self) -> u64 {
        self.hourly_rate
    }

    pub fn experience(&self) -> Option<&str> {
        self.experience.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Invariant helper: only available performers take new assignments.
    pub fn can_take_assignment(&self) -> bool {
        self.created && self.status == PerformerStatus::Available
    }
}

impl AggregateRoot for Performer {
    type Id = PerformerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterPerformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterPerformer {
    pub performer_id: PerformerId,
    pub input: NewPerformer,
    /// Seeded records may start out busy.
    pub initial_status: PerformerStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeAvailability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeAvailability {
    pub performer_id: PerformerId,
    pub status: PerformerStatus,
    /// Free-form cause, e.g. the assignment that triggered the flip.
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PerformerCommand {
    RegisterPerformer(RegisterPerformer),
    ChangeAvailability(ChangeAvailability),
}

/// Event: PerformerRegistered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerRegistered {
    pub performer_id: PerformerId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Vec<String>,
    pub rating: f64,
    pub status: PerformerStatus,
    pub hourly_rate: u64,
    pub experience: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PerformerAvailabilityChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformerAvailabilityChanged {
    pub performer_id: PerformerId,
    pub status: PerformerStatus,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PerformerEvent {
    PerformerRegistered(PerformerRegistered),
    PerformerAvailabilityChanged(PerformerAvailabilityChanged),
}

impl Event for PerformerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PerformerEvent::PerformerRegistered(_) => "catalog.performer.registered",
            PerformerEvent::PerformerAvailabilityChanged(_) => "catalog.performer.availability_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PerformerEvent::PerformerRegistered(e) => e.occurred_at,
            PerformerEvent::PerformerAvailabilityChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Performer {
    type Command = PerformerCommand;
    type Event = PerformerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PerformerEvent::PerformerRegistered(e) => {
                self.id = e.performer_id.clone();
                self.name = e.name.clone();
                self.email = e.email.clone();
                self.phone = e.phone.clone();
                self.skills = e.skills.clone();
                self.rating = e.rating;
                self.status = e.status;
                self.hourly_rate = e.hourly_rate;
                self.experience = e.experience.clone();
                self.created_at = e.occurred_at;
                self.created = true;
            }
            PerformerEvent::PerformerAvailabilityChanged(e) => {
                self.status = e.status;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PerformerCommand::RegisterPerformer(cmd) => self.handle_register(cmd),
            PerformerCommand::ChangeAvailability(cmd) => self.handle_change_availability(cmd),
        }
    }
}

impl Performer {
    fn ensure_performer_id(&self, performer_id: &PerformerId) -> Result<(), DomainError> {
        if &self.id != performer_id {
            return Err(DomainError::validation("performer_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterPerformer) -> Result<Vec<PerformerEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict(format!(
                "performer {} already exists",
                cmd.performer_id
            )));
        }
        self.ensure_performer_id(&cmd.performer_id)?;

        let input = &cmd.input;
        if input.skills.is_empty() {
            return Err(DomainError::validation("skills are required"));
        }

        Ok(vec![PerformerEvent::PerformerRegistered(PerformerRegistered {
            performer_id: cmd.performer_id.clone(),
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            skills: input.skills.clone(),
            rating: input.rating,
            status: cmd.initial_status,
            hourly_rate: input.hourly_rate,
            experience: input.experience.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_availability(
        &self,
        cmd: &ChangeAvailability,
    ) -> Result<Vec<PerformerEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("performer {}", cmd.performer_id)));
        }
        self.ensure_performer_id(&cmd.performer_id)?;

        if self.status == cmd.status {
            return Err(DomainError::invalid_state(format!(
                "performer {} is already {}",
                self.id,
                cmd.status.as_str()
            )));
        }

        Ok(vec![PerformerEvent::PerformerAvailabilityChanged(
            PerformerAvailabilityChanged {
                performer_id: cmd.performer_id.clone(),
                status: cmd.status,
                reason: cmd.reason.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}
