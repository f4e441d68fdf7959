use std::borrow::Cow;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use unitdesk_core::Timestamped;

/// Envelope for an event, containing journal metadata.
///
/// This is the unit appended to the journal and published on the bus.
///
/// Notes:
/// - `sequence_number` is global and strictly increasing in commit order.
/// - `payload` is the domain-agnostic event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    sequence_number: u64,

    aggregate_id: String,
    aggregate_type: String,
    event_type: String,

    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        sequence_number: u64,
        aggregate_id: impl Into<String>,
        aggregate_type: impl Into<String>,
        event_type: impl Into<String>,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            sequence_number,
            aggregate_id: aggregate_id.into(),
            aggregate_type: aggregate_type.into(),
            event_type: event_type.into(),
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// `occurred_at` as an RFC 3339 string with millisecond precision (UTC, `Z`).
    ///
    /// Fixed width, so these strings sort lexicographically in time order.
    pub fn occurred_at_iso(&self) -> String {
        self.occurred_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E> Timestamped for EventEnvelope<E> {
    fn timestamp_iso(&self) -> Cow<'_, str> {
        Cow::Owned(self.occurred_at_iso())
    }
}
