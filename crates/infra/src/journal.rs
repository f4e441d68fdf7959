//! Append-only journal of committed domain events.

use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use unitdesk_core::filter_by_date_range;
use unitdesk_events::{Event, EventEnvelope};

/// Committed events in commit order, each with a global sequence number
/// starting at 1.
#[derive(Debug, Default)]
pub struct Journal {
    entries: Vec<EventEnvelope<JsonValue>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `event` in an envelope with the next sequence number and append it.
    pub fn record<E>(
        &mut self,
        aggregate_type: &str,
        aggregate_id: &str,
        event: &E,
    ) -> EventEnvelope<JsonValue>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event).unwrap_or_else(|e| {
            tracing::error!(
                event_type = event.event_type(),
                error = %e,
                "event payload not serializable; journaling null payload"
            );
            JsonValue::Null
        });

        let envelope = EventEnvelope::new(
            Uuid::now_v7(),
            self.entries.len() as u64 + 1,
            aggregate_id,
            aggregate_type,
            event.event_type(),
            event.occurred_at(),
            payload,
        );
        self.entries.push(envelope.clone());
        envelope
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose `occurred_at` lies in `[from, to]` (ISO-8601 strings).
    pub fn range(&self, from: Option<&str>, to: Option<&str>) -> Vec<EventEnvelope<JsonValue>> {
        filter_by_date_range(self.entries.iter(), from, to)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    #[derive(Debug, Clone, Serialize)]
    struct Pinged {
        at: DateTime<Utc>,
    }

    impl Event for Pinged {
        fn event_type(&self) -> &'static str {
            "test.pinged"
        }

        fn version(&self) -> u32 {
            1
        }

        fn occurred_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    fn at(day: u32) -> Pinged {
        Pinged {
            at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn sequence_numbers_are_global_and_gapless() {
        let mut journal = Journal::new();
        let a = journal.record("test", "x", &at(1));
        let b = journal.record("test", "y", &at(2));

        assert_eq!(a.sequence_number(), 1);
        assert_eq!(b.sequence_number(), 2);
        assert_eq!(b.aggregate_id(), "y");
        assert_eq!(b.event_type(), "test.pinged");
    }

    #[test]
    fn range_filters_on_occurred_at() {
        let mut journal = Journal::new();
        for day in 1..=5 {
            journal.record("test", "x", &at(day));
        }

        let hits = journal.range(Some("2024-03-02"), Some("2024-03-04T23:59:59.999Z"));
        let days: Vec<u64> = hits.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(days, vec![2, 3, 4]);
        assert_eq!(journal.range(None, None).len(), 5);
    }
}
