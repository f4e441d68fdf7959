//! Message hub: distribution, message board, data collection, stats.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use unitdesk_core::{Timestamped, filter_by_date_range};

use crate::channel::ChannelConfig;
use crate::error::ChannelError;
use crate::registry::ChannelRegistry;

/// Default page size for [`MessageHub::list_data`].
pub const DEFAULT_DATA_LIMIT: usize = 100;

const DEFAULT_DATA_TYPE: &str = "auto";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Success,
    Error,
}

/// Result of one channel within a distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelResult {
    pub channel: String,
    pub status: DeliveryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ChannelResult {
    fn is_success(&self) -> bool {
        self.status == DeliveryStatus::Success
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionStatus {
    Delivered,
    Partial,
    Failed,
}

impl DistributionStatus {
    fn from_results(results: &[ChannelResult]) -> Self {
        let ok = results.iter().filter(|r| r.is_success()).count();
        if ok == 0 {
            DistributionStatus::Failed
        } else if ok == results.len() {
            DistributionStatus::Delivered
        } else {
            DistributionStatus::Partial
        }
    }
}

/// History entry for one distributed message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Distribution {
    pub id: String,
    pub message: String,
    pub channels: Vec<String>,
    pub results: Vec<ChannelResult>,
    pub status: DistributionStatus,
    pub timestamp: DateTime<Utc>,
}

/// A message posted to the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub channel: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataMetadata {
    /// Length of the payload's compact JSON encoding, in bytes.
    pub data_size: usize,
    /// Top-level keys when the payload is an object.
    pub fields: Vec<String>,
}

/// An inbound data point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEntry {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: JsonValue,
    pub metadata: DataMetadata,
    pub timestamp: DateTime<Utc>,
}

impl Timestamped for DataEntry {
    fn timestamp_iso(&self) -> Cow<'_, str> {
        Cow::Owned(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

/// Filters for [`MessageHub::list_data`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataQuery {
    pub source: Option<String>,
    pub kind: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataPage {
    pub data: Vec<DataEntry>,
    pub total: usize,
    pub returned: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub enabled: bool,
    /// Distributions where this channel reported success.
    pub sent: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub total_messages: usize,
    pub total_data_points: usize,
    pub channels: BTreeMap<String, ChannelStats>,
    /// Distinct data sources in first-seen order.
    pub sources: Vec<String>,
    pub last_activity: Option<DateTime<Utc>>,
}

struct HubState {
    registry: ChannelRegistry,
    history: Vec<Distribution>,
    messages: Vec<Message>,
    data: Vec<DataEntry>,
    next_message_id: u64,
}

/// Thread-safe channel hub.
pub struct MessageHub {
    state: Mutex<HubState>,
}

impl core::fmt::Debug for MessageHub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MessageHub").finish_non_exhaustive()
    }
}

impl Default for MessageHub {
    fn default() -> Self {
        Self::new(ChannelRegistry::default())
    }
}

impl MessageHub {
    pub fn new(registry: ChannelRegistry) -> Self {
        Self {
            state: Mutex::new(HubState {
                registry,
                history: Vec::new(),
                messages: Vec::new(),
                data: Vec::new(),
                next_message_id: 1,
            }),
        }
    }

    // No hub operation leaves state half-written, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deliver `message` to each channel in order and record the outcome.
    ///
    /// Per-channel failures (unknown, disabled, not configured) become error
    /// results; only an empty message or channel list fails the call.
    pub fn distribute(
        &self,
        message: &str,
        channels: &[String],
        settings: &JsonValue,
    ) -> Result<Distribution, ChannelError> {
        if message.trim().is_empty() {
            return Err(ChannelError::validation("message is required"));
        }
        if channels.is_empty() {
            return Err(ChannelError::validation("at least one channel is required"));
        }

        let mut state = self.lock();

        let results: Vec<ChannelResult> = channels
            .iter()
            .map(|channel| {
                let outcome = state
                    .registry
                    .lookup(channel)
                    .and_then(|handler| handler.deliver(message, settings));

                match outcome {
                    Ok(delivery) => ChannelResult {
                        channel: channel.trim().to_string(),
                        status: DeliveryStatus::Success,
                        detail: Some(delivery.detail),
                        error_code: None,
                        error: None,
                        timestamp: Utc::now(),
                    },
                    Err(e) => {
                        tracing::warn!(channel = %channel, error = %e, "channel delivery failed");
                        ChannelResult {
                            channel: channel.trim().to_string(),
                            status: DeliveryStatus::Error,
                            detail: None,
                            error_code: Some(e.code()),
                            error: Some(e.to_string()),
                            timestamp: Utc::now(),
                        }
                    }
                }
            })
            .collect();

        let distribution = Distribution {
            id: Uuid::now_v7().to_string(),
            message: message.to_string(),
            channels: channels.iter().map(|c| c.trim().to_string()).collect(),
            status: DistributionStatus::from_results(&results),
            results,
            timestamp: Utc::now(),
        };

        tracing::info!(
            distribution_id = %distribution.id,
            channels = distribution.channels.len(),
            status = ?distribution.status,
            "message distributed"
        );

        state.history.push(distribution.clone());
        Ok(distribution)
    }

    pub fn history(&self) -> Vec<Distribution> {
        self.lock().history.clone()
    }

    pub fn list_channels(&self) -> Vec<ChannelConfig> {
        self.lock().registry.configs()
    }

    pub fn get_channel(&self, id: &str) -> Result<ChannelConfig, ChannelError> {
        self.lock().registry.config(id).cloned()
    }

    pub fn update_channel(&self, id: &str, enabled: bool) -> Result<ChannelConfig, ChannelError> {
        let config = self.lock().registry.set_enabled(id, enabled)?;
        tracing::info!(channel = %config.id, enabled, "channel updated");
        Ok(config)
    }

    /// Append a message with the next sequential id.
    pub fn post_message(
        &self,
        text: &str,
        channel: Option<&str>,
    ) -> Result<Message, ChannelError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChannelError::validation("text is required"));
        }

        let mut state = self.lock();

        let channel = match channel.map(str::trim).filter(|c| !c.is_empty()) {
            Some(id) => Some(state.registry.config(id)?.id.as_str().to_string()),
            None => None,
        };

        let message = Message {
            id: state.next_message_id,
            text: text.to_string(),
            channel,
            timestamp: Utc::now(),
        };
        state.next_message_id += 1;
        state.messages.push(message.clone());

        tracing::debug!(message_id = message.id, "message posted");
        Ok(message)
    }

    pub fn list_messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Store an inbound payload with derived metadata.
    pub fn collect(
        &self,
        source: &str,
        data: JsonValue,
        kind: Option<&str>,
    ) -> Result<DataEntry, ChannelError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(ChannelError::validation("source is required"));
        }
        if data.is_null() {
            return Err(ChannelError::validation("data is required"));
        }

        let kind = kind
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .unwrap_or(DEFAULT_DATA_TYPE);

        let entry = DataEntry {
            id: Uuid::now_v7().to_string(),
            source: source.to_string(),
            kind: kind.to_string(),
            metadata: metadata_for(&data),
            data,
            timestamp: Utc::now(),
        };

        tracing::info!(
            data_id = %entry.id,
            source = %entry.source,
            data_size = entry.metadata.data_size,
            "data collected"
        );

        self.lock().data.push(entry.clone());
        Ok(entry)
    }

    /// Filtered data points, newest first.
    ///
    /// `total` counts every match before the limit is applied.
    pub fn list_data(&self, query: &DataQuery) -> DataPage {
        let state = self.lock();
        let matching = state
            .data
            .iter()
            .filter(|e| query.source.as_deref().is_none_or(|s| e.source == s))
            .filter(|e| query.kind.as_deref().is_none_or(|k| e.kind == k));

        let mut matching: Vec<DataEntry> =
            filter_by_date_range(matching, query.from.as_deref(), query.to.as_deref())
                .into_iter()
                .cloned()
                .collect();
        drop(state);

        // Newest first; equal timestamps keep reverse insertion order.
        matching.reverse();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = matching.len();
        matching.truncate(query.limit.unwrap_or(DEFAULT_DATA_LIMIT));

        DataPage {
            returned: matching.len(),
            total,
            data: matching,
        }
    }

    pub fn stats(&self) -> HubStats {
        let state = self.lock();

        let channels = state
            .registry
            .configs()
            .into_iter()
            .map(|config| {
                let id = config.id.as_str();
                let sent = state
                    .history
                    .iter()
                    .filter(|d| d.results.iter().any(|r| r.channel == id && r.is_success()))
                    .count();
                (id.to_string(), ChannelStats { enabled: config.enabled, sent })
            })
            .collect();

        let mut sources: Vec<String> = Vec::new();
        for entry in &state.data {
            if !sources.contains(&entry.source) {
                sources.push(entry.source.clone());
            }
        }

        let last_activity = state
            .history
            .iter()
            .map(|d| d.timestamp)
            .chain(state.data.iter().map(|d| d.timestamp))
            .chain(state.messages.iter().map(|m| m.timestamp))
            .max();

        HubStats {
            total_messages: state.history.len(),
            total_data_points: state.data.len(),
            channels,
            sources,
            last_activity,
        }
    }
}

fn metadata_for(data: &JsonValue) -> DataMetadata {
    let data_size = serde_json::to_string(data).map(|s| s.len()).unwrap_or(0);
    let fields = match data {
        JsonValue::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };
    DataMetadata { data_size, fields }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn distribute_to_enabled_stubs_is_delivered() {
        let hub = MessageHub::default();
        let d = hub
            .distribute("Скидка 10%", &ids(&["telegram", "vk", "email"]), &json!({}))
            .unwrap();

        assert_eq!(d.status, DistributionStatus::Delivered);
        assert_eq!(d.results.len(), 3);
        assert!(d.results.iter().all(|r| r.status == DeliveryStatus::Success));
    }

    #[test]
    fn distribute_mixes_results_per_channel() {
        let hub = MessageHub::default();
        let d = hub
            .distribute("hello", &ids(&["telegram", "fax", "sms"]), &json!({}))
            .unwrap();

        assert_eq!(d.status, DistributionStatus::Partial);
        assert_eq!(d.results[0].status, DeliveryStatus::Success);
        assert_eq!(d.results[1].error_code, Some("unsupported_channel"));
        assert_eq!(d.results[2].error_code, Some("channel_disabled"));
    }

    #[test]
    fn distribute_with_no_successes_is_failed() {
        let hub = MessageHub::default();
        let d = hub.distribute("hello", &ids(&["pigeon"]), &json!({})).unwrap();
        assert_eq!(d.status, DistributionStatus::Failed);
        assert_eq!(d.results[0].status, DeliveryStatus::Error);
    }

    #[test]
    fn distribute_rejects_empty_input() {
        let hub = MessageHub::default();
        assert!(matches!(
            hub.distribute("  ", &ids(&["telegram"]), &json!({})),
            Err(ChannelError::Validation(_))
        ));
        assert!(matches!(
            hub.distribute("hello", &[], &json!({})),
            Err(ChannelError::Validation(_))
        ));
        assert!(hub.history().is_empty());
    }

    #[test]
    fn messages_get_sequential_ids() {
        let hub = MessageHub::default();
        let a = hub.post_message("first", None).unwrap();
        let b = hub.post_message("second", Some("Telegram")).unwrap();

        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(b.channel.as_deref(), Some("telegram"));
        assert_eq!(hub.list_messages().len(), 2);
        assert!(matches!(
            hub.post_message("third", Some("fax")),
            Err(ChannelError::Unsupported(_))
        ));
    }

    #[test]
    fn collect_derives_metadata() {
        let hub = MessageHub::default();
        let entry = hub
            .collect("crm", json!({"lead": "Иван", "score": 7}), None)
            .unwrap();

        assert_eq!(entry.kind, "auto");
        assert_eq!(entry.metadata.fields, vec!["lead".to_string(), "score".to_string()]);
        assert_eq!(
            entry.metadata.data_size,
            serde_json::to_string(&entry.data).unwrap().len()
        );
    }

    #[test]
    fn list_data_filters_and_limits() {
        let hub = MessageHub::default();
        hub.collect("crm", json!({"n": 1}), Some("lead")).unwrap();
        hub.collect("site", json!({"n": 2}), None).unwrap();
        hub.collect("crm", json!({"n": 3}), Some("lead")).unwrap();

        let page = hub.list_data(&DataQuery {
            source: Some("crm".to_string()),
            limit: Some(1),
            ..DataQuery::default()
        });
        assert_eq!(page.total, 2);
        assert_eq!(page.returned, 1);
        assert_eq!(page.data[0].data, json!({"n": 3}));

        let typed = hub.list_data(&DataQuery {
            kind: Some("auto".to_string()),
            ..DataQuery::default()
        });
        assert_eq!(typed.total, 1);

        let future = hub.list_data(&DataQuery {
            from: Some("2999-01-01".to_string()),
            ..DataQuery::default()
        });
        assert_eq!(future.total, 0);
    }

    #[test]
    fn stats_count_successful_sends_per_channel() {
        let hub = MessageHub::default();
        hub.distribute("a", &ids(&["telegram", "sms"]), &json!({})).unwrap();
        hub.distribute("b", &ids(&["telegram"]), &json!({})).unwrap();
        hub.collect("crm", json!({}), None).unwrap();
        hub.collect("crm", json!({}), None).unwrap();

        let stats = hub.stats();
        assert_eq!(stats.total_messages, 2);
        assert_eq!(stats.total_data_points, 2);
        assert_eq!(stats.channels["telegram"].sent, 2);
        assert_eq!(stats.channels["sms"].sent, 0);
        assert!(!stats.channels["sms"].enabled);
        assert_eq!(stats.sources, vec!["crm".to_string()]);
        assert!(stats.last_activity.is_some());
    }

    #[test]
    fn disabling_a_channel_takes_effect_immediately() {
        let hub = MessageHub::default();
        hub.update_channel("telegram", false).unwrap();

        let d = hub.distribute("hi", &ids(&["telegram"]), &json!({})).unwrap();
        assert_eq!(d.status, DistributionStatus::Failed);
        assert!(!hub.get_channel("telegram").unwrap().enabled);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// The overall status agrees with the per-channel results.
            #[test]
            fn status_matches_results(picks in proptest::collection::vec(0usize..6, 1..8)) {
                let pool = ["telegram", "vk", "email", "whatsapp", "sms", "fax"];
                let channels: Vec<String> = picks.iter().map(|i| pool[*i].to_string()).collect();

                let hub = MessageHub::default();
                let d = hub.distribute("msg", &channels, &json!({})).unwrap();

                prop_assert_eq!(d.results.len(), channels.len());
                let ok = d.results.iter().filter(|r| r.status == DeliveryStatus::Success).count();
                let expected = if ok == 0 {
                    DistributionStatus::Failed
                } else if ok == channels.len() {
                    DistributionStatus::Delivered
                } else {
                    DistributionStatus::Partial
                };
                prop_assert_eq!(d.status, expected);
            }
        }
    }
}
