//! Application services shared by every handler.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use unitdesk_channels::{ChannelRegistry, MessageHub};
use unitdesk_events::{EventBus, EventEnvelope, InMemoryEventBus};
use unitdesk_infra::{AppConfig, UnitStore, seed_demo};

use crate::app::dto;

pub type SharedBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

/// Realtime message broadcast via SSE.
#[derive(Debug, Clone, Serialize)]
pub struct RealtimeMessage {
    pub topic: String,
    pub payload: JsonValue,
}

pub struct AppServices {
    store: UnitStore<SharedBus>,
    hub: MessageHub,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let bus: SharedBus = Arc::new(InMemoryEventBus::new());
    let store = UnitStore::new(bus.clone(), config.availability_policy);
    let hub = MessageHub::new(ChannelRegistry::with_defaults(&config.disabled_channels));

    // Realtime channel (SSE): lossy broadcast, slow clients miss messages.
    let (realtime_tx, _realtime_rx) = broadcast::channel::<RealtimeMessage>(256);

    // Background subscriber: bus -> SSE. Ends when the bus (owned by the
    // store) is dropped.
    {
        let sub = bus.subscribe();
        let realtime_tx = realtime_tx.clone();
        tokio::task::spawn_blocking(move || {
            while let Ok(env) = sub.recv() {
                let message = RealtimeMessage {
                    topic: env.event_type().to_string(),
                    payload: dto::envelope_to_json(&env),
                };
                // No receivers is fine.
                let _ = realtime_tx.send(message);
            }
            tracing::debug!("event bridge stopped");
        });
    }

    if config.seed_demo {
        seed_demo(&store)?;
    }

    Ok(AppServices {
        store,
        hub,
        realtime_tx,
    })
}

impl AppServices {
    pub fn store(&self) -> &UnitStore<SharedBus> {
        &self.store
    }

    pub fn hub(&self) -> &MessageHub {
        &self.hub
    }

    pub fn realtime_tx(&self) -> &broadcast::Sender<RealtimeMessage> {
        &self.realtime_tx
    }
}

/// SSE stream of committed domain events (used by `/stream`).
pub fn event_sse_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(m) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        // Lagged receiver: skip what was dropped.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
