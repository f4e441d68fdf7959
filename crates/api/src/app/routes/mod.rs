use axum::{Router, routing::get};

pub mod assignments;
pub mod channels;
pub mod events;
pub mod metrics;
pub mod performers;
pub mod search;
pub mod services;
pub mod system;

/// Router for every endpoint except `/health`.
pub fn router() -> Router {
    Router::new()
        .route("/stream", get(system::stream))
        .route("/metrics", get(metrics::get_metrics))
        .route("/search", get(search::search))
        .route("/events", get(events::list_events))
        .nest("/services", services::router())
        .nest("/performers", performers::router())
        .nest("/assignments", assignments::router())
        .merge(channels::router())
}
