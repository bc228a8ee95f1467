//! Shared application state for the Axum webhook server.

use relay_notifier::queue::DeliveryQueue;

/// Application state shared across all route handlers via Axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub queue: DeliveryQueue,
}

impl AppState {
    pub fn new(queue: DeliveryQueue) -> Self {
        Self { queue }
    }
}
