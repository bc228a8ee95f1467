//! Delivery worker — the single long-lived task that owns the chat session.
//!
//! Each iteration:
//! 1. Connect if needed; on login failure back off and start over.
//! 2. Take the head of the queue; if empty, idle for the poll interval.
//! 3. Send it; on failure reset the session, drop the message, back off.
//!
//! A message whose send fails is not re-queued. Delivery is therefore
//! at-most-once per message even though the worker itself never gives up.

use std::time::Duration;

use crate::queue::DeliveryQueue;
use crate::session::{ChatBackend, Session, SessionState};

/// Timing and destination settings for a [`DeliveryWorker`].
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Room every message is posted to.
    pub room_id: String,
    /// Fixed wait after a login or send failure.
    pub retry_backoff: Duration,
    /// Maximum idle wait when the queue is empty.
    pub poll_interval: Duration,
}

impl WorkerConfig {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            retry_backoff: Duration::from_secs(5),
            poll_interval: Duration::from_secs(1),
        }
    }

    pub fn with_retry_backoff(mut self, retry_backoff: Duration) -> Self {
        self.retry_backoff = retry_backoff;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Outcome of one worker iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A message was sent to the room.
    Delivered,
    /// The queue was empty; the worker idled for up to the poll interval.
    Idle,
    /// Login failed; the caller should back off.
    AuthFailed,
    /// A send failed and the message was discarded; the caller should back off.
    Dropped,
}

impl Step {
    /// Whether this outcome calls for the retry backoff before the next step.
    pub fn needs_backoff(self) -> bool {
        matches!(self, Step::AuthFailed | Step::Dropped)
    }
}

/// Drains a [`DeliveryQueue`] into a chat room through a [`Session`].
pub struct DeliveryWorker<B> {
    session: Session<B>,
    queue: DeliveryQueue,
    config: WorkerConfig,
}

impl<B: ChatBackend> DeliveryWorker<B> {
    pub fn new(session: Session<B>, queue: DeliveryQueue, config: WorkerConfig) -> Self {
        Self {
            session,
            queue,
            config,
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Run forever. Backend errors are logged and retried, never returned.
    pub async fn run(mut self) {
        tracing::info!(
            room_id = %self.config.room_id,
            retry_backoff_secs = self.config.retry_backoff.as_secs_f64(),
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "Delivery worker started"
        );

        loop {
            if self.step().await.needs_backoff() {
                tokio::time::sleep(self.config.retry_backoff).await;
            }
        }
    }

    /// Execute a single iteration of the delivery loop.
    ///
    /// Idle waiting happens inside the step; the failure backoff is left to
    /// the caller (see [`Step::needs_backoff`]).
    pub async fn step(&mut self) -> Step {
        if !self.session.is_connected() {
            if let Err(e) = self.session.ensure_connected().await {
                self.session.reset();
                tracing::warn!(
                    error = %e,
                    retry_in_secs = self.config.retry_backoff.as_secs_f64(),
                    "Chat login failed"
                );
                return Step::AuthFailed;
            }
        }

        let Some(message) = self.queue.try_dequeue() else {
            tracing::trace!("Delivery queue empty");
            self.queue.wait_for_message(self.config.poll_interval).await;
            return Step::Idle;
        };

        match self.session.send(&self.config.room_id, message.body()).await {
            Ok(()) => {
                tracing::info!(
                    room_id = %self.config.room_id,
                    queued_at = %message.enqueued_at(),
                    "Alert delivered"
                );
                Step::Delivered
            }
            Err(e) => {
                self.session.reset();
                tracing::error!(
                    room_id = %self.config.room_id,
                    error = %e,
                    queued_at = %message.enqueued_at(),
                    remaining = self.queue.len(),
                    "Alert delivery failed, message dropped"
                );
                Step::Dropped
            }
        }
    }
}
