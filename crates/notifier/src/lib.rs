//! Asynchronous delivery pipeline for relayed alerts.
//!
//! - [`queue::DeliveryQueue`] buffers formatted alerts between the webhook
//!   handler and the delivery worker.
//! - [`session::Session`] tracks the authenticated connection to the chat
//!   backend.
//! - [`worker::DeliveryWorker`] drains the queue, reconnecting and backing off
//!   on failure.
//! - [`matrix::MatrixClient`] is the production chat backend.

pub mod error;
pub mod matrix;
pub mod queue;
pub mod session;
pub mod worker;
