//! Delivery queue — unbounded FIFO shared between webhook handlers and the
//! delivery worker.
//!
//! Producers call [`DeliveryQueue::enqueue`] from any task; it never blocks
//! and never fails. The single consumer polls with
//! [`DeliveryQueue::try_dequeue`] and idles with
//! [`DeliveryQueue::wait_for_message`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;

/// A formatted alert waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMessage {
    body: String,
    enqueued_at: DateTime<Utc>,
}

impl PendingMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            enqueued_at: Utc::now(),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn enqueued_at(&self) -> DateTime<Utc> {
        self.enqueued_at
    }
}

/// Cloneable handle to a process-wide delivery queue.
#[derive(Debug, Clone, Default)]
pub struct DeliveryQueue {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    messages: Mutex<VecDeque<PendingMessage>>,
    notify: Notify,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the tail and wake the worker if it is idle.
    pub fn enqueue(&self, body: impl Into<String>) {
        let message = PendingMessage::new(body);
        let depth = {
            let mut messages = self.lock();
            messages.push_back(message);
            messages.len()
        };
        self.inner.notify.notify_one();

        tracing::debug!(depth, "Alert queued for delivery");
    }

    /// Remove and return the head of the queue, if any.
    pub fn try_dequeue(&self) -> Option<PendingMessage> {
        self.lock().pop_front()
    }

    /// Wait until a message is enqueued or `timeout` elapses.
    ///
    /// Returns immediately when the queue is already non-empty. A wakeup does
    /// not guarantee a message is still present; callers re-check with
    /// [`try_dequeue`](Self::try_dequeue).
    pub async fn wait_for_message(&self, timeout: Duration) {
        if !self.is_empty() {
            return;
        }
        let _ = tokio::time::timeout(timeout, self.inner.notify.notified()).await;
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A poisoned lock still holds a consistent deque: every critical section
    // is a single push or pop.
    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingMessage>> {
        self.inner
            .messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = DeliveryQueue::new();
        queue.enqueue("first");
        queue.enqueue("second");
        queue.enqueue("third");

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.try_dequeue().unwrap().body(), "first");
        assert_eq!(queue.try_dequeue().unwrap().body(), "second");
        assert_eq!(queue.try_dequeue().unwrap().body(), "third");
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_try_dequeue_empty_returns_none() {
        let queue = DeliveryQueue::new();
        assert!(queue.is_empty());
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_clones_share_storage() {
        let producer = DeliveryQueue::new();
        let consumer = producer.clone();
        producer.enqueue("shared");
        assert_eq!(consumer.try_dequeue().unwrap().body(), "shared");
        assert!(producer.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueue_no_loss_no_duplication() {
        let queue = DeliveryQueue::new();
        let producers = 16;
        let per_producer = 250;

        let handles: Vec<_> = (0..producers)
            .map(|p| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    for i in 0..per_producer {
                        queue.enqueue(format!("{p}-{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut seen = HashSet::new();
        while let Some(message) = queue.try_dequeue() {
            assert!(seen.insert(message.body().to_string()), "duplicate message");
        }
        assert_eq!(seen.len(), producers * per_producer);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_per_producer_order_preserved() {
        let queue = DeliveryQueue::new();

        let handles: Vec<_> = (0..4)
            .map(|p| {
                let queue = queue.clone();
                tokio::spawn(async move {
                    for i in 0..100 {
                        queue.enqueue(format!("{p}:{i}"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let mut last = [None::<u32>; 4];
        while let Some(message) = queue.try_dequeue() {
            let (p, i) = message.body().split_once(':').unwrap();
            let (p, i): (usize, u32) = (p.parse().unwrap(), i.parse().unwrap());
            if let Some(prev) = last[p] {
                assert!(i > prev);
            }
            last[p] = Some(i);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_returns_on_enqueue() {
        let queue = DeliveryQueue::new();
        let producer = queue.clone();

        let started = tokio::time::Instant::now();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            producer.enqueue("wake");
        });

        queue.wait_for_message(Duration::from_secs(10)).await;
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(queue.try_dequeue().unwrap().body(), "wake");
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out_when_idle() {
        let queue = DeliveryQueue::new();
        let started = tokio::time::Instant::now();

        queue.wait_for_message(Duration::from_secs(1)).await;

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(queue.try_dequeue().is_none());
    }
}
