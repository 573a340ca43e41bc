// Rust guideline compliant 2026-10-15

//! In-process adapter for the `Producer` and `Consumer` queue ports.
//!
//! Fresh messages sit in a bounded buffer: `produce` suspends while it is
//! full, so producers cannot outrun consumers. Nacked messages go to a
//! separate, unbounded redelivery list that consumers drain first; a nack
//! therefore never blocks and never overtakes capacity for fresh work.
//!
//! A message handle dropped without `ack` or `nack` is requeued, so a worker
//! future cancelled mid-processing loses nothing. Everything lives in process
//! memory: a crash loses every queued and in-flight message.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use domain::{Consumer, Producer, QueueError, QueueMessage};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Inner state
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct State<T> {
    fresh: VecDeque<Arc<T>>,
    redelivery: VecDeque<Arc<T>>,
    closed: bool,
}

#[derive(Debug)]
struct Shared<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    /// Signalled when a message becomes available or the queue closes.
    available: Notify,
    /// Signalled when buffer space frees up or the queue closes.
    space: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // State stays consistent across a panicking holder: every mutation is
        // a single push or pop.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn requeue(&self, body: Arc<T>) {
        self.lock().redelivery.push_back(body);
        self.available.notify_waiters();
    }
}

// ---------------------------------------------------------------------------
// MemoryQueue
// ---------------------------------------------------------------------------

/// Bounded, multi-producer, multi-consumer in-memory queue.
///
/// Cloning yields another handle to the same queue.
#[derive(Debug)]
pub struct MemoryQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for MemoryQueue<T> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<T> MemoryQueue<T> {
    /// Create an open queue holding at most `capacity` fresh messages.
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    fresh: VecDeque::new(),
                    redelivery: VecDeque::new(),
                    closed: false,
                }),
                capacity: capacity.max(1),
                available: Notify::new(),
                space: Notify::new(),
            }),
        }
    }

    /// Refuse further produces. Consumers drain what is queued, then receive
    /// `Closed`. Idempotent.
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.available.notify_waiters();
        self.shared.space.notify_waiters();
    }

    /// Messages waiting for delivery, fresh and redelivered.
    #[must_use]
    pub fn len(&self) -> usize {
        let state = self.shared.lock();
        state.fresh.len() + state.redelivery.len()
    }

    #[cfg(test)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Producer<T> for MemoryQueue<T> {
    /// Append `body`, suspending while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] once [`close`](MemoryQueue::close) has run.
    async fn produce(&self, body: T) -> Result<(), QueueError> {
        let body = Arc::new(body);
        loop {
            // Register interest before inspecting state so a concurrent
            // notify_waiters cannot slip between the check and the wait.
            let space = self.shared.space.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            {
                let mut state = self.shared.lock();
                if state.closed {
                    return Err(QueueError::Closed);
                }
                if state.fresh.len() < self.shared.capacity {
                    state.fresh.push_back(body);
                    drop(state);
                    self.shared.available.notify_waiters();
                    return Ok(());
                }
            }

            space.await;
        }
    }
}

impl<T> Consumer<T> for MemoryQueue<T> {
    type Message = MemoryMessage<T>;

    /// Take the next message, redeliveries first, suspending while empty.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Closed`] when the queue is closed and drained.
    async fn consume(&self) -> Result<MemoryMessage<T>, QueueError> {
        loop {
            let available = self.shared.available.notified();
            tokio::pin!(available);
            available.as_mut().enable();

            {
                let mut state = self.shared.lock();
                if let Some(body) = state.redelivery.pop_front() {
                    return Ok(MemoryMessage::new(Arc::clone(&self.shared), body));
                }
                if let Some(body) = state.fresh.pop_front() {
                    drop(state);
                    self.shared.space.notify_waiters();
                    return Ok(MemoryMessage::new(Arc::clone(&self.shared), body));
                }
                if state.closed {
                    return Err(QueueError::Closed);
                }
            }

            available.await;
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryMessage
// ---------------------------------------------------------------------------

/// One delivery from a [`MemoryQueue`].
///
/// Requeued on `nack` and on drop; removed for good only by `ack`.
#[derive(Debug)]
pub struct MemoryMessage<T> {
    shared: Arc<Shared<T>>,
    body: Arc<T>,
    acked: bool,
}

impl<T> MemoryMessage<T> {
    fn new(shared: Arc<Shared<T>>, body: Arc<T>) -> Self {
        Self { shared, body, acked: false }
    }
}

impl<T> QueueMessage<T> for MemoryMessage<T> {
    fn body(&self) -> &T {
        &self.body
    }

    fn ack(mut self) {
        self.acked = true;
    }

    fn nack(self) {
        // Drop requeues.
    }
}

impl<T> Drop for MemoryMessage<T> {
    fn drop(&mut self) {
        if !self.acked {
            self.shared.requeue(Arc::clone(&self.body));
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::MemoryQueue;
    use domain::{Consumer as _, Producer as _, QueueError, QueueMessage as _};
    use std::collections::BTreeSet;
    use std::time::Duration;

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let queue = MemoryQueue::new(8);
        for n in 1..=3 {
            queue.produce(n).await.unwrap();
        }
        for n in 1..=3 {
            let msg = queue.consume().await.unwrap();
            assert_eq!(*msg.body(), n);
            msg.ack();
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn nack_redelivers_before_fresh_messages() {
        let queue = MemoryQueue::new(8);
        queue.produce("a").await.unwrap();
        queue.produce("b").await.unwrap();

        queue.consume().await.unwrap().nack();

        let again = queue.consume().await.unwrap();
        assert_eq!(*again.body(), "a");
        again.ack();
        assert_eq!(*queue.consume().await.unwrap().body(), "b");
    }

    #[tokio::test]
    async fn dropped_message_is_requeued() {
        let queue = MemoryQueue::new(8);
        queue.produce(7).await.unwrap();
        {
            let _msg = queue.consume().await.unwrap();
        }
        assert_eq!(queue.len(), 1);
        let msg = queue.consume().await.unwrap();
        assert_eq!(*msg.body(), 7);
        msg.ack();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn nack_cycles_lose_and_duplicate_nothing() {
        const N: u32 = 25;
        let queue = MemoryQueue::new(32);
        for n in 0..N {
            queue.produce(n).await.unwrap();
        }
        for _ in 0..N {
            queue.consume().await.unwrap().nack();
        }
        queue.close();

        let mut delivered = BTreeSet::new();
        let mut acks = 0;
        while let Ok(msg) = queue.consume().await {
            assert!(delivered.insert(*msg.body()), "duplicate delivery of {}", msg.body());
            msg.ack();
            acks += 1;
        }
        assert_eq!(acks, N);
        assert_eq!(delivered, (0..N).collect::<BTreeSet<_>>());
    }

    #[tokio::test]
    async fn closed_queue_drains_then_reports_closed() {
        let queue = MemoryQueue::new(4);
        queue.produce(1).await.unwrap();
        queue.close();

        assert_eq!(queue.produce(2).await, Err(QueueError::Closed));
        queue.consume().await.unwrap().ack();
        assert_eq!(queue.consume().await.err(), Some(QueueError::Closed));
    }

    #[tokio::test]
    async fn full_queue_applies_backpressure() {
        let queue = MemoryQueue::new(1);
        queue.produce(1).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(20), queue.produce(2)).await;
        assert!(blocked.is_err(), "produce must wait while the buffer is full");

        // Consuming frees a slot and unblocks the producer.
        let (produced, ()) = tokio::join!(queue.produce(2), async {
            let msg = queue.consume().await.unwrap();
            msg.ack();
        });
        produced.unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn waiting_consumer_wakes_on_produce() {
        let queue = MemoryQueue::new(4);
        let (msg, ()) = tokio::join!(queue.consume(), async {
            tokio::task::yield_now().await;
            queue.produce(42).await.unwrap();
        });
        let msg = msg.unwrap();
        assert_eq!(*msg.body(), 42);
        msg.ack();
    }

    #[tokio::test]
    async fn waiting_consumer_wakes_on_close() {
        let queue: MemoryQueue<u8> = MemoryQueue::new(4);
        let (result, ()) = tokio::join!(queue.consume(), async {
            tokio::task::yield_now().await;
            queue.close();
        });
        assert_eq!(result.err(), Some(QueueError::Closed));
    }

    #[tokio::test]
    async fn nack_never_blocks_on_a_full_buffer() {
        let queue = MemoryQueue::new(1);
        queue.produce(1).await.unwrap();
        let msg = queue.consume().await.unwrap();
        queue.produce(2).await.unwrap();
        msg.nack();
        assert_eq!(queue.len(), 2);
    }
}
