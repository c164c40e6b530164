//! In-process queue over tokio channels.
//!
//! Faithful to broker semantics where the pipeline can observe them:
//! unacked deliveries are requeued on drop, outcomes travel back to the
//! publisher, and the queue closes once every publisher is gone and the
//! backlog is drained.

use tokio::sync::mpsc::{
    UnboundedReceiver, UnboundedSender, WeakUnboundedSender,
    unbounded_channel,
};
use tokio::sync::oneshot;

use crate::{Delivery, MessageQueue};

/// A message in flight, with the channel its outcome goes back on.
struct QueuedMessage {
    body: Vec<u8>,
    completion: Option<oneshot::Sender<Vec<u8>>>,
}

/// Creates a connected publisher/queue pair.
pub fn memory_queue() -> (QueuePublisher, MemoryQueue) {
    let (tx, rx) = unbounded_channel();
    // The queue keeps only a weak sender for requeueing: if it held a
    // strong one, the channel could never close and `recv` would never
    // return `None`.
    let redeliver = tx.downgrade();
    (QueuePublisher { tx }, MemoryQueue { rx, redeliver })
}

/// The producing end: what the rest of the platform uses to enqueue
/// session requests.
#[derive(Clone)]
pub struct QueuePublisher {
    tx: UnboundedSender<QueuedMessage>,
}

impl QueuePublisher {
    /// Enqueues a message body and returns a receiver that resolves with
    /// the processing outcome once the consumer acks.
    ///
    /// Dropping the receiver is fine — fire-and-forget publishing.
    pub fn publish(&self, body: Vec<u8>) -> oneshot::Receiver<Vec<u8>> {
        let (completion, outcome) = oneshot::channel();
        let _ = self.tx.send(QueuedMessage {
            body,
            completion: Some(completion),
        });
        outcome
    }
}

/// The consuming end, held by exactly one worker.
pub struct MemoryQueue {
    rx: UnboundedReceiver<QueuedMessage>,
    redeliver: WeakUnboundedSender<QueuedMessage>,
}

impl MessageQueue for MemoryQueue {
    type Delivery = MemoryDelivery;

    async fn recv(&mut self) -> Option<MemoryDelivery> {
        let message = self.rx.recv().await?;
        Some(MemoryDelivery {
            body: message.body,
            completion: message.completion,
            redeliver: self.redeliver.upgrade(),
            settled: false,
        })
    }
}

/// A delivery from a [`MemoryQueue`].
pub struct MemoryDelivery {
    body: Vec<u8>,
    completion: Option<oneshot::Sender<Vec<u8>>>,
    /// `None` when every publisher is already gone; requeueing then has
    /// nowhere to go and the message is dropped on the floor, which
    /// matches a broker deleting its queue.
    redeliver: Option<UnboundedSender<QueuedMessage>>,
    settled: bool,
}

impl Delivery for MemoryDelivery {
    fn body(&self) -> &[u8] {
        &self.body
    }

    async fn ack(mut self, outcome: Vec<u8>) {
        self.settled = true;
        if let Some(completion) = self.completion.take() {
            // The publisher may have stopped listening; that's its call.
            let _ = completion.send(outcome);
        }
    }
}

impl Drop for MemoryDelivery {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Dropped without an ack: put the message back, completion
        // channel and all, so the publisher still gets an outcome from
        // whoever processes the redelivery.
        let Some(redeliver) = self.redeliver.take() else {
            return;
        };
        let requeued = QueuedMessage {
            body: std::mem::take(&mut self.body),
            completion: self.completion.take(),
        };
        if redeliver.send(requeued).is_err() {
            tracing::warn!("unacked message lost: queue already closed");
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
