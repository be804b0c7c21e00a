//! In-process at-least-once message delivery.
//!
//! Models the delivery contract the coordinator is written against:
//! messages may be redelivered and may arrive out of order. Transient
//! failures are redelivered a bounded number of times; messages that
//! keep failing, or fail irrecoverably, land on a dead letter list for
//! an operator instead of being silently dropped.

use std::collections::VecDeque;
use std::sync::Arc;

use event_store::EventStore;

use crate::coordinator::SagaCoordinator;
use crate::error::SagaError;
use crate::messages::SagaMessage;

/// How many times a message is redelivered after transient failures.
const MAX_DELIVERY_ATTEMPTS: u32 = 5;

struct Delivery {
    message: SagaMessage,
    attempts: u32,
}

/// A message that exhausted its deliveries or failed irrecoverably.
#[derive(Debug)]
pub struct DeadLetter {
    /// The undeliverable message.
    pub message: SagaMessage,

    /// The last error it produced.
    pub error: String,

    /// How many deliveries were attempted.
    pub attempts: u32,
}

/// Drives the coordinator from an in-memory queue.
pub struct DeliveryPump<S: EventStore> {
    coordinator: Arc<SagaCoordinator<S>>,
    queue: VecDeque<Delivery>,
    dead_letters: Vec<DeadLetter>,
}

impl<S: EventStore + Clone> DeliveryPump<S> {
    /// Creates a pump feeding the given coordinator.
    pub fn new(coordinator: Arc<SagaCoordinator<S>>) -> Self {
        Self {
            coordinator,
            queue: VecDeque::new(),
            dead_letters: Vec::new(),
        }
    }

    /// Returns the coordinator this pump feeds.
    pub fn coordinator(&self) -> &Arc<SagaCoordinator<S>> {
        &self.coordinator
    }

    /// Queues a message for delivery.
    pub fn enqueue(&mut self, message: SagaMessage) {
        self.queue.push_back(Delivery {
            message,
            attempts: 0,
        });
    }

    /// Number of messages still waiting for delivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Messages that could not be delivered.
    pub fn dead_letters(&self) -> &[DeadLetter] {
        &self.dead_letters
    }

    /// Delivers queued messages (and the follow-ups they produce) until
    /// the queue is empty.
    pub async fn run_until_idle(&mut self) -> Result<(), SagaError> {
        while let Some(delivery) = self.queue.pop_front() {
            self.deliver(delivery).await;
        }
        Ok(())
    }

    async fn deliver(&mut self, delivery: Delivery) {
        let attempts = delivery.attempts + 1;
        let message_type = delivery.message.message_type();

        match self.coordinator.handle(delivery.message.clone()).await {
            Ok(follow_ups) => {
                for message in follow_ups {
                    self.enqueue(message);
                }
            }
            Err(e) if e.is_transient() && attempts < MAX_DELIVERY_ATTEMPTS => {
                tracing::debug!(
                    message_type,
                    attempts,
                    error = %e,
                    "transient delivery failure, requeueing"
                );
                metrics::counter!("saga_redeliveries_total").increment(1);
                self.queue.push_back(Delivery {
                    message: delivery.message,
                    attempts,
                });
            }
            Err(e) => {
                tracing::error!(
                    message_type,
                    attempts,
                    error = %e,
                    "message moved to dead letters"
                );
                metrics::counter!("saga_dead_letters_total").increment(1);
                self.dead_letters.push(DeadLetter {
                    message: delivery.message,
                    error: e.to_string(),
                    attempts,
                });
            }
        }
    }
}
