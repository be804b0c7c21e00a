//! Payment gateway abstraction.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::AggregateId;
use domain::{CustomerId, Money};

/// Outcome of a payment authorization attempt.
#[derive(Debug, Clone)]
pub enum GatewayOutcome {
    /// The charge was approved.
    Approved { transaction_id: String },

    /// The charge was declined or errored.
    Declined {
        reason: String,
        error_code: Option<String>,
    },
}

/// External payment provider.
///
/// The provider owns the authorization decision; the saga records the
/// outcome on the order's payment record and reacts to it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Attempts to charge the customer for an order.
    async fn authorize(
        &self,
        order_id: AggregateId,
        customer_id: CustomerId,
        amount: Money,
    ) -> GatewayOutcome;
}

/// In-process gateway for tests and local runs.
///
/// Approves everything by default; a configured decline applies to all
/// subsequent authorizations until cleared.
pub struct MockPaymentGateway {
    decline: Mutex<Option<(String, Option<String>)>>,
    sequence: AtomicU64,
}

impl MockPaymentGateway {
    /// Creates a gateway that approves every charge.
    pub fn new() -> Self {
        Self {
            decline: Mutex::new(None),
            sequence: AtomicU64::new(1),
        }
    }

    /// Makes subsequent authorizations fail with the given reason.
    pub fn set_decline(&self, reason: impl Into<String>, error_code: Option<String>) {
        *self.decline.lock().unwrap() = Some((reason.into(), error_code));
    }

    /// Clears a configured decline.
    pub fn approve_all(&self) {
        *self.decline.lock().unwrap() = None;
    }
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn authorize(
        &self,
        _order_id: AggregateId,
        _customer_id: CustomerId,
        _amount: Money,
    ) -> GatewayOutcome {
        if let Some((reason, error_code)) = self.decline.lock().unwrap().clone() {
            return GatewayOutcome::Declined { reason, error_code };
        }

        let n = self.sequence.fetch_add(1, Ordering::Relaxed);
        GatewayOutcome::Approved {
            transaction_id: format!("txn-{n:06}"),
        }
    }
}
