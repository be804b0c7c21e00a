//! The payment record aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use event_store::Version;
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::value_objects::{CustomerId, Money};

use super::events::PaymentEvent;
use super::state::PaymentStatus;
use super::PaymentError;

/// Namespace for deriving payment stream IDs from order IDs.
const PAYMENT_NAMESPACE: Uuid = Uuid::from_bytes([
    0xc4, 0x82, 0x6b, 0x0e, 0x21, 0xd7, 0x45, 0x39, 0xb3, 0x7f, 0x08, 0xa9, 0x4e, 0xd5, 0x12, 0x8b,
]);

/// The payment attempt for one order.
///
/// One record per order: the stream ID is derived from the order ID, so
/// a redelivered open lands on the existing record instead of creating
/// a second charge. The record resolves exactly once.
#[derive(Debug, Default, Clone)]
pub struct PaymentRecord {
    id: Option<AggregateId>,
    version: Version,
    order_id: Option<AggregateId>,
    customer_id: Option<CustomerId>,
    amount: Money,
    status: PaymentStatus,
    transaction_id: Option<String>,
    failure_reason: Option<String>,
    error_code: Option<String>,
    resolved_at: Option<DateTime<Utc>>,
    notes: Vec<String>,
}

impl PaymentRecord {
    /// Derives the deterministic payment stream ID for an order.
    pub fn stream_id(order_id: AggregateId) -> AggregateId {
        AggregateId::derive(PAYMENT_NAMESPACE, order_id.as_uuid().as_bytes())
    }

    /// Returns the order this payment belongs to.
    pub fn order_id(&self) -> Option<AggregateId> {
        self.order_id
    }

    /// Returns the paying customer.
    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    /// Returns the amount being charged.
    pub fn amount(&self) -> Money {
        self.amount
    }

    /// Returns the current payment status.
    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    /// Returns the provider transaction reference, once settled.
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Returns the failure reason, if the payment failed.
    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    /// Returns the provider error code, if the payment failed with one.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    /// Returns when the payment reached a terminal state.
    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    /// Returns the operator notes attached to this payment.
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Opens the payment attempt for an order.
    ///
    /// A redelivered open for the same order is a no-op.
    pub fn open(
        &self,
        order_id: AggregateId,
        customer_id: CustomerId,
        amount: Money,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        if self.id.is_some() {
            return Ok(vec![]);
        }

        if !amount.is_positive() {
            return Err(PaymentError::InvalidAmount {
                amount: amount.cents(),
            });
        }

        Ok(vec![PaymentEvent::payment_opened(
            order_id,
            customer_id,
            amount,
        )])
    }

    /// Records a successful settlement.
    ///
    /// A duplicate success is a no-op; succeeding after a failure is a
    /// conflicting resolution and rejects.
    pub fn succeed(
        &self,
        transaction_id: impl Into<String>,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        self.ensure_opened()?;

        match self.status {
            PaymentStatus::Pending => Ok(vec![PaymentEvent::payment_succeeded(transaction_id)]),
            PaymentStatus::Success => Ok(vec![]),
            PaymentStatus::Failed => Err(PaymentError::AlreadyResolved {
                status: self.status,
                attempted: "succeed",
            }),
        }
    }

    /// Records a failed settlement.
    ///
    /// A duplicate failure is a no-op; failing after a success rejects.
    pub fn fail(
        &self,
        reason: impl Into<String>,
        error_code: Option<String>,
    ) -> Result<Vec<PaymentEvent>, PaymentError> {
        self.ensure_opened()?;

        match self.status {
            PaymentStatus::Pending => Ok(vec![PaymentEvent::payment_failed(reason, error_code)]),
            PaymentStatus::Failed => Ok(vec![]),
            PaymentStatus::Success => Err(PaymentError::AlreadyResolved {
                status: self.status,
                attempted: "fail",
            }),
        }
    }

    /// Attaches a free-form operator note.
    pub fn annotate(&self, note: impl Into<String>) -> Result<Vec<PaymentEvent>, PaymentError> {
        self.ensure_opened()?;
        Ok(vec![PaymentEvent::payment_note_added(note)])
    }

    fn ensure_opened(&self) -> Result<(), PaymentError> {
        if self.id.is_none() {
            return Err(PaymentError::NotOpened);
        }
        Ok(())
    }
}

impl Aggregate for PaymentRecord {
    type Event = PaymentEvent;
    type Error = PaymentError;

    fn aggregate_type() -> &'static str {
        "PaymentRecord"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: PaymentEvent) {
        match event {
            PaymentEvent::PaymentOpened(data) => {
                self.id = Some(Self::stream_id(data.order_id));
                self.order_id = Some(data.order_id);
                self.customer_id = Some(data.customer_id);
                self.amount = data.amount;
                self.status = PaymentStatus::Pending;
            }
            PaymentEvent::PaymentSucceeded(data) => {
                self.status = PaymentStatus::Success;
                self.transaction_id = Some(data.transaction_id);
                self.resolved_at = Some(data.succeeded_at);
            }
            PaymentEvent::PaymentFailed(data) => {
                self.status = PaymentStatus::Failed;
                self.failure_reason = Some(data.reason);
                self.error_code = data.error_code;
                self.resolved_at = Some(data.failed_at);
            }
            PaymentEvent::PaymentNoteAdded(data) => {
                self.notes.push(data.note);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened() -> PaymentRecord {
        let mut record = PaymentRecord::default();
        record.apply(PaymentEvent::payment_opened(
            AggregateId::new(),
            CustomerId::new(),
            Money::from_cents(2500),
        ));
        record
    }

    #[test]
    fn test_stream_id_derived_from_order() {
        let order_id = AggregateId::new();
        assert_eq!(
            PaymentRecord::stream_id(order_id),
            PaymentRecord::stream_id(order_id)
        );
        assert_ne!(
            PaymentRecord::stream_id(order_id),
            PaymentRecord::stream_id(AggregateId::new())
        );
    }

    #[test]
    fn test_open_is_idempotent() {
        let record = opened();
        let events = record
            .open(AggregateId::new(), CustomerId::new(), Money::from_cents(1))
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_open_rejects_non_positive_amount() {
        let record = PaymentRecord::default();
        let result = record.open(AggregateId::new(), CustomerId::new(), Money::zero());
        assert!(matches!(
            result,
            Err(PaymentError::InvalidAmount { amount: 0 })
        ));
    }

    #[test]
    fn test_resolution_requires_open() {
        let record = PaymentRecord::default();
        assert!(matches!(
            record.succeed("txn-1"),
            Err(PaymentError::NotOpened)
        ));
    }

    #[test]
    fn test_resolves_exactly_once() {
        let mut record = opened();
        let events = record.succeed("txn-1").unwrap();
        record.apply_events(events);
        assert_eq!(record.status(), PaymentStatus::Success);
        assert_eq!(record.transaction_id(), Some("txn-1"));

        // Duplicate of the same resolution is a no-op.
        assert!(record.succeed("txn-1").unwrap().is_empty());

        // The opposite resolution conflicts.
        let result = record.fail("card declined", None);
        assert!(matches!(
            result,
            Err(PaymentError::AlreadyResolved {
                status: PaymentStatus::Success,
                attempted: "fail",
            })
        ));
    }

    #[test]
    fn test_failure_records_reason() {
        let mut record = opened();
        let events = record.fail("card declined", Some("051".into())).unwrap();
        record.apply_events(events);

        assert_eq!(record.status(), PaymentStatus::Failed);
        assert_eq!(record.failure_reason(), Some("card declined"));
        assert_eq!(record.error_code(), Some("051"));
        assert!(record.resolved_at().is_some());
        assert!(record.fail("card declined", None).unwrap().is_empty());
        assert!(record.succeed("txn-1").is_err());
    }

    #[test]
    fn test_annotate_appends_notes() {
        let mut record = opened();
        let events = record.annotate("customer called about the charge").unwrap();
        record.apply_events(events);
        let events = record.annotate("refund issued manually").unwrap();
        record.apply_events(events);

        assert_eq!(record.notes().len(), 2);
        assert_eq!(record.notes()[1], "refund issued manually");
    }

    #[test]
    fn test_annotate_requires_open() {
        let record = PaymentRecord::default();
        assert!(matches!(
            record.annotate("note"),
            Err(PaymentError::NotOpened)
        ));
    }
}
