//! Order status read model — where every order stands.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::AggregateId;
use domain::{CustomerId, Money, OrderEvent, OrderStatus};
use event_store::EventEnvelope;
use tokio::sync::RwLock;

use crate::Result;
use crate::projection::{Projection, ProjectionPosition};
use crate::read_model::ReadModel;

/// Denormalized summary of one order.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub status: OrderStatus,
    pub total_amount: Money,
    pub item_count: usize,
    pub placed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

struct OrderStatusState {
    orders: HashMap<AggregateId, OrderSummary>,
    by_customer: HashMap<CustomerId, Vec<AggregateId>>,
    position: ProjectionPosition,
}

/// Read model view over order lifecycles.
#[derive(Clone)]
pub struct OrderStatusView {
    state: Arc<RwLock<OrderStatusState>>,
}

impl OrderStatusView {
    /// Creates a new empty order status view.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(OrderStatusState {
                orders: HashMap::new(),
                by_customer: HashMap::new(),
                position: ProjectionPosition::zero(),
            })),
        }
    }

    /// Gets the summary for an order.
    pub async fn get_order(&self, order_id: &AggregateId) -> Option<OrderSummary> {
        self.state.read().await.orders.get(order_id).cloned()
    }

    /// Gets all orders currently in the given status.
    pub async fn get_by_status(&self, status: OrderStatus) -> Vec<OrderSummary> {
        self.state
            .read()
            .await
            .orders
            .values()
            .filter(|summary| summary.status == status)
            .cloned()
            .collect()
    }

    /// Gets all orders for a customer, newest first.
    pub async fn get_for_customer(&self, customer_id: &CustomerId) -> Vec<OrderSummary> {
        let state = self.state.read().await;
        let mut orders: Vec<_> = state
            .by_customer
            .get(customer_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.orders.get(id).cloned())
            .collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));
        orders
    }
}

impl Default for OrderStatusView {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Projection for OrderStatusView {
    fn name(&self) -> &'static str {
        "OrderStatusView"
    }

    async fn handle(&self, event: &EventEnvelope) -> Result<()> {
        if event.aggregate_type != "Order" {
            let mut state = self.state.write().await;
            state.position = state.position.advance();
            return Ok(());
        }

        let order_event: OrderEvent = serde_json::from_value(event.payload.clone())?;
        let order_id = event.aggregate_id;

        let mut state = self.state.write().await;

        match order_event {
            OrderEvent::OrderPlaced(data) => {
                state
                    .by_customer
                    .entry(data.customer_id)
                    .or_default()
                    .push(order_id);
                state.orders.insert(
                    order_id,
                    OrderSummary {
                        order_id,
                        customer_id: data.customer_id,
                        status: OrderStatus::Pending,
                        total_amount: data.total_amount,
                        item_count: data.items.len(),
                        placed_at: data.placed_at,
                        updated_at: data.placed_at,
                    },
                );
            }
            OrderEvent::OrderConfirmed(data) => {
                if let Some(summary) = state.orders.get_mut(&order_id) {
                    summary.status = OrderStatus::Confirmed;
                    summary.updated_at = data.confirmed_at;
                }
            }
            OrderEvent::OrderProcessingStarted(data) => {
                if let Some(summary) = state.orders.get_mut(&order_id) {
                    summary.status = OrderStatus::Processing;
                    summary.updated_at = data.started_at;
                }
            }
            OrderEvent::OrderDelivered(data) => {
                if let Some(summary) = state.orders.get_mut(&order_id) {
                    summary.status = OrderStatus::Delivered;
                    summary.updated_at = data.delivered_at;
                }
            }
            OrderEvent::OrderCancelled(data) => {
                if let Some(summary) = state.orders.get_mut(&order_id) {
                    summary.status = OrderStatus::Cancelled;
                    summary.updated_at = data.cancelled_at;
                }
            }
        }

        state.position = state.position.advance();
        Ok(())
    }

    async fn position(&self) -> ProjectionPosition {
        self.state.read().await.position
    }

    async fn reset(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.clear();
        state.by_customer.clear();
        state.position = ProjectionPosition::zero();
        Ok(())
    }
}

impl ReadModel for OrderStatusView {
    fn name(&self) -> &'static str {
        "OrderStatusView"
    }

    fn count(&self) -> usize {
        self.state.try_read().map(|s| s.orders.len()).unwrap_or(0)
    }
}
