//! Orders and the order-creation collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use greenbasket_core::{CustomerId, Money, OrderId, PaymentMethodId, ProductId, StoreId};

use crate::cart::CartLine;
use crate::profile::{Address, PaymentKind, PaymentMethod};

/// Snapshot of one cart line at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    /// The charged unit price (discount price if one was set).
    pub unit_price: Money,
    pub quantity: u32,
    pub line_total: Money,
}

impl From<&CartLine> for OrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product.id,
            name: line.product.name.clone(),
            unit_price: line.product.effective_price(),
            quantity: line.quantity,
            line_total: line.line_total(),
        }
    }
}

/// How the order will be paid, without the instrument's secrets.
///
/// Orders outlive the checkout session and may be logged or exported, so
/// card numbers and CVVs never enter them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub id: PaymentMethodId,
    pub name: String,
    pub kind: PaymentKind,
}

impl From<&PaymentMethod> for PaymentSummary {
    fn from(method: &PaymentMethod) -> Self {
        Self {
            id: method.id,
            name: method.name.clone(),
            kind: method.details.kind(),
        }
    }
}

/// Everything the order service needs to create an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub items: Vec<OrderItem>,
    pub address: Address,
    pub payment: PaymentSummary,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
}

/// A placed order. Immutable once created; there are no order-mutation
/// operations in this engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub store_id: StoreId,
    pub items: Vec<OrderItem>,
    pub address: Address,
    pub payment: PaymentSummary,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub total: Money,
    pub placed_at: DateTime<Utc>,
}

impl Order {
    /// Mint an order from a draft. Intended for [`OrderGateway`]
    /// implementations.
    #[must_use]
    pub fn from_draft(id: OrderId, draft: OrderDraft, placed_at: DateTime<Utc>) -> Self {
        Self {
            id,
            customer_id: draft.customer_id,
            store_id: draft.store_id,
            items: draft.items,
            address: draft.address,
            payment: draft.payment,
            subtotal: draft.subtotal,
            delivery_fee: draft.delivery_fee,
            total: draft.total,
            placed_at,
        }
    }
}

/// Failure reported by the order service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("order service rejected the order: {0}")]
pub struct GatewayError(pub String);

/// The external order-creation collaborator.
///
/// The single suspension point in the engine. Implementations may fail
/// asynchronously; the checkout flow treats any failure as retryable.
pub trait OrderGateway {
    fn create_order(
        &self,
        draft: OrderDraft,
    ) -> impl Future<Output = Result<Order, GatewayError>> + Send;
}
