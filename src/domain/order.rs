use super::cart::CartLine;
use super::money::Money;
use super::totals::OrderTotals;
use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Online,
    CashOnDelivery,
}

/// Lifecycle of an order.
///
/// `Pending`/`PendingCod` -> `Confirmed` -> `Shipped` -> `Delivered`, with
/// `Cancelled` reachable from every non-terminal state.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    PendingCod,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn initial(payment_method: PaymentMethod) -> Self {
        match payment_method {
            PaymentMethod::CashOnDelivery => OrderStatus::PendingCod,
            PaymentMethod::Online => OrderStatus::Pending,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (from, _) if from.is_terminal() => false,
            (_, Cancelled) => true,
            (Pending | PendingCod, Confirmed) => true,
            (Confirmed, Shipped) => true,
            (Shipped, Delivered) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::PendingCod => "pending_cod",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub price: Money,
}

/// One vendor's share of a checkout.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub vendor_id: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub commission: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Who is placing a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: String,
}

impl Customer {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Order {
    /// Builds a new order for `vendor_id` from that vendor's cart lines.
    pub fn new(
        id: String,
        customer: &Customer,
        vendor_id: &str,
        lines: &[CartLine],
        payment_method: PaymentMethod,
        totals: OrderTotals,
        now: DateTime<Utc>,
    ) -> Self {
        let items = lines
            .iter()
            .map(|line| OrderItem {
                product_id: line.product_id.clone(),
                name: line.product.name.clone(),
                quantity: line.units(),
                price: line.product.price.unwrap_or_default(),
            })
            .collect();

        Self {
            id,
            customer_id: customer.id.clone(),
            customer_name: customer.name.clone(),
            vendor_id: vendor_id.to_string(),
            items,
            status: OrderStatus::initial(payment_method),
            payment_method,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            commission: totals.commission,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `actor_id` is a party to this order.
    pub fn involves(&self, actor_id: &str) -> bool {
        self.vendor_id == actor_id || self.customer_id == actor_id
    }

    pub fn transition(&mut self, next: OrderStatus, now: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
