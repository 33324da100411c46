use super::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Draft,
    Archived,
}

/// A product listing as held by the catalog.
///
/// Owned by a vendor. Customers never mutate it directly; the only writer
/// besides the vendor is the order engine, which decrements `stock`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Product {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Money,
    pub stock: u32,
    pub status: ProductStatus,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Removes `quantity` units from stock, refusing to go below zero.
    pub fn take_stock(&mut self, quantity: u32, now: DateTime<Utc>) -> Option<u32> {
        let remaining = self.stock.checked_sub(quantity)?;
        self.stock = remaining;
        self.updated_at = now;
        Some(remaining)
    }

    /// The client-side copy a cart line carries around.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id.clone(),
            vendor_id: self.vendor_id.clone(),
            name: self.name.clone(),
            category: self.category.clone(),
            price: Some(self.price),
            stock: self.stock,
        }
    }
}

/// Last-known state of a product as seen by the customer when the cart was
/// built. May be stale by the time the checkout runs.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ProductSnapshot {
    pub id: String,
    pub vendor_id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub price: Option<Money>,
    pub stock: u32,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        product.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn product(stock: u32) -> Product {
        Product {
            id: "p1".to_string(),
            vendor_id: "v1".to_string(),
            name: "Anchor chain".to_string(),
            category: "ship_spares".to_string(),
            price: Money::new(dec!(100)),
            stock,
            status: ProductStatus::Active,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_take_stock() {
        let mut p = product(5);
        assert_eq!(p.take_stock(2, Utc::now()), Some(3));
        assert_eq!(p.stock, 3);
    }

    #[test]
    fn test_take_stock_never_negative() {
        let mut p = product(1);
        assert_eq!(p.take_stock(2, Utc::now()), None);
        assert_eq!(p.stock, 1);
    }

    #[test]
    fn test_product_deserialization_defaults() {
        let json = r#"{"id":"p1","vendor_id":"v1","name":"Rope","price":"12.50","stock":4,"status":"draft"}"#;
        let p: Product = serde_json::from_str(json).unwrap();
        assert_eq!(p.price, Money::new(dec!(12.50)));
        assert_eq!(p.status, ProductStatus::Draft);
        assert_eq!(p.category, "");
    }

    #[test]
    fn test_snapshot_copies_price_and_stock() {
        let p = product(7);
        let snap = ProductSnapshot::from(&p);
        assert_eq!(snap.price, Some(p.price));
        assert_eq!(snap.stock, 7);
        assert_eq!(snap.vendor_id, "v1");
    }
}
