use super::product::{Product, ProductSnapshot};
use crate::error::{OrderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One product and quantity staged for purchase. Never persisted.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CartLine {
    pub product_id: String,
    pub product: ProductSnapshot,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product: &Product, quantity: i64) -> Self {
        Self {
            product_id: product.id.clone(),
            product: product.snapshot(),
            quantity,
        }
    }

    pub fn vendor_id(&self) -> &str {
        &self.product.vendor_id
    }

    /// Quantity as an unsigned count. Only meaningful once the cart passed
    /// [`validate`].
    pub fn units(&self) -> u32 {
        u32::try_from(self.quantity).unwrap_or(0)
    }
}

/// Upper bounds applied by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartLimits {
    pub max_line_quantity: u32,
    pub max_total_items: u64,
}

impl Default for CartLimits {
    fn default() -> Self {
        Self {
            max_line_quantity: 100,
            max_total_items: 1000,
        }
    }
}

/// Validates a cart against the default [`CartLimits`].
pub fn validate(lines: &[CartLine]) -> Result<()> {
    validate_with(lines, &CartLimits::default())
}

/// Rejects structurally invalid carts. Pure: the stock check runs against
/// the snapshot carried by each line, the authoritative check happens at
/// commit time.
pub fn validate_with(lines: &[CartLine], limits: &CartLimits) -> Result<()> {
    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    for line in lines {
        if line.quantity <= 0 || line.quantity > i64::from(limits.max_line_quantity) {
            return Err(OrderError::InvalidQuantity {
                product_id: line.product_id.clone(),
                product_name: line.product.name.clone(),
                quantity: line.quantity,
                max: limits.max_line_quantity,
            });
        }

        if !line.product.price.is_some_and(|price| price.is_positive()) {
            return Err(OrderError::InvalidPrice {
                product_id: line.product_id.clone(),
                product_name: line.product.name.clone(),
            });
        }

        if line.quantity > i64::from(line.product.stock) {
            return Err(OrderError::InsufficientStock {
                product_id: line.product_id.clone(),
                product_name: line.product.name.clone(),
                available: line.product.stock,
            });
        }
    }

    let total: i64 = lines.iter().map(|line| line.quantity).sum();
    if total > i64::try_from(limits.max_total_items).unwrap_or(i64::MAX) {
        return Err(OrderError::CartTooLarge {
            total,
            max: limits.max_total_items,
        });
    }

    Ok(())
}

/// Groups lines by owning vendor. Line order inside a group follows the cart.
pub fn partition(lines: &[CartLine]) -> BTreeMap<String, Vec<CartLine>> {
    let mut groups: BTreeMap<String, Vec<CartLine>> = BTreeMap::new();
    for line in lines {
        groups
            .entry(line.vendor_id().to_string())
            .or_default()
            .push(line.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::product::ProductStatus;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rust_decimal_macros::dec;

    fn product(id: &str, vendor: &str, stock: u32) -> Product {
        Product {
            id: id.to_string(),
            vendor_id: vendor.to_string(),
            name: format!("Product {id}"),
            category: "ship_store".to_string(),
            price: Money::new(dec!(10)),
            stock,
            status: ProductStatus::Active,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cart() {
        assert!(matches!(validate(&[]), Err(OrderError::EmptyCart)));
    }

    #[test]
    fn test_quantity_bounds() {
        let p = product("p1", "v1", 500);
        for quantity in [0, -3, 101] {
            let result = validate(&[CartLine::new(&p, quantity)]);
            assert!(
                matches!(result, Err(OrderError::InvalidQuantity { quantity: q, .. }) if q == quantity)
            );
        }
        assert!(validate(&[CartLine::new(&p, 100)]).is_ok());
        assert!(validate(&[CartLine::new(&p, 1)]).is_ok());
    }

    #[test]
    fn test_missing_or_non_positive_price() {
        let p = product("p1", "v1", 5);

        let mut missing = CartLine::new(&p, 1);
        missing.product.price = None;
        assert!(matches!(
            validate(&[missing]),
            Err(OrderError::InvalidPrice { .. })
        ));

        let mut zero = CartLine::new(&p, 1);
        zero.product.price = Some(Money::ZERO);
        assert!(matches!(
            validate(&[zero]),
            Err(OrderError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_snapshot_stock_precheck() {
        let p = product("p1", "v1", 2);
        let result = validate(&[CartLine::new(&p, 3)]);
        assert!(matches!(
            result,
            Err(OrderError::InsufficientStock { available: 2, .. })
        ));
    }

    #[test]
    fn test_cart_too_large() {
        let lines: Vec<CartLine> = (0..11)
            .map(|i| CartLine::new(&product(&format!("p{i}"), "v1", 1000), 100))
            .collect();
        assert!(matches!(
            validate(&lines),
            Err(OrderError::CartTooLarge { total: 1100, .. })
        ));
        assert!(validate(&lines[..10]).is_ok());
    }

    #[test]
    fn test_custom_limits() {
        let limits = CartLimits {
            max_line_quantity: 5,
            max_total_items: 8,
        };
        let a = product("a", "v1", 50);
        let b = product("b", "v1", 50);
        assert!(matches!(
            validate_with(&[CartLine::new(&a, 6)], &limits),
            Err(OrderError::InvalidQuantity { max: 5, .. })
        ));
        assert!(matches!(
            validate_with(&[CartLine::new(&a, 5), CartLine::new(&b, 4)], &limits),
            Err(OrderError::CartTooLarge { total: 9, max: 8 })
        ));
    }

    #[test]
    fn test_partition_groups_by_vendor() {
        let lines = vec![
            CartLine::new(&product("p1", "v1", 5), 1),
            CartLine::new(&product("p2", "v2", 5), 2),
            CartLine::new(&product("p3", "v1", 5), 3),
        ];
        let groups = partition(&lines);
        assert_eq!(groups.len(), 2);
        let v1: Vec<&str> = groups["v1"].iter().map(|l| l.product_id.as_str()).collect();
        assert_eq!(v1, ["p1", "p3"]);
        assert_eq!(groups["v2"].len(), 1);
    }

    #[test]
    fn test_partition_preserves_multiset() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let len = rng.gen_range(0..20);
            let lines: Vec<CartLine> = (0..len)
                .map(|i| {
                    let vendor = format!("v{}", rng.gen_range(0..4));
                    let id = format!("p{}", rng.gen_range(0..6));
                    let mut line = CartLine::new(&product(&id, &vendor, 100), rng.gen_range(1..10));
                    line.product.name = format!("line {i}");
                    line
                })
                .collect();

            let groups = partition(&lines);
            for (vendor, group) in &groups {
                assert!(!group.is_empty());
                assert!(group.iter().all(|line| line.vendor_id() == vendor));
            }

            let mut flattened: Vec<String> = groups
                .into_values()
                .flatten()
                .map(|line| line.product.name)
                .collect();
            let mut original: Vec<String> =
                lines.iter().map(|line| line.product.name.clone()).collect();
            flattened.sort();
            original.sort();
            assert_eq!(flattened, original);
        }
    }
}
