use super::cart::CartLine;
use super::money::{Money, Rate};
use crate::error::{OrderError, Result};
use serde::{Deserialize, Serialize};

/// Money amounts for one vendor's share of a checkout.
///
/// `commission` is the platform's cut and is not part of what the customer
/// pays: `total` is always `subtotal + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub commission: Money,
    pub tax: Money,
    pub total: Money,
}

/// Computes totals with a per-line commission rate.
///
/// The subtotal is exact; commission and tax are rounded to cents once, on
/// the summed amount, so per-line rounding never accumulates.
pub fn compute_totals<F>(lines: &[CartLine], tax_rate: Rate, mut rate_for: F) -> Result<OrderTotals>
where
    F: FnMut(&CartLine) -> Rate,
{
    let mut subtotal = Money::ZERO;
    let mut commission = Money::ZERO;

    for line in lines {
        let price = line.product.price.ok_or_else(|| OrderError::InvalidPrice {
            product_id: line.product_id.clone(),
            product_name: line.product.name.clone(),
        })?;
        let amount = price.times(line.units());
        subtotal += amount;
        commission += amount.apply(rate_for(line));
    }

    let commission = commission.round_cents();
    let tax = subtotal.apply(tax_rate).round_cents();

    Ok(OrderTotals {
        subtotal,
        commission,
        tax,
        total: subtotal + tax,
    })
}

/// Totals under a single commission rate for every line.
pub fn compute_flat_totals(lines: &[CartLine], commission_rate: Rate, tax_rate: Rate) -> Result<OrderTotals> {
    compute_totals(lines, tax_rate, |_| commission_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{Product, ProductStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn line(price: Decimal, quantity: i64, category: &str) -> CartLine {
        let product = Product {
            id: format!("p-{price}"),
            vendor_id: "v1".to_string(),
            name: "Item".to_string(),
            category: category.to_string(),
            price: Money::new(price),
            stock: 1000,
            status: ProductStatus::Active,
            updated_at: Utc::now(),
        };
        CartLine::new(&product, quantity)
    }

    fn rate(value: Decimal) -> Rate {
        Rate::new(value).unwrap()
    }

    #[test]
    fn test_flat_totals() {
        let lines = vec![line(dec!(100), 2, "a")];
        let totals = compute_flat_totals(&lines, rate(dec!(0.10)), rate(dec!(0.08))).unwrap();
        assert_eq!(totals.subtotal, Money::new(dec!(200)));
        assert_eq!(totals.commission, Money::new(dec!(20)));
        assert_eq!(totals.tax, Money::new(dec!(16)));
        assert_eq!(totals.total, Money::new(dec!(216)));
    }

    #[test]
    fn test_cents_rounding() {
        // 3 x 3.33 = 9.99 -> commission 0.999 -> 1.00, tax 0.7992 -> 0.80
        let lines = vec![line(dec!(3.33), 3, "a")];
        let totals = compute_flat_totals(&lines, rate(dec!(0.10)), rate(dec!(0.08))).unwrap();
        assert_eq!(totals.subtotal, Money::new(dec!(9.99)));
        assert_eq!(totals.commission, Money::new(dec!(1.00)));
        assert_eq!(totals.tax, Money::new(dec!(0.80)));
        assert_eq!(totals.total, Money::new(dec!(10.79)));
    }

    #[test]
    fn test_commission_not_deducted_from_total() {
        let lines = vec![line(dec!(50), 1, "a")];
        let totals = compute_flat_totals(&lines, rate(dec!(0.10)), Rate::ZERO).unwrap();
        assert_eq!(totals.total, totals.subtotal);
        assert_eq!(totals.commission, Money::new(dec!(5)));
    }

    #[test]
    fn test_per_category_rates() {
        let lines = vec![line(dec!(100), 1, "fuel"), line(dec!(100), 1, "spares")];
        let totals = compute_totals(&lines, Rate::ZERO, |l| {
            if l.product.category == "fuel" {
                rate(dec!(0.03))
            } else {
                rate(dec!(0.10))
            }
        })
        .unwrap();
        assert_eq!(totals.commission, Money::new(dec!(13)));
    }

    #[test]
    fn test_deterministic() {
        let lines = vec![line(dec!(19.99), 7, "a"), line(dec!(0.05), 3, "b")];
        let first = compute_flat_totals(&lines, rate(dec!(0.10)), rate(dec!(0.08))).unwrap();
        let second = compute_flat_totals(&lines, rate(dec!(0.10)), rate(dec!(0.08))).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total.to_string(), second.total.to_string());
    }

    #[test]
    fn test_missing_price() {
        let mut l = line(dec!(1), 1, "a");
        l.product.price = None;
        assert!(matches!(
            compute_flat_totals(&[l], Rate::ZERO, Rate::ZERO),
            Err(OrderError::InvalidPrice { .. })
        ));
    }
}
