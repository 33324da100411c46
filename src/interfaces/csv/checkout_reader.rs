use crate::domain::order::{Customer, PaymentMethod};
use crate::error::InterfaceError;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;

/// One line of a checkout file.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct CheckoutRow {
    pub checkout: String,
    pub customer: String,
    pub customer_name: String,
    pub product: String,
    pub quantity: i64,
    pub payment: PaymentMethod,
}

/// All rows sharing a checkout id, i.e. one customer's cart.
#[derive(Debug, PartialEq, Clone)]
pub struct CheckoutRequest {
    pub checkout_id: String,
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    /// `(product_id, quantity)` in file order.
    pub items: Vec<(String, i64)>,
}

impl CheckoutRequest {
    /// Groups rows by checkout id, keeping the order in which ids first
    /// appear. Customer and payment method come from the first row of each
    /// checkout.
    pub fn group(rows: impl IntoIterator<Item = CheckoutRow>) -> Vec<CheckoutRequest> {
        let mut requests: Vec<CheckoutRequest> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for row in rows {
            match index.get(&row.checkout) {
                Some(&i) => requests[i].items.push((row.product, row.quantity)),
                None => {
                    index.insert(row.checkout.clone(), requests.len());
                    requests.push(CheckoutRequest {
                        checkout_id: row.checkout,
                        customer: Customer::new(row.customer, row.customer_name),
                        payment_method: row.payment,
                        items: vec![(row.product, row.quantity)],
                    });
                }
            }
        }

        requests
    }
}

/// Reads checkout rows from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<CheckoutRow>`. It trims whitespace and tolerates ragged records.
pub struct CheckoutReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CheckoutReader<R> {
    /// Creates a new `CheckoutReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes rows.
    pub fn rows(self) -> impl Iterator<Item = Result<CheckoutRow, InterfaceError>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(InterfaceError::from))
    }
}
