use crate::domain::order::Order;
use crate::error::InterfaceError;
use serde::Serialize;
use std::io::Write;

pub const HEADER: [&str; 9] = [
    "checkout",
    "vendor",
    "status",
    "items",
    "subtotal",
    "tax",
    "total",
    "commission",
    "order",
];

#[derive(Serialize)]
struct OrderRecord<'a> {
    checkout: &'a str,
    vendor: &'a str,
    status: &'static str,
    items: u32,
    subtotal: String,
    tax: String,
    total: String,
    commission: String,
    order: &'a str,
}

/// Writes created orders as CSV, amounts with two decimals.
pub struct OrderWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> OrderWriter<W> {
    /// Creates the writer and emits the header row straight away, so an
    /// empty run still produces a well-formed file.
    pub fn new(sink: W) -> Result<Self, InterfaceError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        writer.write_record(HEADER)?;
        Ok(Self { writer })
    }

    pub fn write_order(&mut self, checkout_id: &str, order: &Order) -> Result<(), InterfaceError> {
        self.writer.serialize(OrderRecord {
            checkout: checkout_id,
            vendor: &order.vendor_id,
            status: order.status.as_str(),
            items: order.item_count(),
            subtotal: order.subtotal.to_string(),
            tax: order.tax.to_string(),
            total: order.total.to_string(),
            commission: order.commission.to_string(),
            order: &order.id,
        })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), InterfaceError> {
        self.writer.flush()?;
        Ok(())
    }
}
