use super::order::Order;
use super::product::Product;
use super::vendor::VendorStatus;
use super::money::Money;
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type StoreResult<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait Catalog: Send + Sync {
    async fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>>;
    async fn put_product(&self, product: Product) -> StoreResult<()>;
}

#[async_trait]
pub trait VendorDirectory: Send + Sync {
    /// `None` when the vendor is unknown.
    async fn vendor_status(&self, vendor_id: &str) -> StoreResult<Option<VendorStatus>>;
    async fn put_vendor(&self, vendor_id: &str, status: VendorStatus) -> StoreResult<()>;
}

/// Read side of the order collection.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn get_order(&self, order_id: &str) -> StoreResult<Option<Order>>;
    async fn orders_for_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>>;
    async fn orders_for_vendor(&self, vendor_id: &str) -> StoreResult<Vec<Order>>;
    /// Sum of subtotals of the vendor's non-cancelled orders created at or
    /// after `since`.
    async fn vendor_revenue_since(&self, vendor_id: &str, since: DateTime<Utc>) -> StoreResult<Money>;
}

/// A store able to run optimistic multi-document transactions.
#[async_trait]
pub trait TransactionalStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn TransactionScope>>;
}

/// A read-validate-write unit.
///
/// Reads go to the store and are remembered with the version seen. Writes are
/// buffered until [`TransactionScope::commit`], which applies all of them or
/// none: if any document read through this scope changed in the meantime the
/// commit fails with [`StorageError::Conflict`]. Dropping a scope without
/// committing discards every buffered write.
#[async_trait]
pub trait TransactionScope: Send {
    async fn get_product(&mut self, product_id: &str) -> StoreResult<Option<Product>>;
    async fn get_order(&mut self, order_id: &str) -> StoreResult<Option<Order>>;
    fn update_product(&mut self, product: Product);
    fn create_order(&mut self, order: Order);
    fn update_order(&mut self, order: Order);
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

pub type CatalogBox = Box<dyn Catalog>;
pub type VendorDirectoryBox = Box<dyn VendorDirectory>;
pub type OrderStoreBox = Box<dyn OrderStore>;
pub type TransactionalStoreBox = Box<dyn TransactionalStore>;
