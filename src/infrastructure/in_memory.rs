use super::changes::{ChangeSet, DocKey, PendingWrite, Versioned};
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{
    Catalog, OrderStore, StoreResult, TransactionScope, TransactionalStore, VendorDirectory,
};
use crate::domain::product::Product;
use crate::domain::vendor::VendorStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Documents {
    products: HashMap<String, Versioned<Product>>,
    orders: HashMap<String, Versioned<Order>>,
    vendors: HashMap<String, VendorStatus>,
}

impl Documents {
    fn version(&self, key: &DocKey) -> u64 {
        match key {
            DocKey::Product(id) => self.products.get(id).map_or(0, |v| v.version),
            DocKey::Order(id) => self.orders.get(id).map_or(0, |v| v.version),
        }
    }

    fn apply(&mut self, write: PendingWrite) {
        match write {
            PendingWrite::Product(product) => {
                let previous = self.products.get(&product.id).map(|v| v.version);
                self.products
                    .insert(product.id.clone(), Versioned::next(previous, product));
            }
            PendingWrite::NewOrder(order) | PendingWrite::Order(order) => {
                let previous = self.orders.get(&order.id).map(|v| v.version);
                self.orders
                    .insert(order.id.clone(), Versioned::next(previous, order));
            }
        }
    }

    fn orders_where<F>(&self, predicate: F) -> Vec<Order>
    where
        F: Fn(&Order) -> bool,
    {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .map(|v| &v.doc)
            .filter(|order| predicate(order))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }
}

/// A thread-safe in-memory document store.
///
/// Holds products, orders and vendor accounts behind a single
/// `Arc<RwLock<..>>`. Every document carries a version; transactions record
/// the versions they read and the commit re-checks them under the write lock,
/// which serializes conflicting writers. Cloning shares the same documents.
/// Ideal for testing or single-process deployments.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    docs: Arc<RwLock<Documents>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for InMemoryStore {
    async fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        let docs = self.docs.read().await;
        Ok(docs.products.get(product_id).map(|v| v.doc.clone()))
    }

    async fn put_product(&self, product: Product) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        docs.apply(PendingWrite::Product(product));
        Ok(())
    }
}

#[async_trait]
impl VendorDirectory for InMemoryStore {
    async fn vendor_status(&self, vendor_id: &str) -> StoreResult<Option<VendorStatus>> {
        let docs = self.docs.read().await;
        Ok(docs.vendors.get(vendor_id).copied())
    }

    async fn put_vendor(&self, vendor_id: &str, status: VendorStatus) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        docs.vendors.insert(vendor_id.to_string(), status);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn get_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let docs = self.docs.read().await;
        Ok(docs.orders.get(order_id).map(|v| v.doc.clone()))
    }

    async fn orders_for_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>> {
        let docs = self.docs.read().await;
        Ok(docs.orders_where(|order| order.customer_id == customer_id))
    }

    async fn orders_for_vendor(&self, vendor_id: &str) -> StoreResult<Vec<Order>> {
        let docs = self.docs.read().await;
        Ok(docs.orders_where(|order| order.vendor_id == vendor_id))
    }

    async fn vendor_revenue_since(&self, vendor_id: &str, since: DateTime<Utc>) -> StoreResult<Money> {
        let docs = self.docs.read().await;
        Ok(docs
            .orders
            .values()
            .map(|v| &v.doc)
            .filter(|order| {
                order.vendor_id == vendor_id
                    && order.status != OrderStatus::Cancelled
                    && order.created_at >= since
            })
            .map(|order| order.subtotal)
            .sum())
    }
}

#[async_trait]
impl TransactionalStore for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn TransactionScope>> {
        Ok(Box::new(InMemoryScope {
            docs: Arc::clone(&self.docs),
            changes: ChangeSet::default(),
        }))
    }
}

/// Transaction scope over an [`InMemoryStore`].
pub struct InMemoryScope {
    docs: Arc<RwLock<Documents>>,
    changes: ChangeSet,
}

#[async_trait]
impl TransactionScope for InMemoryScope {
    async fn get_product(&mut self, product_id: &str) -> StoreResult<Option<Product>> {
        let docs = self.docs.read().await;
        let found = docs.products.get(product_id);
        self.changes.record_read(
            DocKey::Product(product_id.to_string()),
            found.map_or(0, |v| v.version),
        );
        Ok(found.map(|v| v.doc.clone()))
    }

    async fn get_order(&mut self, order_id: &str) -> StoreResult<Option<Order>> {
        let docs = self.docs.read().await;
        let found = docs.orders.get(order_id);
        self.changes.record_read(
            DocKey::Order(order_id.to_string()),
            found.map_or(0, |v| v.version),
        );
        Ok(found.map(|v| v.doc.clone()))
    }

    fn update_product(&mut self, product: Product) {
        self.changes.push(PendingWrite::Product(product));
    }

    fn create_order(&mut self, order: Order) {
        self.changes.push(PendingWrite::NewOrder(order));
    }

    fn update_order(&mut self, order: Order) {
        self.changes.push(PendingWrite::Order(order));
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let InMemoryScope { docs, changes } = *self;
        if changes.is_empty() {
            return Ok(());
        }

        let mut docs = docs.write().await;
        changes.check(|key| Ok(docs.version(key)))?;

        let writes = changes.into_writes();
        tracing::debug!(writes = writes.len(), "committing in-memory transaction");
        for write in writes {
            docs.apply(write);
        }
        Ok(())
    }
}
