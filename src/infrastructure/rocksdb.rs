use super::changes::{ChangeSet, DocKey, PendingWrite, Versioned};
use crate::domain::money::Money;
use crate::domain::order::{Order, OrderStatus};
use crate::domain::ports::{
    Catalog, OrderStore, StoreResult, TransactionScope, TransactionalStore, VendorDirectory,
};
use crate::domain::product::Product;
use crate::domain::vendor::VendorStatus;
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for product documents.
pub const CF_PRODUCTS: &str = "products";
/// Column Family for order documents.
pub const CF_ORDERS: &str = "orders";
/// Column Family for vendor account status.
pub const CF_VENDORS: &str = "vendors";

/// A persistent store implementation using RocksDB.
///
/// Products, orders and vendors live in separate Column Families. Documents
/// are stored as JSON together with their version. Transactions validate the
/// versions they read and apply their writes as one `WriteBatch` while holding
/// the commit lock, so a commit is atomic and conflicting commits serialize.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let families = [CF_PRODUCTS, CF_ORDERS, CF_VENDORS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, families)?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{name} column family not found"),
            ))
        })
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> StoreResult<Option<Versioned<T>>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> StoreResult<Vec<Versioned<T>>> {
        let cf = self.cf(cf_name)?;
        let mut docs = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            docs.push(serde_json::from_slice(&value)?);
        }
        Ok(docs)
    }

    fn version(&self, key: &DocKey) -> StoreResult<u64> {
        let version = match key {
            DocKey::Product(id) => self.read::<Product>(CF_PRODUCTS, id)?.map(|v| v.version),
            DocKey::Order(id) => self.read::<Order>(CF_ORDERS, id)?.map(|v| v.version),
        };
        Ok(version.unwrap_or(0))
    }

    fn stage<T: Serialize>(&self, batch: &mut WriteBatch, key: DocKey, doc: T) -> StoreResult<()> {
        let previous = self.version(&key)?;
        let (cf_name, id) = match &key {
            DocKey::Product(id) => (CF_PRODUCTS, id),
            DocKey::Order(id) => (CF_ORDERS, id),
        };
        let value = serde_json::to_vec(&Versioned::next(Some(previous), doc))?;
        batch.put_cf(self.cf(cf_name)?, id.as_bytes(), value);
        Ok(())
    }

    fn write_all(&self, writes: Vec<PendingWrite>) -> StoreResult<()> {
        let mut batch = WriteBatch::default();
        for write in writes {
            let key = write.key();
            match write {
                PendingWrite::Product(product) => self.stage(&mut batch, key, product)?,
                PendingWrite::NewOrder(order) | PendingWrite::Order(order) => {
                    self.stage(&mut batch, key, order)?
                }
            }
        }
        self.db.write(batch)?;
        Ok(())
    }

    fn orders_where<F>(&self, predicate: F) -> StoreResult<Vec<Order>>
    where
        F: Fn(&Order) -> bool,
    {
        let mut orders: Vec<Order> = self
            .scan::<Order>(CF_ORDERS)?
            .into_iter()
            .map(|v| v.doc)
            .filter(|order| predicate(order))
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

#[async_trait]
impl Catalog for RocksDBStore {
    async fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        Ok(self.read::<Product>(CF_PRODUCTS, product_id)?.map(|v| v.doc))
    }

    async fn put_product(&self, product: Product) -> StoreResult<()> {
        let _guard = self.commit_lock.lock().await;
        self.write_all(vec![PendingWrite::Product(product)])
    }
}

#[async_trait]
impl VendorDirectory for RocksDBStore {
    async fn vendor_status(&self, vendor_id: &str) -> StoreResult<Option<VendorStatus>> {
        let cf = self.cf(CF_VENDORS)?;
        match self.db.get_cf(cf, vendor_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put_vendor(&self, vendor_id: &str, status: VendorStatus) -> StoreResult<()> {
        let cf = self.cf(CF_VENDORS)?;
        self.db
            .put_cf(cf, vendor_id.as_bytes(), serde_json::to_vec(&status)?)?;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn get_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
        Ok(self.read::<Order>(CF_ORDERS, order_id)?.map(|v| v.doc))
    }

    async fn orders_for_customer(&self, customer_id: &str) -> StoreResult<Vec<Order>> {
        self.orders_where(|order| order.customer_id == customer_id)
    }

    async fn orders_for_vendor(&self, vendor_id: &str) -> StoreResult<Vec<Order>> {
        self.orders_where(|order| order.vendor_id == vendor_id)
    }

    async fn vendor_revenue_since(&self, vendor_id: &str, since: DateTime<Utc>) -> StoreResult<Money> {
        Ok(self
            .orders_where(|order| {
                order.vendor_id == vendor_id
                    && order.status != OrderStatus::Cancelled
                    && order.created_at >= since
            })?
            .into_iter()
            .map(|order| order.subtotal)
            .sum())
    }
}

#[async_trait]
impl TransactionalStore for RocksDBStore {
    async fn begin(&self) -> StoreResult<Box<dyn TransactionScope>> {
        Ok(Box::new(RocksDBScope {
            store: self.clone(),
            changes: ChangeSet::default(),
        }))
    }
}

/// Transaction scope over a [`RocksDBStore`].
pub struct RocksDBScope {
    store: RocksDBStore,
    changes: ChangeSet,
}

#[async_trait]
impl TransactionScope for RocksDBScope {
    async fn get_product(&mut self, product_id: &str) -> StoreResult<Option<Product>> {
        let found = self.store.read::<Product>(CF_PRODUCTS, product_id)?;
        self.changes.record_read(
            DocKey::Product(product_id.to_string()),
            found.as_ref().map_or(0, |v| v.version),
        );
        Ok(found.map(|v| v.doc))
    }

    async fn get_order(&mut self, order_id: &str) -> StoreResult<Option<Order>> {
        let found = self.store.read::<Order>(CF_ORDERS, order_id)?;
        self.changes.record_read(
            DocKey::Order(order_id.to_string()),
            found.as_ref().map_or(0, |v| v.version),
        );
        Ok(found.map(|v| v.doc))
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
        let RocksDBScope { store, changes } = *self;
        if changes.is_empty() {
            return Ok(());
        }

        let _guard = store.commit_lock.lock().await;
        changes.check(|key| store.version(key))?;
        tracing::debug!("committing RocksDB transaction");
        store.write_all(changes.into_writes())
    }
}
