use crate::config::EngineConfig;
use crate::domain::cart::{self, CartLine};
use crate::domain::commission::CommissionPolicyBox;
use crate::domain::money::Money;
use crate::domain::order::{Customer, Order, OrderStatus, PaymentMethod};
use crate::domain::ports::{OrderStoreBox, TransactionScope, TransactionalStoreBox, VendorDirectoryBox};
use crate::domain::product::Product;
use crate::domain::totals;
use crate::domain::vendor::VendorStatus;
use crate::error::{OrderError, Result, StorageError};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use uuid::Uuid;

/// Ids of the orders created by one checkout, one per vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrders {
    pub order_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyRole {
    Customer,
    Vendor,
}

/// Everything a checkout attempt needs, computed once before the transaction.
struct Checkout<'a> {
    customer: &'a Customer,
    lines: &'a [CartLine],
    partitions: &'a BTreeMap<String, Vec<CartLine>>,
    payment_method: PaymentMethod,
    revenue: &'a HashMap<String, Money>,
}

/// Places multi-vendor checkouts and drives order status changes.
///
/// `OrderEngine` owns handles to the storage backends; nothing is reached
/// through globals. A checkout either creates every vendor's order and
/// decrements every product's stock, or leaves the store untouched.
pub struct OrderEngine {
    store: TransactionalStoreBox,
    orders: OrderStoreBox,
    vendors: VendorDirectoryBox,
    commission: CommissionPolicyBox,
    config: EngineConfig,
}

impl OrderEngine {
    /// Creates a new `OrderEngine` with the default configuration.
    ///
    /// # Arguments
    ///
    /// * `store` - Transactional access to products and orders.
    /// * `orders` - Read access to orders, for queries and revenue figures.
    /// * `vendors` - The vendor account directory.
    pub fn new(store: TransactionalStoreBox, orders: OrderStoreBox, vendors: VendorDirectoryBox) -> Self {
        Self::with_config(store, orders, vendors, EngineConfig::default())
    }

    pub fn with_config(
        store: TransactionalStoreBox,
        orders: OrderStoreBox,
        vendors: VendorDirectoryBox,
        config: EngineConfig,
    ) -> Self {
        let commission = config.commission.clone().into_policy();
        Self {
            store,
            orders,
            vendors,
            commission,
            config,
        }
    }

    /// Replaces the commission policy built from the configuration.
    pub fn with_commission_policy(mut self, policy: CommissionPolicyBox) -> Self {
        self.commission = policy;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Turns a cart into one order per vendor and reserves the stock.
    ///
    /// Validation and vendor checks fail before anything is written. The
    /// stock check and all writes run in a single transaction that is
    /// retried on conflict or timeout, up to `max_attempts` times.
    #[tracing::instrument(
        skip(self, customer, lines),
        fields(customer = %customer.id, lines = lines.len())
    )]
    pub async fn place_order(
        &self,
        customer: &Customer,
        lines: &[CartLine],
        payment_method: PaymentMethod,
    ) -> Result<PlacedOrders> {
        cart::validate_with(lines, &self.config.limits)?;

        let partitions = cart::partition(lines);
        self.ensure_vendors_active(&partitions).await?;
        let revenue = self.month_to_date_revenue(&partitions).await?;

        let checkout = Checkout {
            customer,
            lines,
            partitions: &partitions,
            payment_method,
            revenue: &revenue,
        };
        let order_ids = self
            .with_retries("checkout", || self.commit_checkout(&checkout))
            .await?;

        tracing::info!(orders = order_ids.len(), "checkout committed");
        Ok(PlacedOrders { order_ids })
    }

    /// Moves an order along its lifecycle on behalf of `actor_id`, who must
    /// be the order's customer or vendor.
    #[tracing::instrument(skip(self))]
    pub async fn update_order_status(
        &self,
        order_id: &str,
        new_status: OrderStatus,
        actor_id: &str,
    ) -> Result<()> {
        self.with_retries("status update", || {
            self.commit_status(order_id, new_status, actor_id)
        })
        .await?;
        tracing::info!("order status updated");
        Ok(())
    }

    pub async fn order(&self, order_id: &str) -> Result<Order> {
        self.orders
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound {
                order_id: order_id.to_string(),
            })
    }

    /// Orders of a customer or vendor, newest first.
    pub async fn orders_for(&self, party_id: &str, role: PartyRole) -> Result<Vec<Order>> {
        let orders = match role {
            PartyRole::Customer => self.orders.orders_for_customer(party_id).await?,
            PartyRole::Vendor => self.orders.orders_for_vendor(party_id).await?,
        };
        Ok(orders)
    }

    async fn ensure_vendors_active(&self, partitions: &BTreeMap<String, Vec<CartLine>>) -> Result<()> {
        for vendor_id in partitions.keys() {
            let status = self.vendors.vendor_status(vendor_id).await?;
            if status != Some(VendorStatus::Active) {
                tracing::warn!(vendor = %vendor_id, ?status, "vendor unavailable");
                return Err(OrderError::VendorUnavailable {
                    vendor_id: vendor_id.clone(),
                    status,
                });
            }
        }
        Ok(())
    }

    async fn month_to_date_revenue(
        &self,
        partitions: &BTreeMap<String, Vec<CartLine>>,
    ) -> Result<HashMap<String, Money>> {
        let since = month_start(Utc::now());
        let mut revenue = HashMap::with_capacity(partitions.len());
        for vendor_id in partitions.keys() {
            let amount = self.orders.vendor_revenue_since(vendor_id, since).await?;
            revenue.insert(vendor_id.clone(), amount);
        }
        Ok(revenue)
    }

    /// One attempt of the checkout transaction.
    async fn commit_checkout(&self, checkout: &Checkout<'_>) -> Result<Vec<String>> {
        let mut scope = self.store.begin().await?;
        let reserved = reserve_stock(&mut *scope, checkout.lines).await?;

        let now = Utc::now();
        let mut order_ids = Vec::with_capacity(checkout.partitions.len());
        for (vendor_id, lines) in checkout.partitions {
            let revenue = checkout.revenue.get(vendor_id).copied().unwrap_or_default();
            let totals = totals::compute_totals(lines, self.config.tax_rate, |line| {
                let amount = line.product.price.unwrap_or_default().times(line.units());
                self.commission.rate(vendor_id, &line.product.category, amount, revenue)
            })?;

            let order = Order::new(
                Uuid::new_v4().to_string(),
                checkout.customer,
                vendor_id,
                lines,
                checkout.payment_method,
                totals,
                now,
            );
            tracing::debug!(order = %order.id, vendor = %vendor_id, total = %order.total, "staging order");
            order_ids.push(order.id.clone());
            scope.create_order(order);
        }

        for (mut product, quantity) in reserved {
            if product.take_stock(quantity, now).is_none() {
                return Err(OrderError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name,
                    available: product.stock,
                });
            }
            scope.update_product(product);
        }

        scope.commit().await?;
        Ok(order_ids)
    }

    /// One attempt of a status change.
    async fn commit_status(&self, order_id: &str, new_status: OrderStatus, actor_id: &str) -> Result<()> {
        let mut scope = self.store.begin().await?;
        let mut order = scope
            .get_order(order_id)
            .await?
            .ok_or_else(|| OrderError::OrderNotFound {
                order_id: order_id.to_string(),
            })?;

        if !order.involves(actor_id) {
            return Err(OrderError::Unauthorized {
                order_id: order_id.to_string(),
                actor_id: actor_id.to_string(),
            });
        }

        order.transition(new_status, Utc::now())?;
        scope.update_order(order);
        scope.commit().await?;
        Ok(())
    }

    /// Runs `attempt` until it stops conflicting. A timed-out attempt counts
    /// as a conflict.
    async fn with_retries<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timeout = self.config.commit_timeout();
        for n in 1..=self.config.max_attempts {
            match tokio::time::timeout(timeout, attempt()).await {
                Ok(Err(OrderError::Storage(StorageError::Conflict))) => {
                    tracing::warn!(operation, attempt = n, "transaction conflict");
                }
                Ok(result) => return result,
                Err(_) => {
                    tracing::warn!(operation, attempt = n, ?timeout, "transaction timed out");
                }
            }
        }
        Err(OrderError::ConcurrentModification {
            attempts: self.config.max_attempts,
        })
    }
}

/// Re-reads every product in the cart inside `scope` and checks it can serve
/// the cart. Vendor, category and price must still match what the cart line
/// carries, since partitioning and commission were derived from them. Returns each distinct product once, with the total quantity the
/// cart takes from it.
async fn reserve_stock(scope: &mut dyn TransactionScope, lines: &[CartLine]) -> Result<Vec<(Product, u32)>> {
    let mut reserved: Vec<(Product, u32)> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for line in lines {
        let slot = match slots.get(line.product_id.as_str()) {
            Some(&slot) => slot,
            None => {
                let product = scope
                    .get_product(&line.product_id)
                    .await?
                    .ok_or_else(|| OrderError::ProductGone {
                        product_id: line.product_id.clone(),
                        product_name: line.product.name.clone(),
                    })?;
                if !product.is_active() {
                    return Err(OrderError::ProductUnavailable {
                        product_id: product.id,
                        product_name: product.name,
                    });
                }
                reserved.push((product, 0));
                slots.insert(line.product_id.as_str(), reserved.len() - 1);
                reserved.len() - 1
            }
        };

        let (product, quantity) = &mut reserved[slot];
        if line.product.vendor_id != product.vendor_id || line.product.category != product.category {
            tracing::warn!(product = %product.id, vendor = %product.vendor_id, "cart line disagrees with catalog");
            return Err(OrderError::ProductChanged {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
            });
        }
        if line.product.price != Some(product.price) {
            return Err(OrderError::PriceChanged {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                current: product.price.value(),
            });
        }

        *quantity += line.units();
        if product.stock < *quantity {
            tracing::debug!(product = %product.id, stock = product.stock, wanted = *quantity, "insufficient stock");
            return Err(OrderError::InsufficientStock {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                available: product.stock,
            });
        }
    }

    Ok(reserved)
}

/// Midnight UTC on the first day of `now`'s month.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map_or(now, |midnight| midnight.and_utc())
}
