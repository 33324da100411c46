use crate::domain::order::OrderStatus;
use crate::domain::vendor::VendorStatus;
use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T, E = OrderError> = std::result::Result<T, E>;

/// Coarse classification of an [`OrderError`], used by callers to decide
/// whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The cart itself is malformed. Fixable by the caller, retrying is useless.
    Validation,
    /// A vendor or product cannot serve the cart right now. Refresh and retry.
    Availability,
    /// The store kept rejecting the transaction. Safe to retry.
    Concurrency,
    Authorization,
    NotFound,
    Internal,
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Your cart is empty. Please add items before checking out.")]
    EmptyCart,
    #[error("Invalid quantity {quantity} for {product_name}: must be between 1 and {max}")]
    InvalidQuantity {
        product_id: String,
        product_name: String,
        quantity: i64,
        max: u32,
    },
    #[error("Invalid price for {product_name}")]
    InvalidPrice {
        product_id: String,
        product_name: String,
    },
    #[error("Only {available} units available for {product_name}")]
    InsufficientStock {
        product_id: String,
        product_name: String,
        available: u32,
    },
    #[error("Maximum {max} total items allowed per order, cart holds {total}")]
    CartTooLarge { total: i64, max: u64 },
    #[error("Vendor {vendor_id} is currently unavailable")]
    VendorUnavailable {
        vendor_id: String,
        status: Option<VendorStatus>,
    },
    #[error("Product {product_name} is no longer available")]
    ProductGone {
        product_id: String,
        product_name: String,
    },
    #[error("Product {product_name} is currently unavailable")]
    ProductUnavailable {
        product_id: String,
        product_name: String,
    },
    #[error("Price of {product_name} changed to {current}")]
    PriceChanged {
        product_id: String,
        product_name: String,
        current: Decimal,
    },
    #[error("Product {product_name} has changed, please refresh your cart")]
    ProductChanged {
        product_id: String,
        product_name: String,
    },
    #[error("Order could not be committed after {attempts} attempts")]
    ConcurrentModification { attempts: u32 },
    #[error("Order {order_id} not found")]
    OrderNotFound { order_id: String },
    #[error("Unauthorized: {actor_id} can only update their own orders")]
    Unauthorized { order_id: String, actor_id: String },
    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::EmptyCart
            | OrderError::InvalidQuantity { .. }
            | OrderError::InvalidPrice { .. }
            | OrderError::CartTooLarge { .. }
            | OrderError::InvalidTransition { .. } => ErrorKind::Validation,
            OrderError::InsufficientStock { .. }
            | OrderError::VendorUnavailable { .. }
            | OrderError::ProductGone { .. }
            | OrderError::ProductUnavailable { .. }
            | OrderError::PriceChanged { .. }
            | OrderError::ProductChanged { .. } => ErrorKind::Availability,
            OrderError::ConcurrentModification { .. } => ErrorKind::Concurrency,
            OrderError::Unauthorized { .. } => ErrorKind::Authorization,
            OrderError::OrderNotFound { .. } => ErrorKind::NotFound,
            OrderError::Storage(StorageError::Conflict) => ErrorKind::Concurrency,
            OrderError::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Whether the whole call can be retried as-is.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Concurrency
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    /// A document read inside the transaction changed before commit.
    #[error("Transaction conflict")]
    Conflict,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid rate {0}: must be between 0 and 1")]
    InvalidRate(Decimal),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the file-based interfaces (CSV input/output, JSON seeds).
#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
