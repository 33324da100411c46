#![allow(dead_code)]

use chrono::Utc;
use marketplace_orders::application::engine::OrderEngine;
use marketplace_orders::config::EngineConfig;
use marketplace_orders::domain::money::Money;
use marketplace_orders::domain::ports::{Catalog, VendorDirectory};
use marketplace_orders::domain::product::{Product, ProductStatus};
use marketplace_orders::domain::vendor::VendorStatus;
use marketplace_orders::infrastructure::in_memory::InMemoryStore;
use rust_decimal::Decimal;

pub fn product(id: &str, vendor: &str, price: Decimal, stock: u32) -> Product {
    Product {
        id: id.to_string(),
        vendor_id: vendor.to_string(),
        name: format!("Product {id}"),
        category: "general".to_string(),
        price: Money::new(price),
        stock,
        status: ProductStatus::Active,
        updated_at: Utc::now(),
    }
}

/// A store holding `products`, with every vendor they mention active.
pub async fn seeded_store(products: &[Product]) -> InMemoryStore {
    let store = InMemoryStore::new();
    for p in products {
        store.put_vendor(&p.vendor_id, VendorStatus::Active).await.unwrap();
        store.put_product(p.clone()).await.unwrap();
    }
    store
}

pub fn engine(store: &InMemoryStore) -> OrderEngine {
    engine_with(store, EngineConfig::default())
}

pub fn engine_with(store: &InMemoryStore, config: EngineConfig) -> OrderEngine {
    OrderEngine::with_config(
        Box::new(store.clone()),
        Box::new(store.clone()),
        Box::new(store.clone()),
        config,
    )
}

pub async fn stock_of(store: &InMemoryStore, product_id: &str) -> u32 {
    store.get_product(product_id).await.unwrap().unwrap().stock
}
