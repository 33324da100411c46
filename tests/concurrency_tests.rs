mod common;

use common::{engine, product, seeded_store, stock_of};
use marketplace_orders::application::engine::PartyRole;
use marketplace_orders::domain::cart::CartLine;
use marketplace_orders::domain::order::{Customer, PaymentMethod};
use marketplace_orders::error::OrderError;
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_buyers_for_the_last_unit() {
    let p1 = product("P1", "V1", dec!(20), 1);
    let store = seeded_store(&[p1.clone()]).await;
    let engine = Arc::new(engine(&store));

    let handles: Vec<_> = ["alice", "bob"]
        .into_iter()
        .map(|buyer| {
            let engine = Arc::clone(&engine);
            let lines = vec![CartLine::new(&p1, 1)];
            tokio::spawn(async move {
                engine
                    .place_order(&Customer::new(buyer, buyer), &lines, PaymentMethod::Online)
                    .await
            })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.into_iter().find_map(Result::err).unwrap();
    assert!(
        matches!(loser, OrderError::InsufficientStock { available: 0, .. }),
        "unexpected error: {loser:?}"
    );
    assert_eq!(stock_of(&store, "P1").await, 0);
    assert_eq!(engine.orders_for("V1", PartyRole::Vendor).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_ten_buyers_never_oversell() {
    let p1 = product("P1", "V1", dec!(20), 3);
    let store = seeded_store(&[p1.clone()]).await;
    let engine = Arc::new(engine(&store));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let lines = vec![CartLine::new(&p1, 1)];
            tokio::spawn(async move {
                let buyer = Customer::new(format!("c{i}"), format!("Buyer {i}"));
                engine
                    .place_order(&buyer, &lines, PaymentMethod::Online)
                    .await
            })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(OrderError::InsufficientStock { .. } | OrderError::ConcurrentModification { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(placed, 3);
    assert_eq!(stock_of(&store, "P1").await, 0);
    assert_eq!(engine.orders_for("V1", PartyRole::Vendor).await.unwrap().len(), 3);
}
