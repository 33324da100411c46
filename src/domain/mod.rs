//! Marketplace domain: products, carts, orders, and the pure rules that
//! govern them. Nothing in here performs I/O except through [`ports`].

pub mod cart;
pub mod commission;
pub mod money;
pub mod order;
pub mod ports;
pub mod product;
pub mod totals;
pub mod vendor;
