//! Application layer containing the order workflows.
//!
//! This module defines the `OrderEngine`, the entry point for placing
//! checkouts and changing order status. It coordinates the domain rules with
//! the storage ports and owns the retry policy around transactions.

pub mod engine;
