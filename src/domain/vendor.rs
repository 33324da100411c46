use serde::{Deserialize, Serialize};

/// Account state of a vendor. Only `Active` vendors can receive orders.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    Active,
    Suspended,
    Pending,
}

/// A vendor entry as seeded into the directory.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Vendor {
    pub id: String,
    pub status: VendorStatus,
}
