use crate::domain::ports::{Catalog, VendorDirectory};
use crate::domain::product::Product;
use crate::domain::vendor::Vendor;
use crate::error::InterfaceError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Initial vendors and products, loaded from a JSON document.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogSeed {
    pub vendors: Vec<Vendor>,
    pub products: Vec<Product>,
}

/// How many documents a seed actually wrote.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub vendors: usize,
    pub products: usize,
}

impl CatalogSeed {
    pub fn from_reader<R: Read>(source: R) -> Result<Self, InterfaceError> {
        Ok(serde_json::from_reader(source)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, InterfaceError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Writes the vendors and products that do not exist yet. Existing
    /// documents are left alone so a persistent store keeps its stock levels
    /// across runs.
    pub async fn apply(
        self,
        catalog: &dyn Catalog,
        directory: &dyn VendorDirectory,
    ) -> Result<SeedReport, InterfaceError> {
        let mut report = SeedReport::default();

        for vendor in self.vendors {
            if directory.vendor_status(&vendor.id).await?.is_none() {
                directory.put_vendor(&vendor.id, vendor.status).await?;
                report.vendors += 1;
            }
        }

        for product in self.products {
            if catalog.get_product(&product.id).await?.is_none() {
                catalog.put_product(product).await?;
                report.products += 1;
            }
        }

        tracing::info!(vendors = report.vendors, products = report.products, "catalog seeded");
        Ok(report)
    }
}
