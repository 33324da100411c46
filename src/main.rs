use clap::Parser;
use marketplace_orders::application::engine::OrderEngine;
use marketplace_orders::config::EngineConfig;
use marketplace_orders::domain::cart::CartLine;
use marketplace_orders::domain::ports::{
    Catalog, CatalogBox, OrderStore, TransactionalStore, VendorDirectory, VendorDirectoryBox,
};
use marketplace_orders::infrastructure::in_memory::InMemoryStore;
#[cfg(feature = "storage-rocksdb")]
use marketplace_orders::infrastructure::rocksdb::RocksDBStore;
use marketplace_orders::interfaces::csv::checkout_reader::{CheckoutReader, CheckoutRequest};
use marketplace_orders::interfaces::csv::order_writer::OrderWriter;
use marketplace_orders::interfaces::json::catalog_seed::CatalogSeed;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input checkouts CSV file
    input: PathBuf,

    /// JSON file with vendors and products to seed before processing.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON engine configuration (tax rate, commission, retry limits).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Handles the CLI needs besides the engine itself.
struct Backend {
    catalog: CatalogBox,
    directory: VendorDirectoryBox,
    engine: OrderEngine,
}

impl Backend {
    fn from_store<S>(store: S, config: EngineConfig) -> Self
    where
        S: Catalog + VendorDirectory + OrderStore + TransactionalStore + Clone + 'static,
    {
        let engine = OrderEngine::with_config(
            Box::new(store.clone()),
            Box::new(store.clone()),
            Box::new(store.clone()),
            config,
        );
        Self {
            catalog: Box::new(store.clone()),
            directory: Box::new(store),
            engine,
        }
    }

    fn open(db_path: Option<PathBuf>, config: EngineConfig) -> Result<Self> {
        match db_path {
            #[cfg(feature = "storage-rocksdb")]
            Some(path) => {
                let store = RocksDBStore::open(path).into_diagnostic()?;
                Ok(Self::from_store(store, config))
            }
            #[cfg(not(feature = "storage-rocksdb"))]
            Some(_) => Err(miette::miette!(
                "--db-path requires building with the storage-rocksdb feature"
            )),
            None => Ok(Self::from_store(InMemoryStore::new(), config)),
        }
    }

    /// Resolves `(product_id, quantity)` pairs into cart lines carrying the
    /// current catalog snapshot.
    async fn cart_lines(&self, request: &CheckoutRequest) -> Result<Option<Vec<CartLine>>> {
        let mut lines = Vec::with_capacity(request.items.len());
        for (product_id, quantity) in &request.items {
            match self.catalog.get_product(product_id).await.into_diagnostic()? {
                Some(product) => lines.push(CartLine::new(&product, *quantity)),
                None => {
                    eprintln!(
                        "Error processing checkout {}: Product {} not found",
                        request.checkout_id, product_id
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(lines))
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path).into_diagnostic()?,
        None => EngineConfig::default(),
    };
    let backend = Backend::open(cli.db_path, config)?;

    if let Some(path) = &cli.catalog {
        CatalogSeed::from_path(path)
            .into_diagnostic()?
            .apply(&*backend.catalog, &*backend.directory)
            .await
            .into_diagnostic()?;
    }

    // Read checkouts
    let file = File::open(&cli.input).into_diagnostic()?;
    let mut rows = Vec::new();
    for row_result in CheckoutReader::new(file).rows() {
        match row_result {
            Ok(row) => rows.push(row),
            Err(e) => eprintln!("Error reading checkout line: {}", e),
        }
    }

    let stdout = io::stdout();
    let mut writer = OrderWriter::new(stdout.lock()).into_diagnostic()?;

    for request in CheckoutRequest::group(rows) {
        let Some(lines) = backend.cart_lines(&request).await? else {
            continue;
        };

        let placed = match backend
            .engine
            .place_order(&request.customer, &lines, request.payment_method)
            .await
        {
            Ok(placed) => placed,
            Err(e) => {
                eprintln!("Error processing checkout {}: {}", request.checkout_id, e);
                continue;
            }
        };

        for order_id in &placed.order_ids {
            let order = backend.engine.order(order_id).await.into_diagnostic()?;
            writer
                .write_order(&request.checkout_id, &order)
                .into_diagnostic()?;
        }
    }

    writer.flush().into_diagnostic()?;
    Ok(())
}
