//! Catalog CLI entry point.
//!
//! Imports supplier feed files into the canonical catalog and answers
//! facet queries against it. Every import is transactional; a failed run
//! leaves the catalog exactly as it was.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

use kolben::{
    config::Config,
    logging,
    models::{DiscountState, FacetQuery},
    state::AppState,
};

#[derive(Parser)]
#[command(name = "kolben", version, about = "Auto-parts catalog ingestion and facets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a supplier feed file
    Import {
        #[command(subcommand)]
        feed: ImportFeed,
    },
    /// Compute listing facets for a filter selection
    Facets(FacetsArgs),
    /// Run pending database migrations and exit
    Migrate,
}

#[derive(Subcommand)]
enum ImportFeed {
    /// Product stock feed (UTF-8, comma separated)
    Products { path: std::path::PathBuf },
    /// Category hierarchy feed (UTF-8, comma separated)
    Categories { path: std::path::PathBuf },
    /// Analog cross-reference feed (Windows-1251, semicolon separated)
    Analogs { path: std::path::PathBuf },
}

#[derive(Args)]
struct FacetsArgs {
    /// Category to scope the listing to
    #[arg(long)]
    category_id: Option<Uuid>,
    /// Selected subcategories, repeatable
    #[arg(long = "subcategory-id")]
    subcategory_ids: Vec<Uuid>,
    /// Selected manufacturers, repeatable
    #[arg(long = "manufacturer")]
    manufacturers: Vec<String>,
    /// Discount selection: with-discount or without-discount, repeatable
    #[arg(long = "discount", value_parser = parse_discount)]
    discounts: Vec<DiscountState>,
    #[arg(long)]
    min_price: Option<rust_decimal::Decimal>,
    #[arg(long)]
    max_price: Option<rust_decimal::Decimal>,
    /// Free-text search, active from 4 characters
    #[arg(long)]
    search: Option<String>,
}

fn parse_discount(raw: &str) -> Result<DiscountState, String> {
    match raw {
        "with-discount" => Ok(DiscountState::WithDiscount),
        "without-discount" => Ok(DiscountState::WithoutDiscount),
        other => Err(format!(
            "unknown discount state {other:?}, expected with-discount or without-discount"
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first to get logging settings
    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting kolben");

    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;

    let result = run(&state, cli.command).await;
    state.shutdown().await;
    result
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Import { feed } => {
            let (path, label) = match &feed {
                ImportFeed::Products { path } => (path.clone(), "products"),
                ImportFeed::Categories { path } => (path.clone(), "categories"),
                ImportFeed::Analogs { path } => (path.clone(), "analogs"),
            };
            let buf = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {label} feed from {}", path.display()))?;

            let report = match feed {
                ImportFeed::Products { .. } => state.import_service.import_products(&buf).await,
                ImportFeed::Categories { .. } => state.import_service.import_categories(&buf).await,
                ImportFeed::Analogs { .. } => state.import_service.import_analogs(&buf).await,
            }
            .with_context(|| format!("{label} import failed"))?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Facets(args) => {
            let query = FacetQuery {
                category_id: args.category_id,
                subcategory_ids: args.subcategory_ids,
                manufacturers: args.manufacturers,
                discounts: args.discounts,
                min_price: args.min_price,
                max_price: args.max_price,
                search: args.search,
            };
            let facets = state
                .facet_service
                .facets(&query)
                .await
                .context("Facet computation failed")?;
            println!("{}", serde_json::to_string_pretty(&facets)?);
        }
        Command::Migrate => {
            kolben::db::run_migrations(&state.db_pool)
                .await
                .context("Migration failed")?;
        }
    }
    Ok(())
}
