use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;

use product_catalog::catalog::{ProductsFacade, RemoteProducts, StockStatus};
use product_catalog::config::load_config;
use product_catalog::resilience::BreakerRegistry;
use product_catalog::ProductInput;

#[derive(Parser)]
#[command(name = "catalog-cli")]
#[command(about = "Talk to the Products API through the catalog facade", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "catalog.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every product
    List,
    /// Show one product
    Get { id: i64 },
    /// Create a product
    Create(CreateArgs),
    /// Delete a product
    Delete { id: i64 },
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    price: Decimal,
    #[arg(long, default_value_t = 0)]
    stock_level: u32,
    #[arg(long, default_value = "In Stock")]
    stock_status: String,
    #[arg(long, default_value_t = 0)]
    category_id: i64,
}

impl CreateArgs {
    fn into_input(self, now: DateTime<Utc>) -> ProductInput {
        ProductInput {
            name: self.name,
            description: self.description,
            price: self.price,
            stock_status: StockStatus::from(self.stock_status.as_str()),
            stock_level: self.stock_level,
            last_updated: now,
            category_id: self.category_id,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let breakers = BreakerRegistry::new(config.circuit_breaker.clone());
    let products = RemoteProducts::from_config(&config, &breakers)?;

    match cli.command {
        Commands::List => {
            let all = products.list_products().await?;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        Commands::Get { id } => {
            let product = products.get_product(id).await?;
            println!("{}", serde_json::to_string_pretty(&product)?);
        }
        Commands::Create(args) => {
            let created = products.create_product(args.into_input(Utc::now())).await?;
            println!("{}", serde_json::to_string_pretty(&created)?);
        }
        Commands::Delete { id } => {
            if products.delete_product(id).await? {
                println!("Product {} deleted", id);
            } else {
                eprintln!("Error: product {} was not deleted", id);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
