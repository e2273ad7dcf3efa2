use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hopper::app::{link_service, open_storage};
use hopper::config::Config;

#[derive(Parser)]
#[command(name = "hopper-admin")]
#[command(about = "Hopper link management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shorten a URL and print the new short id
    Shorten {
        /// Absolute URL to shorten
        url: String,
    },
    /// Print a short id's mapping and visit counts as JSON
    Info {
        /// Short id
        short_id: String,
    },
    /// List stored mappings in creation order
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = open_storage(&config.database).await?;
    let service = link_service(&config, storage);

    match cli.command {
        Commands::Shorten { url } => {
            let mapping = service
                .shorten(&url)
                .await
                .with_context(|| format!("failed to shorten {url}"))?;
            println!("{}", mapping.short_id);
        }
        Commands::Info { short_id } => match service.stats(&short_id).await? {
            Some(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
            None => {
                eprintln!("Short id '{}' not found", short_id);
                std::process::exit(1);
            }
        },
        Commands::List { limit, offset } => {
            let mappings = service.storage().list_mappings(limit, offset).await?;
            if mappings.is_empty() {
                println!("No mappings found");
            }
            for mapping in mappings {
                println!("{}\t{}", mapping.short_id, mapping.long_url);
            }
        }
    }

    Ok(())
}
