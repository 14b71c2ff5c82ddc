//! Storefront Scout CLI — entry point.

mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::{info, warn};

use storefront_scout::renderer::chromium::ChromiumRenderer;
use storefront_scout::renderer::{NoopRenderer, Renderer};
use storefront_scout::{
    credential_from_env, enrich, suggest_selector, Acquirer, CatalogSource, CompletionClient,
    ScoutConfig, SearchPageSource,
};

#[derive(Parser, Debug)]
#[command(
    name = "scout",
    about = "Scrape storefront listings (with catalog fallback) and enrich them with AI",
    version,
    after_help = "Set OPENAI_API_KEY to enable AI enrichment."
)]
struct Cli {
    /// Search keyword
    #[arg(long, default_value = "laptops")]
    query: String,

    /// Maximum number of products to fetch
    #[arg(long = "max", default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    max_products: u32,

    /// Skip the browser and read the fallback catalog directly
    #[arg(long)]
    no_browser: bool,

    /// Print only the enriched records as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the model to repair a CSS selector that no longer matches
    SuggestSelector {
        /// The selector that stopped matching
        #[arg(long)]
        selector: String,
        /// File holding an HTML snippet of the page
        #[arg(long)]
        html_file: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    if let Err(e) = run(cli).await {
        if json {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ScoutConfig::from_env();
    let credential = credential_from_env();

    match cli.command {
        None => scrape_and_enrich(&cli, &config, credential.as_deref()).await,
        Some(Commands::SuggestSelector {
            ref selector,
            ref html_file,
        }) => {
            let html = std::fs::read_to_string(html_file)
                .with_context(|| format!("failed to read {}", html_file.display()))?;
            let client = CompletionClient::new(credential.unwrap_or_default(), &config.enrichment);
            let suggestion = suggest_selector(&client, selector, &html).await?;
            if cli.json {
                output::print_json(&serde_json::json!({
                    "broken": selector,
                    "selector": suggestion,
                }));
            } else {
                println!("{suggestion}");
            }
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "scout", &mut std::io::stdout());
            Ok(())
        }
    }
}

async fn scrape_and_enrich(cli: &Cli, config: &ScoutConfig, credential: Option<&str>) -> Result<()> {
    let renderer: Arc<dyn Renderer> = if cli.no_browser {
        Arc::new(NoopRenderer)
    } else {
        match ChromiumRenderer::new().await {
            Ok(renderer) => {
                info!("Chromium renderer initialized");
                Arc::new(renderer)
            }
            Err(e) => {
                warn!("{e:#}; continuing with the fallback catalog only");
                Arc::new(NoopRenderer)
            }
        }
    };

    let acquisition = &config.acquisition;
    let acquirer = Acquirer::new(
        SearchPageSource::new(renderer, acquisition),
        CatalogSource::new(acquisition),
        acquisition.attempts,
    );

    info!("acquiring products for '{}'", cli.query);
    let products = acquirer
        .acquire(&cli.query, cli.max_products as usize)
        .await?;

    if products.is_empty() {
        if cli.json {
            output::print_json(&serde_json::json!([]));
        } else {
            println!("No products found. Exiting.");
        }
        return Ok(());
    }

    if !cli.json {
        output::section("RAW SCRAPED DATA");
        output::print_json(&products);
        output::section("ENHANCING WITH AI...");
    }

    let enriched = enrich(products, credential, &config.enrichment).await;

    if !cli.json {
        output::section("ENHANCED DATA");
    }
    output::print_json(&enriched);
    Ok(())
}
