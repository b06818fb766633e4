mod config;

use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    currency::format_price,
    profile::merge_spec_with_profile,
    session::CheckoutSession,
    Cart, CategoryData, CheckoutClient, CheckoutForm, CheckoutTransport, SearchState, ShopClient,
    Simulator,
};
use serde::Deserialize;
use shared::{
    domain::{ChatSessionId, CheckoutOutcome, Product, RETAILER_STEP_COUNT},
    protocol::ShoppingSpec,
};
use tokio::sync::{broadcast, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the shopping assistant")]
struct Args {
    #[arg(long, default_value = "shop.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one message to the shopping agent.
    Chat {
        message: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Search products for a shopping spec stored as JSON.
    Search {
        spec: PathBuf,
        /// Re-run one category after the initial search.
        #[arg(long)]
        refine: Option<String>,
        #[arg(long, requires = "refine")]
        preferences: Option<String>,
    },
    /// Check out the cart lines stored as JSON.
    Checkout { cart: PathBuf },
}

#[derive(Debug, Deserialize)]
struct CartLine {
    product: Product,
    #[serde(default = "one")]
    quantity: u32,
}

fn one() -> u32 {
    1
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let settings = load_settings(&args.config)?;
    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout())
        .build()
        .context("failed to build http client")?;

    match args.command {
        Command::Chat { message, session } => chat(&settings, http, session, &message).await,
        Command::Search {
            spec,
            refine,
            preferences,
        } => {
            search(
                &settings,
                http,
                spec,
                refine.as_deref(),
                preferences.as_deref(),
            )
            .await
        }
        Command::Checkout { cart } => checkout(&settings, http, cart).await,
    }
}

async fn chat(
    settings: &Settings,
    http: reqwest::Client,
    session: Option<String>,
    message: &str,
) -> Result<()> {
    let shop = ShopClient::new(http, settings.endpoints()?);
    let session = session.map(ChatSessionId::new);
    let reply = shop.chat(session.as_ref(), message).await?;

    println!("session: {}", reply.session_id);
    println!("{}", reply.reply);
    if let Some(spec) = reply.json_output {
        let spec = merge_spec_with_profile(spec, &settings.profile);
        println!("{}", serde_json::to_string_pretty(&spec)?);
    }
    Ok(())
}

async fn search(
    settings: &Settings,
    http: reqwest::Client,
    spec_path: PathBuf,
    refine: Option<&str>,
    preferences: Option<&str>,
) -> Result<()> {
    let raw = fs::read_to_string(&spec_path)
        .with_context(|| format!("failed to read '{}'", spec_path.display()))?;
    let spec: ShoppingSpec = serde_json::from_str(&raw)
        .with_context(|| format!("invalid shopping spec in '{}'", spec_path.display()))?;
    let spec = merge_spec_with_profile(spec, &settings.profile);
    let currency = spec.budget_currency.clone();

    let shop = ShopClient::new(http, settings.endpoints()?);
    let mut state = SearchState::new();
    state.search(&shop, spec).await?;
    if let Some(category) = refine {
        state.refine(&shop, category, preferences).await?;
    }

    for category in state.categories() {
        print_category(&category, currency.as_deref());
    }
    Ok(())
}

fn print_category(category: &CategoryData, currency: Option<&str>) {
    println!("== {} ==", category.category);
    let picks = category
        .best_pick
        .iter()
        .chain(category.alternatives.iter());
    for product in picks {
        let marker = if product.is_best_pick { "*" } else { " " };
        println!(
            "{marker} {} ({}) {} {}",
            product.name,
            product.brand,
            format_price(product.price, currency),
            product.url
        );
    }
}

async fn checkout(settings: &Settings, http: reqwest::Client, cart_path: PathBuf) -> Result<()> {
    let raw = fs::read_to_string(&cart_path)
        .with_context(|| format!("failed to read '{}'", cart_path.display()))?;
    let lines: Vec<CartLine> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid cart lines in '{}'", cart_path.display()))?;

    let mut cart = Cart::new();
    for line in lines {
        cart.set_product_quantity(line.product, line.quantity);
    }
    let currency = Some(settings.profile.currency.as_str());
    println!(
        "cart: {} item(s), total {}, savings {}",
        cart.total_items(),
        format_price(cart.total_price(), currency),
        format_price(cart.total_savings(), currency)
    );

    let cart = Arc::new(Mutex::new(cart));
    let client = CheckoutClient::new(
        CheckoutTransport::new(http, &settings.endpoints()?, settings.stream_checkout),
        Simulator::new(settings.simulation_delay()),
        cart,
    );

    let renderer = tokio::spawn(render_progress(client.subscribe(), io::stdout()));

    let outcome = if client.proceed_to_review().await.is_applied() {
        client.proceed_to_payment().await;
        let form = CheckoutForm::from_profile(&settings.profile);
        Some(client.execute(&form).await)
    } else {
        None
    };

    // Closing the snapshot channel lets the renderer print what is still queued.
    drop(client);
    renderer
        .await
        .context("progress renderer failed")?
        .context("failed to write progress")?;

    let Some(outcome) = outcome else {
        bail!("cart has no items with a purchase link");
    };
    let outcome = outcome?;

    print_outcome(&outcome);
    info!(
        total = outcome.summary.total,
        success = outcome.summary.success,
        "checkout finished"
    );
    Ok(())
}

/// Prints every snapshot until the client is dropped and the queue is empty.
async fn render_progress<W: Write>(
    mut snapshots: broadcast::Receiver<CheckoutSession>,
    mut out: W,
) -> io::Result<W> {
    loop {
        match snapshots.recv().await {
            Ok(session) => {
                for line in progress_lines(&session) {
                    writeln!(out, "{line}")?;
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return Ok(out),
        }
    }
}

fn progress_lines(session: &CheckoutSession) -> Vec<String> {
    if session.progress().is_empty() {
        return vec![format!("[{}]", session.step())];
    }
    session
        .progress()
        .values()
        .map(|progress| {
            let state = if progress.finished { "done" } else { "working" };
            format!(
                "[{}] #{} {}: {}/{} {state}",
                session.step(),
                progress.index + 1,
                progress.brand,
                progress.steps_completed,
                RETAILER_STEP_COUNT
            )
        })
        .collect()
}

fn print_outcome(outcome: &CheckoutOutcome) {
    for result in &outcome.results {
        let status = if result.success { "ok" } else { "failed" };
        println!("{status}: {} x{}", result.url, result.quantity);
        for step in &result.steps {
            println!("    {} [{}]", step.action, step.status);
        }
        if let Some(error) = &result.error {
            println!("    error: {error}");
        }
    }
    println!(
        "{} of {} succeeded, {} failed",
        outcome.summary.success, outcome.summary.total, outcome.summary.failed
    );
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
