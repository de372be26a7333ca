//! Demo: REST Ticker
//!
//! Showcases: public catalog operations, call budget, outcome classification
//!
//! Run: cargo run --bin rest_ticker
//! Private calls run too when BITSTAMP_API_KEY, BITSTAMP_API_SECRET and
//! BITSTAMP_CLIENT_ID are set.

use bitstamp_auth::Credentials;
use bitstamp_rest::{CallGateway, GatewayConfig, OperationRequest, TransactionsWindow};
use bitstamp_types::Pair;
use colored::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("{}", "═".repeat(65).cyan());
    println!("{}", "  REST TICKER".cyan().bold());
    println!("{}", "  Bitstamp SDK Demo - Rate-Limited Call Gateway".cyan());
    println!("{}", "═".repeat(65).cyan());
    println!();

    let credentials = Credentials::from_env().ok();
    let gateway = CallGateway::with_config(GatewayConfig::default(), credentials)?;

    println!("{}", "  TICKERS".white().bold());
    println!("  {}", "─".repeat(50));
    for pair in [Pair::BTC_USD, Pair::ETH_USD, Pair::XRP_USD, Pair::LTC_USD] {
        match gateway.execute(&OperationRequest::ticker(Some(pair))).await {
            Ok(response) => {
                let last = response
                    .json()
                    .and_then(|body| body.get("last"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("?");
                println!("  {:<8} {}", pair.to_uppercase().cyan(), last.white().bold());
            }
            Err(e) => println!("  {:<8} {} ({})", pair.to_uppercase().cyan(), e.to_string().red(), kind_label(&e)),
        }
    }

    println!();
    println!("{}", "  RECENT TRADES (last minute)".white().bold());
    println!("  {}", "─".repeat(50));
    let trades = gateway
        .execute(&OperationRequest::transactions(Some(Pair::BTC_USD), TransactionsWindow::Minute))
        .await?;
    let count = trades.json().and_then(|v| v.as_array()).map_or(0, |a| a.len());
    println!("  BTCUSD trades: {}", count.to_string().cyan());

    if gateway.has_credentials() {
        println!();
        println!("{}", "  ACCOUNT".white().bold());
        println!("  {}", "─".repeat(50));
        match gateway.execute(&OperationRequest::balance(Some(Pair::BTC_USD))).await {
            Ok(response) => println!("  {}", response.json().map(|v| v.to_string()).unwrap_or_default()),
            Err(e) => println!("  {} ({})", e.to_string().red(), kind_label(&e)),
        }
    }

    let budget = gateway.budget();
    println!();
    println!("{}", "  CALL BUDGET".white().bold());
    println!("  {}", "─".repeat(50));
    println!("  Total calls:     {}", budget.total_calls().to_string().cyan());
    println!(
        "  Calls in window: {} / {}",
        budget.calls_in_window().to_string().cyan(),
        gateway.config().rate_limit.max_calls_per_window
    );

    gateway.close();
    Ok(())
}

fn kind_label(e: &bitstamp_rest::CallError) -> String {
    e.kind().map_or_else(|| "usage".to_string(), |k| k.to_string())
}
