//! Demo: Live Trades
//!
//! Showcases: topic subscriptions, derived trade cost, lifecycle listeners
//!
//! Run: cargo run --bin live_trades -- btcusd ethusd

use bitstamp_types::ChannelKind;
use bitstamp_ws::{ChannelMultiplexer, StreamConfig};
use colored::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut pairs: Vec<String> = std::env::args().skip(1).collect();
    if pairs.is_empty() {
        pairs.push("btcusd".to_string());
    }

    println!("{}", "═".repeat(65).cyan());
    println!("{}", "  LIVE TRADES".cyan().bold());
    println!("{}", "  Bitstamp SDK Demo - Multiplexed Trade Stream".cyan());
    println!("{}", "═".repeat(65).cyan());
    println!();

    let stream = ChannelMultiplexer::new(StreamConfig::default());

    stream.on_connected(|info| {
        let label = if info.is_reconnection { "Reconnected" } else { "Connected" };
        println!("  {} {} to {}", "●".green(), label.green(), info.url);
    });
    stream.on_disconnected(|reason| {
        println!("  {} Disconnected: {}", "●".red(), reason);
    });
    stream.on_error(|e| {
        println!("  {} {}", "!".yellow(), e);
    });

    for pair in &pairs {
        let topic = stream.subscribe(ChannelKind::LiveTrades, pair)?;
        let label = pair.to_uppercase();
        stream.on_topic(topic, move |event| {
            let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
            let data = event.data();
            let side = match data.get("type").and_then(|t| t.as_i64()) {
                Some(0) => "BUY ".green(),
                Some(1) => "SELL".red(),
                _ => "    ".normal(),
            };
            let cost = event
                .cost()
                .map(|c| c.round_dp(2).to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {} {:<8} {} amount={} price={} cost={}",
                format!("[{}]", timestamp).dimmed(),
                label.cyan(),
                side,
                data.get("amount").map(|v| v.to_string()).unwrap_or_default(),
                data.get("price").map(|v| v.to_string()).unwrap_or_default(),
                cost.white().bold()
            );
        });
    }

    stream.start()?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = tokio::time::sleep(Duration::from_secs(60)) => {}
    }

    println!();
    println!("  Active topics: {}", stream.active_topics().join(", ").cyan());
    stream.close();
    stream.closed().await;

    Ok(())
}
