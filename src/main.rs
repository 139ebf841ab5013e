use anyhow::Context;
use smacross::api::{BinanceClient, Network};
use smacross::config::Settings;
use smacross::execution::Trader;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let settings = Settings::load().context("Failed to load configuration")?;

    match settings.network() {
        Network::Testnet => tracing::info!("Using TESTNET"),
        Network::Live => tracing::info!("Using LIVE environment"),
    }

    let credentials = settings.credentials();
    if credentials.is_none() {
        tracing::warn!("BINANCE_API_KEY / BINANCE_API_SECRET not set, orders will be rejected");
    }

    let client = BinanceClient::new(settings.network(), credentials)
        .context("Failed to build exchange client")?
        .with_recv_window(settings.recv_window_ms);
    tracing::info!("Exchange endpoint: {}", client.base_url());

    let trader = Trader::new(client, &settings);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        _ = trader.run() => {}
    }

    tracing::info!("Bot stopped");
    Ok(())
}

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("smacross=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
