use anyhow::Result;
use clap::{Arg, Command};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod api;
mod captions;
mod config;
mod resolve;
mod translate;
mod transport;

use crate::api::{start_http_server, AppState};
use crate::captions::browser::BrowserDomStrategy;
use crate::captions::chain::{CaptionStrategy, StrategyChain};
use crate::captions::data_api::{DataApiClient, DataApiStrategy};
use crate::captions::scraper::CaptionScraperStrategy;
use crate::captions::timedtext::TimedtextProxyStrategy;
use crate::config::Config;
use crate::translate::ChatCompletionTranslator;
use crate::transport::TransportProfile;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "caption_relay=info,tower_http=info,warn".into()),
        )
        .init();

    let matches = Command::new("caption-relay")
        .version("0.1.0")
        .about("Caption acquisition fallback chain with streaming translation relay")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Listen port (overrides configuration)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default().with_env_overrides()
    });

    if let Some(port) = matches.get_one::<String>("port") {
        config.server.port = port.parse()?;
    }
    if matches.get_flag("verbose") {
        info!("Verbose logging enabled");
    }

    // Configuration problems are fatal here, never per request.
    if let Err(e) = config.validate() {
        error!("❌ Configuration error: {}", e);
        std::process::exit(1);
    }

    let transport = match TransportProfile::build(&config.proxy) {
        Ok(transport) => transport,
        Err(e) => {
            error!("❌ Transport profile error: {}", e);
            std::process::exit(1);
        }
    };

    info!("🚀 Caption relay starting...");
    if let Some(proxy) = transport.proxy_endpoint() {
        info!("🧦 Forward proxy: {}", proxy);
    }

    let attempt_timeout = Duration::from_secs(config.chain.attempt_timeout_seconds);
    let api_timeout = Duration::from_secs(config.youtube.request_timeout_seconds);
    let api_key = config
        .youtube
        .api_key
        .clone()
        .unwrap_or_default();

    let data_api = Arc::new(DataApiClient::new(api_key, api_timeout)?);

    // Cheapest and most likely to succeed first; the headless browser only
    // runs when everything else came up dry.
    let mut strategies: Vec<Box<dyn CaptionStrategy>> = vec![
        Box::new(DataApiStrategy::new(data_api.clone())),
        Box::new(CaptionScraperStrategy::new(attempt_timeout)?),
        Box::new(TimedtextProxyStrategy::new(&transport, attempt_timeout)?),
    ];
    if config.browser.enabled {
        strategies.push(Box::new(BrowserDomStrategy::new(
            config.browser.webdriver_url.clone(),
            &transport,
            Duration::from_secs(config.browser.ui_timeout_seconds),
        )));
    }
    info!("🔗 Strategy chain: {} strategies configured", strategies.len());

    let chain = Arc::new(StrategyChain::new(strategies, attempt_timeout));
    let translator = Arc::new(ChatCompletionTranslator::new(config.translation.clone())?);

    let port = config.server.port;
    let state = AppState {
        chain,
        data_api,
        translator,
        config: Arc::new(config),
    };

    start_http_server(state, port).await
}
