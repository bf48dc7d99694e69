use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use gemini_client::Gemini;
use reliefmap_api::{build_router, AppState};
use reliefmap_common::AppConfig;
use reliefmap_core::adapters::{
    GeminiOracle, GoogleGeocoder, NoCorroboration, NominatimGeocoder, TwitterCorroboration,
};
use reliefmap_core::{
    CorroborationSearch, DeduplicationEngine, EngineSettings, EventStore, HelpMatcher,
    HelpOfferStore, LocationResolver, MemoryStore, PgStore,
};
use twitter_client::TwitterClient;

#[derive(Parser)]
#[command(name = "reliefmap-api", about = "Crowd-sourced disaster report API")]
struct Cli {
    /// Keep events and offers in process memory even if DATABASE_URL is set
    #[arg(long)]
    in_memory: bool,

    /// Listen port (overrides API_PORT)
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("reliefmap=info".parse()?);
    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

async fn open_stores(
    config: &AppConfig,
    in_memory: bool,
) -> Result<(Arc<dyn EventStore>, Arc<dyn HelpOfferStore>)> {
    match (&config.database_url, in_memory) {
        (Some(url), false) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let store = Arc::new(PgStore::new(pool));
            store.migrate().await?;
            info!("Using Postgres store");
            let events: Arc<dyn EventStore> = store.clone();
            let offers: Arc<dyn HelpOfferStore> = store;
            Ok((events, offers))
        }
        _ => {
            warn!("Using in-memory store; events and offers are lost on restart");
            let store = Arc::new(MemoryStore::new());
            let events: Arc<dyn EventStore> = store.clone();
            let offers: Arc<dyn HelpOfferStore> = store;
            Ok((events, offers))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let (events, offers) = open_stores(&config, cli.in_memory).await?;

    let http = reqwest::Client::builder()
        .timeout(config.lookup_timeout)
        .build()?;

    let resolver: Arc<dyn LocationResolver> = match &config.google_maps_api_key {
        Some(key) => Arc::new(GoogleGeocoder::new(http.clone(), key.clone())),
        None => Arc::new(NominatimGeocoder::new(http.clone())),
    };

    let corroboration: Arc<dyn CorroborationSearch> = match &config.twitter_bearer_token {
        Some(token) => Arc::new(TwitterCorroboration::new(
            TwitterClient::new(token.clone()).with_http_client(http.clone()),
        )),
        None => {
            warn!("TWITTER_BEARER_TOKEN not set; reports will never be corroborated");
            Arc::new(NoCorroboration)
        }
    };

    let oracle_http = reqwest::Client::builder()
        .timeout(config.oracle_timeout)
        .build()?;
    let oracle = Arc::new(GeminiOracle::new(
        Gemini::new(config.gemini_api_key.clone(), config.gemini_model.clone())
            .with_http_client(oracle_http),
    ));

    let engine = DeduplicationEngine::new(resolver, corroboration, oracle.clone(), events.clone())
        .with_settings(
            EngineSettings::builder()
                .oracle_timeout(config.oracle_timeout)
                .lookup_timeout(config.lookup_timeout)
                .build(),
        );
    let help = HelpMatcher::new(oracle).with_timeout(config.oracle_timeout);

    let state = Arc::new(AppState {
        engine,
        help,
        events,
        offers,
    });

    let app = build_router(state, &config.allowed_origins);

    let port = cli.port.unwrap_or(config.api_port);
    let addr = format!("{}:{port}", config.api_host);
    info!("ReliefMap API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
