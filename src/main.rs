// ratescrape: competitor rate scraping service
//
// Listens for START_SCRAPE requests, runs each job in a background browser
// tab and posts the rates to the ingestion backend.

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use ratescrape::{
    BrowserManager, CdpDriver, IngestionClient, JobQueue, MessageBus, OrchestratorSettings,
    QueueSettings, ScrapeConfig, TabOrchestrator, TokenStore, TriggerServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();

    let config = ScrapeConfig::from_env().context("Invalid configuration")?;
    info!(
        "Starting ratescrape, ingesting into {}",
        config.ingest_url()
    );

    let browser = BrowserManager::new(config.headless(), config.chrome_data_dir().cloned());
    let driver = CdpDriver::new(browser.clone(), config.page_load_timeout());
    let bus = MessageBus::default();
    let orchestrator = TabOrchestrator::new(
        driver,
        bus.clone(),
        OrchestratorSettings::from_config(&config),
    );
    let ingest = IngestionClient::from_config(&config)?;
    let queue = JobQueue::new(
        orchestrator,
        ingest,
        QueueSettings::from_config(&config),
        Some(TokenStore::new(config.storage_path())),
    );

    let public_base = format!("http://{}", config.listen_addr());
    let server = TriggerServer::new(
        queue,
        bus,
        config.allowed_origins().to_vec(),
        &public_base,
    );

    let served = server
        .run(config.listen_addr(), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    browser.shutdown().await;
    served
}
