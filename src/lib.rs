pub mod browser;
pub mod config;
pub mod error;
pub mod ingest;
pub mod instrumentation;
pub mod message_bus;
pub mod orchestrator;
pub mod queue;
pub mod schema;
pub mod strategy;
pub mod utils;

pub use browser::{
    BrowserDriver, BrowserManager, BrowsingContext, CdpContext, CdpDriver, ContextId,
};
pub use config::ScrapeConfig;
pub use error::{ErrorKind, JobResult, ScrapeError};
pub use ingest::{IngestError, IngestionClient};
pub use message_bus::{
    Ack, Message, MessageBus, ResultListener, ScrapeResultMessage, StartScrape, TriggerServer,
};
pub use orchestrator::{ContextSession, OrchestratorSettings, TabOrchestrator};
pub use queue::{DrainState, JobQueue, JobRunner, QueueSettings, QueueSnapshot, RateSink, TokenStore};
pub use schema::{JobKind, JobOutcome, ScrapeJob, ScrapeResult};
pub use strategy::{PageSnapshot, PageSource, Site, SiteStrategy};
