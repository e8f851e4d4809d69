//! Message Bus
//!
//! `START_SCRAPE` flows from callers into the queue; `SCRAPE_RESULT` flows
//! from browsing contexts to the session waiting on them. `types` holds the
//! wire shapes, `bus` the in-process result channel, `trigger` the HTTP
//! listener that connects outside callers.

pub mod bus;
pub mod errors;
pub mod metrics;
pub mod trigger;
pub mod types;

pub use bus::{MessageBus, ResultListener};
pub use errors::BusError;
pub use metrics::{BusMetrics, MetricsSnapshot};
pub use trigger::{OriginGuard, TriggerServer};
pub use types::{Ack, AckStatus, JobSpec, Message, ScrapeResultMessage, StartScrape};
