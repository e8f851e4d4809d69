//! Configuration module for the rate scraping worker
//!
//! This module provides the `ScrapeConfig` struct, its type-safe builder and
//! the environment overlay used by the binary.

// Sub-modules
pub mod builder;
pub mod env;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{ScrapeConfigBuilder, WithApiBase};
pub use types::ScrapeConfig;
