//! Error types for result bus operations

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Nobody was listening when a result was published
    #[error("No active listeners")]
    NoSubscribers,

    /// The bus was dropped while a listener was waiting
    #[error("Message bus closed")]
    Closed,

    /// A listener fell behind and messages were overwritten
    #[error("Listener lagged behind, missed {0} messages")]
    Lagged(u64),
}
