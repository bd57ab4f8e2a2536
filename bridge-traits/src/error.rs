use thiserror::Error;

/// Failure reported by a platform bridge implementation.
///
/// Messages describe the failing operation only; stored values never appear.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The backing store cannot be reached on this host
    #[error("Storage backend not available: {0}")]
    NotAvailable(String),

    #[error("Storage operation failed: {0}")]
    OperationFailed(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
