use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Endpoint '{endpoint}' embeds application id {embedded}, expected client id {client_id}")]
    EndpointClientMismatch {
        endpoint: String,
        embedded: String,
        client_id: String,
    },

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Token cache storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Cached token for resource '{resource}' is corrupted: {reason}")]
    TokenCorrupted { resource: String, reason: String },

    #[error("Serialization failed ({context}): {source}")]
    SerializationFailed {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, AuthError>;
