use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid logging settings, or a subscriber was already installed
    #[error("Runtime configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
