use thiserror::Error;

/// Failures surfaced by the remote client and the local store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
  /// HTTP 401. The session credential has already been cleared.
  #[error("Unauthorized - Token expired or invalid")]
  Unauthorized,

  /// HTTP 403, carrying the message to show the user.
  #[error("Forbidden - {0}")]
  Forbidden(String),

  /// Any other non-2xx status or a transport failure.
  #[error("{0}")]
  RequestFailed(String),

  #[error("Failed to decode response: {0}")]
  Decode(String),

  #[error("Invalid URL: {0}")]
  InvalidUrl(String),

  /// The local key-value store could not be read or written.
  #[error("Storage unavailable: {0}")]
  StorageUnavailable(String),
}

impl Error {
  /// Whether retrying the same call can never succeed without user action.
  pub fn is_fatal(&self) -> bool {
    matches!(self, Error::Unauthorized | Error::Forbidden(_))
  }
}

impl From<rusqlite::Error> for Error {
  fn from(err: rusqlite::Error) -> Self {
    Error::StorageUnavailable(err.to_string())
  }
}

impl From<url::ParseError> for Error {
  fn from(err: url::ParseError) -> Self {
    Error::InvalidUrl(err.to_string())
  }
}

pub type Result<T> = std::result::Result<T, Error>;
