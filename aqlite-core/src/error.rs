use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed statement. The payload is the operator-facing diagnostic.
    #[error("{0}")]
    Parse(String),

    #[error("Unsupported AQL command: {0}")]
    UnsupportedCommand(String),

    #[error("Empty AQL query.")]
    EmptyQuery,

    #[error("Not connected to the cluster.")]
    NotConnected,

    /// Failure raised by the store client. The payload is the store's message.
    #[error("{0}")]
    Store(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for building a parse diagnostic.
    pub fn parse(message: impl Into<String>) -> Self {
        Error::Parse(message.into())
    }

    /// Shorthand for building a store fault.
    pub fn store(message: impl Into<String>) -> Self {
        Error::Store(message.into())
    }

    /// Returns a stable error code for this error variant.
    /// These codes are stable and can be used by clients for error classification.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Parse(_) => "PARSE_ERROR",
            Error::UnsupportedCommand(_) => "UNSUPPORTED_COMMAND",
            Error::EmptyQuery => "EMPTY_QUERY",
            Error::NotConnected => "NOT_CONNECTED",
            Error::Store(_) => "STORE_FAULT",
            Error::InvalidArgument(_) => "INVALID_ARGUMENT",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for errors raised before any store call was made.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Parse(_) | Error::UnsupportedCommand(_) | Error::EmptyQuery | Error::NotConnected
        )
    }

    /// Prefixes the message with operation context.
    ///
    /// Store faults stay store faults so callers can still classify them;
    /// everything else is wrapped as an internal error.
    ///
    /// # Examples
    ///
    /// ```
    /// use aqlite_core::Error;
    ///
    /// let err = Error::store("timeout").with_context("Error inserting record");
    /// assert_eq!(err.to_string(), "Error inserting record: timeout");
    /// assert_eq!(err.code(), "STORE_FAULT");
    /// ```
    pub fn with_context(self, context: &str) -> Error {
        match self {
            Error::Store(msg) => Error::Store(format!("{}: {}", context, msg)),
            other => Error::Internal(format!("{}: {}", context, other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
