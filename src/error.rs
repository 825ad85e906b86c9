use thiserror::Error;

/// type alias for all operations in this crate that could fail with a [`DictError`]
pub type Result<T> = std::result::Result<T, DictError>;

/// The error variants used by the dictionary client, server and binaries.
///
/// Note that failed dictionary operations (word not found, duplicate meaning, etc...)
/// are NOT errors. They are ordinary [`Response`] values with an `ERROR` code, returned
/// to the client as data. `DictError` only covers transport failures, bad configuration
/// and the fatal dictionary-file load at start-up.
///
/// [`Response`]: ../protocol/struct.Response.html
#[derive(Debug, Error)]
pub enum DictError {
    /// variant for errors caused by socket or file IO
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// variant for errors (de)serializing requests, responses or the dictionary file
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// variant for invalid command line parameters
    #[error("{0}")]
    Parsing(String),

    /// variant for a handshake that could not be decoded into a client number
    #[error("invalid handshake received from the server")]
    Handshake,
}
