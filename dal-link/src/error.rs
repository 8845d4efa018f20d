//! Error types for DAL link

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// DAL link error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Buffer shorter than the encoded structure requires
    #[error("Truncated packet: need {needed} bytes, got {actual}")]
    Truncated {
        /// Bytes required to decode
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Invalid packet or command line
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    /// Encoded datagram exceeds the transport ceiling
    #[error("Datagram too large: {size} bytes (limit {limit})")]
    Oversize {
        /// Encoded size
        size: usize,
        /// Configured ceiling
        limit: usize,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration could not be loaded, saved or applied
    #[error("Configuration error: {0}")]
    Config(String),

    /// Peer closed the connection
    #[error("Connection closed by peer")]
    ConnectionClosed,
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<dal_grid::GridError> for Error {
    fn from(e: dal_grid::GridError) -> Self {
        Error::Config(e.to_string())
    }
}

impl Error {
    /// Whether this error means the peer is gone
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::ConnectionClosed => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
