use std::time::Duration;

/// Errors raised while decoding samples or serving connections.
#[derive(Debug, thiserror::Error)]
pub enum ImuError {
    #[error("Invalid JSON payload: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Invalid sample: {0}")]
    Field(#[source] serde_json::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("No message received for {0:?}")]
    IdleTimeout(Duration),

    #[error("WebSocket error: {0}")]
    WebSocket(tungstenite::Error),

    #[error("WebSocket handshake failed: {0}")]
    Handshake(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sample store stopped")]
    StoreStopped,
}

impl ImuError {
    /// Split a JSON failure into malformed syntax and a payload that parsed
    /// but does not describe a sample (unknown key, wrong type, not an object).
    pub fn from_json(err: serde_json::Error) -> Self {
        match err.classify() {
            serde_json::error::Category::Data => ImuError::Field(err),
            _ => ImuError::Decode(err),
        }
    }

    /// Whether a connection survives this error. Only per-message payload
    /// faults are recoverable; everything else ends the receive loop.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ImuError::Decode(_) | ImuError::Field(_))
    }
}

impl From<tungstenite::Error> for ImuError {
    fn from(err: tungstenite::Error) -> Self {
        use tungstenite::error::ProtocolError;
        match err {
            tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake) => {
                ImuError::ConnectionClosed
            }
            tungstenite::Error::Io(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::ConnectionAborted
                        | std::io::ErrorKind::BrokenPipe
                        | std::io::ErrorKind::UnexpectedEof
                ) =>
            {
                ImuError::ConnectionClosed
            }
            other => ImuError::WebSocket(other),
        }
    }
}
