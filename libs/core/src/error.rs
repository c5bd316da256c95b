use crate::storage::StorageError;

/// Boxed error used as the source of turn failures raised by adapters, middleware and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures that abort a turn.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    #[error("middleware `{name}` failed")]
    Middleware {
        name: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("bot handler failed")]
    Handler(#[source] BoxError),
    #[error("channel `{channel}` failed to send activity")]
    Send {
        channel: String,
        #[source]
        source: BoxError,
    },
    #[error("operation `{op}` not supported by channel `{channel}`")]
    NotSupported { channel: String, op: &'static str },
    #[error("storage failure")]
    Storage(#[from] StorageError),
}

impl TurnError {
    pub fn middleware(name: &'static str, err: impl Into<BoxError>) -> Self {
        TurnError::Middleware {
            name,
            source: err.into(),
        }
    }

    pub fn handler(err: impl Into<BoxError>) -> Self {
        TurnError::Handler(err.into())
    }

    pub fn send(channel: impl Into<String>, err: impl Into<BoxError>) -> Self {
        TurnError::Send {
            channel: channel.into(),
            source: err.into(),
        }
    }
}
