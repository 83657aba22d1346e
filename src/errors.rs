use thiserror::Error;

/// Failures surfaced by client operations.
///
/// Every error is reported synchronously to the caller of the operation that
/// triggered it; there is no background error channel.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("monit returned HTTP status {status} for {url}")]
    Status { status: u16, url: String },
    #[error("invalid status document: {message}")]
    Parse { message: String },
    #[error("service '{name}' is not present in the current snapshot")]
    UnknownService { name: String },
    #[error("status did not stabilize after {attempts} transitional snapshots")]
    Unstable { attempts: usize },
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn unknown_service(name: impl Into<String>) -> Self {
        Self::UnknownService { name: name.into() }
    }
}
