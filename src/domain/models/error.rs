use thiserror::Error;

/// Outcome classes for a backend call that did not succeed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The credential was rejected. The session has already been told.
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message} (HTTP {status})")]
    RequestFailed { status: u16, message: String },

    /// No response arrived.
    #[error("Network connection failed: {0}")]
    NetworkError(String),
}

impl GatewayError {
    pub fn is_unauthorized(&self) -> bool {
        return matches!(self, GatewayError::Unauthorized { .. });
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Unauthorized { .. } => return Some(401),
            GatewayError::RequestFailed { status, .. } => return Some(*status),
            GatewayError::NetworkError(_) => return None,
        }
    }
}
