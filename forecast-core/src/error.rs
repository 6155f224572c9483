use thiserror::Error;

use crate::transport::TransportError;

/// Failure of a single forecast fetch. Nothing is retried or recovered locally.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Upstream answered with a non-2xx status.
    #[error("upstream responded with status {status}{}", describe_body(.body))]
    Upstream { status: u16, body: Option<String> },

    /// 2xx response whose body does not match the forecast schema.
    #[error("failed to deserialize forecast response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ForecastError {
    /// Upstream status code, if the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ForecastError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn describe_body(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(": {}", truncate_body(body)),
        None => String::new(),
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
