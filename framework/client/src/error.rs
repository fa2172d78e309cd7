use std::time::Duration;

/// Errors produced while talking to a cluster's query API.
///
/// The variants matter to callers: the run executor records [ClientError::TimedOut] as a
/// distinct timeout outcome, while everything else becomes a failure. Engine error messages are
/// carried verbatim so that operators can diagnose the root cause from the run records.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("authentication rejected by {cluster}: {message}")]
    AuthRejected { cluster: String, message: String },

    #[error("query failed on {cluster} (HTTP {status}): {message}")]
    Query {
        cluster: String,
        status: u16,
        message: String,
    },

    #[error("request to {cluster} failed: {source}")]
    Transport {
        cluster: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("query timed out after {after:?}")]
    TimedOut { after: Duration },
}

impl ClientError {
    /// True when the error means the cluster cannot be used at all, as opposed to a single
    /// query going wrong.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            ClientError::AuthRejected { .. } | ClientError::Transport { .. }
        )
    }
}
