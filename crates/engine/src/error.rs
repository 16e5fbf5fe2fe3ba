//! Unified infrastructure error type.
//!
//! Aggregates every downstream failure (store, bus, command channel, plugin
//! HTTP client) behind one enum so application-layer handlers can match on
//! `is_retryable()` instead of downstream error shapes (§4.3, §7).

use thiserror::Error;
use villagemc_domain::DomainError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("catalogue store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("event bus error: {0}")]
    Bus(#[from] redis::RedisError),

    #[error("bus pool error: {0}")]
    BusPool(#[from] deadpool_redis::PoolError),

    #[error("command channel error: {0}")]
    CommandChannel(String),

    #[error("plugin HTTP error: {0}")]
    Plugin(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl InfraError {
    pub fn command_channel(message: impl ToString) -> Self {
        Self::CommandChannel(message.to_string())
    }

    pub fn config(message: impl ToString) -> Self {
        Self::Config(message.to_string())
    }

    /// Distinguishes transient faults (worth a job retry, §4.3) from
    /// terminal ones (validation, missing referent — fail the job now).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CommandChannel(_) | Self::Bus(_) | Self::BusPool(_) | Self::Plugin(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_validation_errors_are_not_retryable() {
        let err: InfraError = DomainError::validation("bad coordinate").into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn command_channel_faults_are_retryable() {
        let err = InfraError::command_channel("connection reset");
        assert!(err.is_retryable());
    }
}
