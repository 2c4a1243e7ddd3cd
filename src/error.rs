//! Error types for the bridge orchestrator

use thiserror::Error;

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Account {address} not found on {network}")]
    AccountNotFound { address: String, network: String },

    #[error("Ledger gateway error: {0}")]
    Gateway(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Simulation rejected: {0}")]
    SimulationRejected(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Confirmation error: {0}")]
    Confirmation(String),

    #[error("Release error: {0}")]
    Release(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },
}

impl BridgeError {
    /// Check if the failed operation was read-only or idempotent and could
    /// be safely retried by a caller
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BridgeError::Gateway(_)
                | BridgeError::Network(_)
                | BridgeError::Timeout { .. }
                | BridgeError::Confirmation(_)
        )
    }

    /// Check if the error rules out the request entirely (bad input, never
    /// worth re-submitting unchanged)
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            BridgeError::Validation(_)
                | BridgeError::InvalidAddress(_)
                | BridgeError::SimulationRejected(_)
        )
    }
}

/// Result type for bridge operations
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BridgeError::Network("connection reset".into()).is_retryable());
        assert!(BridgeError::Timeout {
            operation: "fetch account".into()
        }
        .is_retryable());
        assert!(!BridgeError::Validation("amount must be positive".into()).is_retryable());
        assert!(!BridgeError::Signing("backend declined".into()).is_retryable());
    }

    #[test]
    fn test_rejection_classification() {
        assert!(BridgeError::SimulationRejected("insufficient balance".into()).is_rejection());
        assert!(!BridgeError::Release("malformed hash".into()).is_rejection());
    }
}
