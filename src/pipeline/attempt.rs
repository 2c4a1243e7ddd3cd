//! Attempt-level types: request, progress, terminal results, and the
//! in-flight tracker

use crate::error::BridgeError;
use crate::pipeline::stage::BridgeStage;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A request to bridge an amount of the source asset to a destination
/// chain. Immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Source-ledger account funding the lock
    pub user_address: String,
    /// Source token symbol
    pub from_token: String,
    /// Destination token symbol
    pub dest_token: String,
    /// Amount in whole source units, as a decimal string
    pub amount: String,
    /// Destination chain id
    pub dest_chain: String,
    /// Recipient address on the destination chain
    pub recipient_address: String,
}

/// Progress emitted at each stage transition of an attempt
#[derive(Debug, Clone, Serialize)]
pub struct BridgeProgress {
    pub attempt_id: Uuid,
    pub stage: BridgeStage,
    /// Checkpoint in [0, 100]; non-decreasing within an attempt
    pub percent: u8,
}

/// Terminal result of a completed bridge attempt
#[derive(Debug, Clone, Serialize)]
pub struct BridgeResult {
    pub attempt_id: Uuid,
    pub success: bool,
    /// Lock transaction hash on the source ledger
    pub source_tx_hash: String,
    /// Release transaction hash on the destination chain
    pub dest_tx_hash: String,
    pub source_explorer_url: String,
    pub dest_explorer_url: String,
    /// Echo of the normalized request
    pub amount: String,
    pub token: String,
    pub recipient: String,
    pub dest_chain: String,
    pub completed_at: DateTime<Utc>,
}

/// Terminal failure of a bridge attempt.
///
/// A populated `lock_hash` means funds are escrowed on the source ledger
/// but the release has not happened; that state needs operator follow-up
/// and is distinct from failures where nothing happened.
#[derive(Debug, Error)]
#[error("bridge attempt {attempt_id} failed at {}: {error}", .stage.name())]
pub struct BridgeFailure {
    pub attempt_id: Uuid,
    /// Stage that was active when the attempt failed
    pub stage: BridgeStage,
    #[source]
    pub error: BridgeError,
    pub lock_hash: Option<String>,
    pub lock_explorer_url: Option<String>,
}

impl BridgeFailure {
    /// True when funds are locked on the source ledger without a matching
    /// release on the destination chain
    pub fn is_partial(&self) -> bool {
        self.lock_hash.is_some()
    }
}

/// Live view of one attempt, held by the tracker
#[derive(Debug, Clone, Serialize)]
pub struct AttemptStatus {
    pub stage: BridgeStage,
    pub dest_chain: String,
    pub lock_hash: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// Registry of attempts the orchestrator has seen.
///
/// Observational only: it answers status queries and keeps terminal
/// entries until cleared. It does not deduplicate concurrent attempts for
/// the same request; callers own that policy.
#[derive(Default)]
pub struct AttemptTracker {
    attempts: DashMap<Uuid, AttemptStatus>,
}

impl AttemptTracker {
    pub fn new() -> Self {
        Self {
            attempts: DashMap::new(),
        }
    }

    pub fn record(&self, attempt_id: Uuid, dest_chain: &str) {
        self.attempts.insert(
            attempt_id,
            AttemptStatus {
                stage: BridgeStage::Validating,
                dest_chain: dest_chain.to_string(),
                lock_hash: None,
                started_at: Utc::now(),
            },
        );
    }

    pub fn update_stage(&self, attempt_id: &Uuid, stage: BridgeStage) {
        if let Some(mut status) = self.attempts.get_mut(attempt_id) {
            status.stage = stage;
        }
    }

    pub fn set_lock_hash(&self, attempt_id: &Uuid, hash: &str) {
        if let Some(mut status) = self.attempts.get_mut(attempt_id) {
            status.lock_hash = Some(hash.to_string());
        }
    }

    pub fn get(&self, attempt_id: &Uuid) -> Option<AttemptStatus> {
        self.attempts.get(attempt_id).map(|s| s.value().clone())
    }

    /// Attempts that have not reached a terminal stage
    pub fn in_flight(&self) -> Vec<(Uuid, AttemptStatus)> {
        self.attempts
            .iter()
            .filter(|entry| !entry.value().stage.is_terminal())
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Drop terminal entries
    pub fn clear_terminal(&self) {
        self.attempts
            .retain(|_, status| !status.stage.is_terminal());
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_lifecycle() {
        let tracker = AttemptTracker::new();
        let id = Uuid::new_v4();

        tracker.record(id, "17000");
        assert_eq!(tracker.get(&id).unwrap().stage, BridgeStage::Validating);
        assert_eq!(tracker.in_flight().len(), 1);

        tracker.update_stage(&id, BridgeStage::LockConfirmed);
        tracker.set_lock_hash(&id, "abc123");
        let status = tracker.get(&id).unwrap();
        assert_eq!(status.stage, BridgeStage::LockConfirmed);
        assert_eq!(status.lock_hash.as_deref(), Some("abc123"));

        tracker.update_stage(&id, BridgeStage::Completed);
        assert!(tracker.in_flight().is_empty());
        assert_eq!(tracker.len(), 1);

        tracker.clear_terminal();
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_failure_partial_classification() {
        let failure = BridgeFailure {
            attempt_id: Uuid::new_v4(),
            stage: BridgeStage::AwaitingRelease,
            error: BridgeError::Release("backend declined".into()),
            lock_hash: Some("deadbeef".into()),
            lock_explorer_url: None,
        };
        assert!(failure.is_partial());

        let failure = BridgeFailure {
            attempt_id: Uuid::new_v4(),
            stage: BridgeStage::Validating,
            error: BridgeError::Validation("bad amount".into()),
            lock_hash: None,
            lock_explorer_url: None,
        };
        assert!(!failure.is_partial());
    }
}
