//! Bridge attempt state machine
//!
//! Stages advance strictly forward within an attempt; the only branch is
//! that any non-terminal stage may fail. Progress values are fixed
//! checkpoints, so any observer sees a non-decreasing sequence ending at
//! 100 on success.

use serde::{Deserialize, Serialize};

/// Stage of a bridge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BridgeStage {
    Validating,
    BuildingTransaction,
    AwaitingLock,
    LockConfirmed,
    Indexing,
    AwaitingRelease,
    Completed,
    Failed,
}

impl BridgeStage {
    /// Fixed progress checkpoint for this stage. `Failed` pins the last
    /// value reached and has no checkpoint of its own.
    pub fn progress(&self) -> Option<u8> {
        match self {
            BridgeStage::Validating => Some(10),
            BridgeStage::BuildingTransaction => Some(25),
            BridgeStage::AwaitingLock => Some(40),
            BridgeStage::LockConfirmed => Some(50),
            BridgeStage::Indexing => Some(70),
            BridgeStage::AwaitingRelease => Some(90),
            BridgeStage::Completed => Some(100),
            BridgeStage::Failed => None,
        }
    }

    /// Stage name for logs and metrics labels
    pub fn name(&self) -> &'static str {
        match self {
            BridgeStage::Validating => "validating",
            BridgeStage::BuildingTransaction => "building_transaction",
            BridgeStage::AwaitingLock => "awaiting_lock",
            BridgeStage::LockConfirmed => "lock_confirmed",
            BridgeStage::Indexing => "indexing",
            BridgeStage::AwaitingRelease => "awaiting_release",
            BridgeStage::Completed => "completed",
            BridgeStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BridgeStage::Completed | BridgeStage::Failed)
    }

    /// The stage the pipeline advances to on success, if any
    pub fn successor(&self) -> Option<BridgeStage> {
        match self {
            BridgeStage::Validating => Some(BridgeStage::BuildingTransaction),
            BridgeStage::BuildingTransaction => Some(BridgeStage::AwaitingLock),
            BridgeStage::AwaitingLock => Some(BridgeStage::LockConfirmed),
            BridgeStage::LockConfirmed => Some(BridgeStage::Indexing),
            BridgeStage::Indexing => Some(BridgeStage::AwaitingRelease),
            BridgeStage::AwaitingRelease => Some(BridgeStage::Completed),
            BridgeStage::Completed | BridgeStage::Failed => None,
        }
    }

    /// Whether a transition to `next` is legal: the linear successor, or
    /// `Failed` from any non-terminal stage
    pub fn can_transition_to(&self, next: BridgeStage) -> bool {
        if next == BridgeStage::Failed {
            return !self.is_terminal();
        }
        self.successor() == Some(next)
    }

    /// True once funds are escrowed on the source ledger; failures past
    /// this point are partial and need operator follow-up
    pub fn is_post_lock(&self) -> bool {
        matches!(
            self,
            BridgeStage::LockConfirmed
                | BridgeStage::Indexing
                | BridgeStage::AwaitingRelease
                | BridgeStage::Completed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY_PATH: [BridgeStage; 7] = [
        BridgeStage::Validating,
        BridgeStage::BuildingTransaction,
        BridgeStage::AwaitingLock,
        BridgeStage::LockConfirmed,
        BridgeStage::Indexing,
        BridgeStage::AwaitingRelease,
        BridgeStage::Completed,
    ];

    #[test]
    fn test_happy_path_transitions_are_legal() {
        for pair in HAPPY_PATH.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0].name(),
                pair[1].name()
            );
        }
    }

    #[test]
    fn test_progress_is_strictly_increasing_on_happy_path() {
        let mut last = 0u8;
        for stage in HAPPY_PATH {
            let percent = stage.progress().unwrap();
            assert!(percent > last, "{} must advance progress", stage.name());
            last = percent;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn test_no_regressions_allowed() {
        assert!(!BridgeStage::Indexing.can_transition_to(BridgeStage::LockConfirmed));
        assert!(!BridgeStage::Completed.can_transition_to(BridgeStage::Validating));
        assert!(!BridgeStage::AwaitingRelease.can_transition_to(BridgeStage::AwaitingLock));
    }

    #[test]
    fn test_any_non_terminal_stage_may_fail() {
        for stage in HAPPY_PATH.iter().take(6) {
            assert!(stage.can_transition_to(BridgeStage::Failed));
        }
        assert!(!BridgeStage::Completed.can_transition_to(BridgeStage::Failed));
        assert!(!BridgeStage::Failed.can_transition_to(BridgeStage::Failed));
    }

    #[test]
    fn test_terminal_stages() {
        assert!(BridgeStage::Completed.is_terminal());
        assert!(BridgeStage::Failed.is_terminal());
        assert!(!BridgeStage::Indexing.is_terminal());
    }

    #[test]
    fn test_post_lock_classification() {
        assert!(!BridgeStage::AwaitingLock.is_post_lock());
        assert!(BridgeStage::LockConfirmed.is_post_lock());
        assert!(BridgeStage::AwaitingRelease.is_post_lock());
    }
}
