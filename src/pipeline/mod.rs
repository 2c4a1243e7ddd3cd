//! Bridge pipeline orchestration
//!
//! The pipeline:
//! 1. Validates the request locally
//! 2. Builds and prepares the unsigned lock transaction
//! 3. Hands it to the custodial backend for signing and submission
//! 4. Confirms the lock landed and recovers its ledger index
//! 5. Waits out the settling delay, then triggers index-and-release
//! 6. Assembles a terminal result or a stage-tagged failure

pub mod attempt;
pub mod orchestrator;
pub mod stage;

pub use attempt::{
    AttemptStatus, AttemptTracker, BridgeFailure, BridgeProgress, BridgeRequest, BridgeResult,
};
pub use orchestrator::{BridgeOrchestrator, OrchestratorConfig};
pub use stage::BridgeStage;
