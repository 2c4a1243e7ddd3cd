//! Bridge transaction orchestrator
//!
//! Moves a native Stellar asset onto an EVM chain by locking it under a
//! bridge contract on the source ledger and asking a custodial
//! threshold-signing backend to index the lock event and release the
//! equivalent amount on the destination chain.
//!
//! The crate holds no keys and performs no signing; it builds the unsigned
//! lock transaction, drives the lock→index→release pipeline against the
//! remote collaborators, and produces either a verifiable [`BridgeResult`]
//! or a stage-tagged [`BridgeFailure`].

pub mod chain;
pub mod config;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod signer;
pub mod tx;
pub mod validate;

pub use chain::{
    AccountSnapshot, BalanceLine, HorizonGateway, LedgerGateway, NetworkInfo, SimulationResponse,
    SorobanRpc, SorobanRpcClient, TransactionRecord,
};
pub use config::{resolve, BridgeConfig};
pub use error::BridgeError;
pub use pipeline::{
    AttemptStatus, AttemptTracker, BridgeFailure, BridgeOrchestrator, BridgeProgress,
    BridgeRequest, BridgeResult, BridgeStage, OrchestratorConfig,
};
pub use signer::{CustodialSigner, HttpCustodialSigner, SignedLock};
pub use tx::{build_lock_transaction, encode_chain_id, LockTransaction};
