//! Source-ledger access
//!
//! This module provides:
//! - Read-only Horizon gateway for account and transaction lookups
//! - Soroban RPC client for the simulate/prepare step
//!
//! Both boundaries are traits so the orchestrator can be exercised against
//! doubles.

pub mod horizon;
pub mod soroban;

pub use horizon::{AccountSnapshot, BalanceLine, HorizonGateway, LedgerGateway, TransactionRecord};
pub use soroban::{NetworkInfo, SimulationResponse, SorobanRpc, SorobanRpcClient};
