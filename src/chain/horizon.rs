//! Horizon REST gateway for source-ledger reads
//!
//! Account snapshots are fetched fresh immediately before each transaction
//! build; sequence numbers are single-use and must never be cached across
//! attempts.

use crate::error::{BridgeError, Result};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Account state at a point in time
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    /// Current sequence number; the next transaction must use sequence + 1
    pub sequence: i64,
    /// Balance lines as reported by the ledger
    pub balances: Vec<BalanceLine>,
}

/// One balance line on an account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceLine {
    pub balance: String,
    pub asset_type: String,
}

/// A transaction as recorded on the source ledger
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    /// Ledger the transaction was included in
    pub ledger: u32,
    /// Raw envelope XDR as stored by the ledger
    pub envelope_xdr: String,
}

/// Read-only source-ledger lookups. All operations are idempotent and safe
/// to retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Fetch the current state of an account
    async fn fetch_account(&self, address: &str) -> Result<AccountSnapshot>;

    /// Look up a transaction by hash, recovering the ledger it landed in
    async fn fetch_transaction(&self, hash: &str) -> Result<TransactionRecord>;
}

/// Horizon-backed implementation of [`LedgerGateway`]
pub struct HorizonGateway {
    http: reqwest::Client,
    base_url: String,
    network: String,
}

#[derive(Deserialize)]
struct AccountResponse {
    sequence: String,
    #[serde(default)]
    balances: Vec<BalanceLine>,
}

#[derive(Deserialize)]
struct TransactionResponse {
    ledger: u32,
    #[serde(default)]
    envelope_xdr: String,
}

impl HorizonGateway {
    pub fn new(base_url: impl Into<String>, network: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            network: network.into(),
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Horizon GET {}", url);
        self.http
            .get(&url)
            .send()
            .await
            .map_err(|e| BridgeError::Network(format!("{}: {}", url, e)))
    }
}

#[async_trait]
impl LedgerGateway for HorizonGateway {
    async fn fetch_account(&self, address: &str) -> Result<AccountSnapshot> {
        let response = self.get(&format!("/accounts/{}", address)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(BridgeError::AccountNotFound {
                address: address.to_string(),
                network: self.network.clone(),
            });
        }
        if !response.status().is_success() {
            return Err(BridgeError::Gateway(format!(
                "account fetch returned {}",
                response.status()
            )));
        }

        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Gateway(format!("malformed account response: {}", e)))?;

        let sequence = account
            .sequence
            .parse::<i64>()
            .map_err(|e| BridgeError::Gateway(format!("bad sequence number: {}", e)))?;

        Ok(AccountSnapshot {
            sequence,
            balances: account.balances,
        })
    }

    async fn fetch_transaction(&self, hash: &str) -> Result<TransactionRecord> {
        let response = self.get(&format!("/transactions/{}", hash)).await?;

        if !response.status().is_success() {
            return Err(BridgeError::Gateway(format!(
                "transaction {} lookup returned {}",
                hash,
                response.status()
            )));
        }

        let tx: TransactionResponse = response
            .json()
            .await
            .map_err(|e| BridgeError::Gateway(format!("malformed transaction response: {}", e)))?;

        Ok(TransactionRecord {
            ledger: tx.ledger,
            envelope_xdr: tx.envelope_xdr,
        })
    }
}
