//! Custodial backend client
//!
//! The backend holds the threshold-signing machinery; this module only
//! speaks its RPC contract. Two operations exist: sign-and-submit the lock
//! on the source ledger, and index-and-release on the destination chain.

use crate::error::{BridgeError, Result};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A lock transaction the backend signed and submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedLock {
    /// Source-ledger transaction hash of the lock
    pub hash: String,
    /// Raw signed envelope as returned by the backend
    pub raw: String,
}

/// The custodial backend's RPC surface
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustodialSigner: Send + Sync {
    /// Ask the backend to sign and submit an unsigned lock envelope.
    /// The orchestrator calls this at most once per attempt.
    async fn lock_on_source(&self, envelope_xdr: &str, network: &str) -> Result<SignedLock>;

    /// Ask the backend to observe the lock event at the given ledger index
    /// and execute the release on the destination chain. Returns the
    /// destination transaction hash.
    async fn index_and_release(&self, ledger: u32, dest_chain: &str) -> Result<String>;
}

/// HTTP implementation of [`CustodialSigner`]
pub struct HttpCustodialSigner {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct LockRequest<'a> {
    transaction_xdr: &'a str,
    network: &'a str,
}

#[derive(Deserialize)]
struct LockResponse {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    raw: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Serialize)]
struct ReleaseRequest<'a> {
    ledger: u32,
    dest_chain: &'a str,
}

#[derive(Deserialize)]
struct ReleaseResponse {
    #[serde(default)]
    dest_tx_hash: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl HttpCustodialSigner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Custodial backend POST {}", url);

        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| BridgeError::Network(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Network(format!("{} returned {}", url, status)));
        }

        response
            .json()
            .await
            .map_err(|e| BridgeError::Network(format!("malformed response from {}: {}", url, e)))
    }
}

#[async_trait]
impl CustodialSigner for HttpCustodialSigner {
    async fn lock_on_source(&self, envelope_xdr: &str, network: &str) -> Result<SignedLock> {
        let body = LockRequest {
            transaction_xdr: envelope_xdr,
            network,
        };
        let response: LockResponse = self.post("/bridge/lock", &body).await?;

        if let Some(error) = response.error {
            return Err(BridgeError::Signing(error));
        }
        match (response.hash, response.raw) {
            (Some(hash), raw) if !hash.is_empty() => Ok(SignedLock {
                hash,
                raw: raw.unwrap_or_default(),
            }),
            _ => Err(BridgeError::Signing(
                "backend returned no lock transaction hash".into(),
            )),
        }
    }

    async fn index_and_release(&self, ledger: u32, dest_chain: &str) -> Result<String> {
        let body = ReleaseRequest { ledger, dest_chain };
        let response: ReleaseResponse = self.post("/bridge/release", &body).await?;

        if let Some(error) = response.error {
            return Err(BridgeError::Release(error));
        }
        response
            .dest_tx_hash
            .filter(|h| !h.is_empty())
            .ok_or_else(|| BridgeError::Release("backend returned no destination hash".into()))
    }
}
