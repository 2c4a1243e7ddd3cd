//! Soroban JSON-RPC client
//!
//! Covers the two methods the pipeline needs: `getNetwork` as a
//! configuration sanity check, and `simulateTransaction` as the
//! dry-run/prepare step for the lock invocation.

use crate::error::{BridgeError, Result};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// Network identity reported by the RPC endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkInfo {
    pub passphrase: String,
}

/// Result of simulating a transaction against the live ledger
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    /// Present when the ledger refused the transaction
    #[serde(default)]
    pub error: Option<String>,
    /// Base64 `SorobanTransactionData` (footprint + resources) to fold into
    /// the envelope
    #[serde(default)]
    pub transaction_data: Option<String>,
    /// Resource fee in stroops, as a decimal string
    #[serde(default)]
    pub min_resource_fee: Option<String>,
    #[serde(default)]
    pub results: Vec<SimulationResult>,
    #[serde(default)]
    pub latest_ledger: u32,
}

/// Per-invocation simulation output
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationResult {
    /// Base64 `SorobanAuthorizationEntry` values required by the invocation
    #[serde(default)]
    pub auth: Vec<String>,
    #[serde(default)]
    pub xdr: Option<String>,
}

/// Soroban RPC operations used by the transaction builder and orchestrator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SorobanRpc: Send + Sync {
    /// Fetch the network identity of the endpoint
    async fn get_network(&self) -> Result<NetworkInfo>;

    /// Dry-run an unsigned envelope against the current ledger state
    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulationResponse>;
}

/// JSON-RPC 2.0 client for a Soroban endpoint
pub struct SorobanRpcClient {
    http: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct RpcRequest<T: Serialize> {
    jsonrpc: &'static str,
    id: u32,
    method: &'static str,
    params: T,
}

#[derive(Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct RpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Serialize)]
struct SimulateParams {
    transaction: String,
}

impl SorobanRpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &'static str,
        params: P,
    ) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        debug!("Soroban RPC {} -> {}", method, self.url);

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BridgeError::Network(format!("{}: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(BridgeError::Gateway(format!(
                "{} returned {}",
                method,
                response.status()
            )));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| BridgeError::Gateway(format!("malformed {} response: {}", method, e)))?;

        if let Some(err) = body.error {
            return Err(BridgeError::Gateway(format!(
                "{} failed: {} (code {})",
                method, err.message, err.code
            )));
        }

        body.result
            .ok_or_else(|| BridgeError::Gateway(format!("{} returned no result", method)))
    }
}

#[async_trait]
impl SorobanRpc for SorobanRpcClient {
    async fn get_network(&self) -> Result<NetworkInfo> {
        self.call("getNetwork", serde_json::json!({})).await
    }

    async fn simulate_transaction(&self, envelope_xdr: &str) -> Result<SimulationResponse> {
        self.call(
            "simulateTransaction",
            SimulateParams {
                transaction: envelope_xdr.to_string(),
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulation_response_parsing() {
        let raw = r#"{
            "transactionData": "AAAA",
            "minResourceFee": "58181",
            "results": [{"auth": ["BBBB"], "xdr": "CCCC"}],
            "latestLedger": 1234
        }"#;
        let parsed: SimulationResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.error.is_none());
        assert_eq!(parsed.transaction_data.as_deref(), Some("AAAA"));
        assert_eq!(parsed.min_resource_fee.as_deref(), Some("58181"));
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].auth, vec!["BBBB".to_string()]);
        assert_eq!(parsed.latest_ledger, 1234);
    }

    #[test]
    fn test_simulation_error_parsing() {
        let raw = r#"{"error": "host invocation failed", "latestLedger": 9}"#;
        let parsed: SimulationResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("host invocation failed"));
        assert!(parsed.results.is_empty());
    }
}
