//! Static network configuration for the bridge
//!
//! Maps a destination chain id to the matching Stellar-side deployment
//! (bridge contract, RPC endpoints, passphrase) and the destination-side
//! explorer templates. The tables are compiled in; there is nothing to load
//! at runtime.

use serde::Serialize;
use tracing::warn;

/// Holesky-like EVM testnet, bridged from the Stellar testnet deployment
pub const CHAIN_HOLESKY: &str = "17000";
/// Base-like EVM mainnet, bridged from the Stellar pubnet deployment
pub const CHAIN_BASE: &str = "8453";

/// The single supported source asset
pub const SOURCE_TOKEN: &str = "XLM";

/// Stroops per whole unit of the native asset
pub const STROOPS_PER_UNIT: i128 = 10_000_000;

// Bridge contract deployments per network
const TESTNET_BRIDGE_CONTRACT: &str = "CDTA5IYGUGRI4PAGXJL7TPBEIC3EZY6V23ILF5EDVXFVLCGGMVOK4CRL";
const PUBNET_BRIDGE_CONTRACT: &str = "CDMHKRFQPMCBZFY225BNLNXA6YRTOCDD2VDC2AXC4YP3XCYMLYZAHWDS";

// Native asset (Stellar Asset Contract) ids per network
const TESTNET_NATIVE_CONTRACT: &str = "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC";
const PUBNET_NATIVE_CONTRACT: &str = "CAS3J7GYLGXMF6TDJBBYYSE3HQ6BBSMLNUQ34T6TZMYMW2EVH34XOWMA";

// RPC and Horizon endpoints per network
const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";
const PUBNET_RPC_URL: &str = "https://soroban-mainnet.stellar.org";
const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";
const PUBNET_HORIZON_URL: &str = "https://horizon.stellar.org";

const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
const PUBNET_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Resolved configuration for one bridge attempt
///
/// Read-only for the lifetime of the attempt.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeConfig {
    /// Stellar-side network name ("testnet" or "pubnet")
    pub network: &'static str,
    /// Bridge contract receiving the lock invocation
    pub bridge_contract_id: &'static str,
    /// Native asset contract on the same network
    pub native_contract_id: &'static str,
    /// Soroban RPC endpoint (simulate/prepare)
    pub rpc_url: &'static str,
    /// Horizon endpoint (account and transaction reads)
    pub horizon_url: &'static str,
    /// Network passphrase the built envelope is scoped to
    pub network_passphrase: &'static str,
    /// Destination chain display name
    pub dest_chain_name: &'static str,
    /// Address/hash prefix expected from the destination chain
    pub dest_address_prefix: &'static str,
}

/// Resolve the configuration for a destination chain id.
///
/// Total over all inputs: unknown chain ids fall back to the testnet
/// deployment rather than failing. Callers relying on a specific network
/// must validate the chain id first.
pub fn resolve(dest_chain: &str) -> BridgeConfig {
    match dest_chain {
        CHAIN_HOLESKY => BridgeConfig {
            network: "testnet",
            bridge_contract_id: TESTNET_BRIDGE_CONTRACT,
            native_contract_id: TESTNET_NATIVE_CONTRACT,
            rpc_url: TESTNET_RPC_URL,
            horizon_url: TESTNET_HORIZON_URL,
            network_passphrase: TESTNET_PASSPHRASE,
            dest_chain_name: "Holesky",
            dest_address_prefix: "0x",
        },
        CHAIN_BASE => BridgeConfig {
            network: "pubnet",
            bridge_contract_id: PUBNET_BRIDGE_CONTRACT,
            native_contract_id: PUBNET_NATIVE_CONTRACT,
            rpc_url: PUBNET_RPC_URL,
            horizon_url: PUBNET_HORIZON_URL,
            network_passphrase: PUBNET_PASSPHRASE,
            dest_chain_name: "Base",
            dest_address_prefix: "0x",
        },
        other => {
            warn!("Unknown destination chain {}, falling back to testnet", other);
            resolve(CHAIN_HOLESKY)
        }
    }
}

/// Check whether a destination chain id is in the supported set
pub fn is_supported_chain(dest_chain: &str) -> bool {
    matches!(dest_chain, CHAIN_HOLESKY | CHAIN_BASE)
}

/// Check whether a source token is supported
pub fn is_supported_source_token(token: &str) -> bool {
    token == SOURCE_TOKEN
}

/// Destination chain a destination token settles on, if the token is
/// supported (the token/chain mapping is fixed 1:1)
pub fn chain_for_dest_token(token: &str) -> Option<&'static str> {
    match token {
        "HOLSKEY" => Some(CHAIN_HOLESKY),
        "BASE" => Some(CHAIN_BASE),
        _ => None,
    }
}

/// Explorer URL for a destination-chain transaction hash.
///
/// Unknown chain ids resolve to a plain `tx://` placeholder rather than a
/// browsable explorer link.
pub fn dest_explorer_url(dest_chain: &str, hash: &str) -> String {
    match dest_chain {
        CHAIN_HOLESKY => format!("https://holesky.etherscan.io/tx/{}", hash),
        CHAIN_BASE => format!("https://basescan.org/tx/{}", hash),
        other => format!("tx://{}/{}", other, hash),
    }
}

/// Explorer URL for a source-ledger transaction hash
pub fn source_explorer_url(network: &str, hash: &str) -> String {
    match network {
        "pubnet" => format!("https://stellar.expert/explorer/public/tx/{}", hash),
        _ => format!("https://stellar.expert/explorer/testnet/tx/{}", hash),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_chains() {
        let holesky = resolve(CHAIN_HOLESKY);
        assert_eq!(holesky.network, "testnet");
        assert_eq!(holesky.bridge_contract_id, TESTNET_BRIDGE_CONTRACT);
        assert_eq!(holesky.network_passphrase, TESTNET_PASSPHRASE);

        let base = resolve(CHAIN_BASE);
        assert_eq!(base.network, "pubnet");
        assert_eq!(base.rpc_url, PUBNET_RPC_URL);
        assert_eq!(base.dest_chain_name, "Base");
    }

    #[test]
    fn test_resolve_unknown_falls_back_to_testnet() {
        let cfg = resolve("999999");
        assert_eq!(cfg.network, "testnet");
        assert_eq!(cfg.bridge_contract_id, TESTNET_BRIDGE_CONTRACT);
    }

    #[test]
    fn test_token_chain_mapping() {
        assert_eq!(chain_for_dest_token("HOLSKEY"), Some(CHAIN_HOLESKY));
        assert_eq!(chain_for_dest_token("BASE"), Some(CHAIN_BASE));
        assert_eq!(chain_for_dest_token("WETH"), None);
    }

    #[test]
    fn test_dest_explorer_urls() {
        let url = dest_explorer_url("17000", "0xabc");
        assert!(url.contains("holesky"));
        assert!(url.ends_with("/tx/0xabc"));

        let url = dest_explorer_url("8453", "0xdef");
        assert!(url.contains("basescan"));

        let url = dest_explorer_url("1", "0x123");
        assert_eq!(url, "tx://1/0x123");
    }

    #[test]
    fn test_source_explorer_urls() {
        assert!(source_explorer_url("testnet", "cafe").contains("/testnet/tx/cafe"));
        assert!(source_explorer_url("pubnet", "cafe").contains("/public/tx/cafe"));
    }
}
