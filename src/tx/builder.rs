//! Builds the unsigned lock invocation for the bridge contract
//!
//! The envelope is assembled twice: once bare for simulation, then again
//! with the footprint, resource fee and authorization entries the simulate
//! step reports. The returned transaction is still unsigned; signing is the
//! custodial backend's job.

use crate::chain::{AccountSnapshot, SimulationResponse, SorobanRpc};
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::pipeline::BridgeRequest;
use crate::validate::parse_native_amount;

use std::time::{SystemTime, UNIX_EPOCH};

use stellar_xdr::curr::{
    AccountId, Hash, HostFunction, Int128Parts, InvokeContractArgs, InvokeHostFunctionOp, Limits,
    Memo, MuxedAccount, Operation, OperationBody, Preconditions, PublicKey, ReadXdr, ScAddress,
    ScBytes, ScString, ScSymbol, ScVal, SequenceNumber, SorobanAuthorizationEntry,
    SorobanTransactionData, TimeBounds, TimePoint, Transaction, TransactionEnvelope,
    TransactionExt, TransactionV1Envelope, Uint256, WriteXdr,
};
use tracing::{debug, info};

/// Fixed base fee per operation, in stroops
pub const BASE_FEE_STROOPS: u32 = 100;

/// How long the built envelope stays valid before the ledger rejects it
const VALIDITY_WINDOW_SECS: u64 = 300;

const LOCK_FUNCTION: &str = "lock";

/// An unsigned, prepared lock transaction.
///
/// Owned by exactly one in-flight attempt. The embedded sequence number is
/// single-use, so the value must never be reused across attempts.
#[derive(Debug, Clone)]
pub struct LockTransaction {
    /// Base64 XDR of the prepared, unsigned envelope
    pub envelope_xdr: String,
    /// Bridge contract the invocation targets
    pub contract_id: String,
    /// Invoked contract function
    pub function: String,
    /// Sequence number consumed by this envelope
    pub sequence: i64,
    /// Amount in stroops carried by the invocation
    pub amount_stroops: i128,
    /// Passphrase of the network the envelope is scoped to
    pub network_passphrase: String,
}

/// Build and prepare the lock transaction for a validated request.
///
/// The account snapshot must come from a fetch performed immediately before
/// this call; a stale sequence number makes the envelope unsubmittable.
pub async fn build_lock_transaction(
    request: &BridgeRequest,
    config: &BridgeConfig,
    account: &AccountSnapshot,
    soroban: &dyn SorobanRpc,
) -> Result<LockTransaction> {
    let user_key = stellar_strkey::ed25519::PublicKey::from_string(&request.user_address)
        .map_err(|e| {
            BridgeError::InvalidAddress(format!(
                "account {} is not a valid ed25519 address: {:?}",
                request.user_address, e
            ))
        })?;

    let amount_stroops = parse_native_amount(&request.amount)?;
    let args = lock_args(request, config, &user_key, amount_stroops)?;

    let sequence = account
        .sequence
        .checked_add(1)
        .ok_or_else(|| BridgeError::Serialization("sequence number overflow".into()))?;

    // Bare envelope for the dry run
    let tx = lock_transaction(
        &user_key,
        sequence,
        BASE_FEE_STROOPS,
        args.clone(),
        Vec::new(),
        TransactionExt::V0,
    )?;
    let envelope_xdr = encode_envelope(tx)?;

    debug!(
        "Simulating lock of {} stroops against {}",
        amount_stroops, config.bridge_contract_id
    );
    let simulation = soroban.simulate_transaction(&envelope_xdr).await?;
    if let Some(error) = simulation.error {
        return Err(BridgeError::SimulationRejected(error));
    }

    // Fold the simulation output back into the envelope
    let (fee, ext) = prepared_fee_and_ext(&simulation)?;
    let auth = decode_auth_entries(&simulation)?;
    let prepared = lock_transaction(&user_key, sequence, fee, args, auth, ext)?;
    let envelope_xdr = encode_envelope(prepared)?;

    info!(
        "Built lock transaction: contract {} seq {} fee {}",
        config.bridge_contract_id, sequence, fee
    );

    Ok(LockTransaction {
        envelope_xdr,
        contract_id: config.bridge_contract_id.to_string(),
        function: LOCK_FUNCTION.to_string(),
        sequence,
        amount_stroops,
        network_passphrase: config.network_passphrase.to_string(),
    })
}

/// Encode a destination chain id as contract-call bytes: hex-decoded when
/// the string is valid hex, otherwise its UTF-8 bytes. The fallback is
/// deliberate, not an error.
pub fn encode_chain_id(dest_chain: &str) -> Vec<u8> {
    match hex::decode(dest_chain) {
        Ok(bytes) => bytes,
        Err(_) => dest_chain.as_bytes().to_vec(),
    }
}

fn xdr_err(e: stellar_xdr::curr::Error) -> BridgeError {
    BridgeError::Serialization(e.to_string())
}

fn contract_address(contract_id: &str) -> Result<ScAddress> {
    let contract = stellar_strkey::Contract::from_string(contract_id).map_err(|e| {
        BridgeError::InvalidAddress(format!(
            "contract {} is not a valid contract id: {:?}",
            contract_id, e
        ))
    })?;
    Ok(ScAddress::Contract(Hash(contract.0)))
}

/// Ordered arguments of the `lock` invocation. The order is part of the
/// contract's ABI and must not change.
fn lock_args(
    request: &BridgeRequest,
    config: &BridgeConfig,
    user_key: &stellar_strkey::ed25519::PublicKey,
    amount_stroops: i128,
) -> Result<InvokeContractArgs> {
    let user_address = ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(
        user_key.0,
    ))));
    let token_address = contract_address(config.native_contract_id)?;

    let dest_token: ScString = ScString(request.dest_token.as_str().try_into().map_err(xdr_err)?);
    let amount = ScVal::I128(Int128Parts {
        hi: (amount_stroops >> 64) as i64,
        lo: amount_stroops as u64,
    });
    let dest_chain = ScVal::Bytes(ScBytes(
        encode_chain_id(&request.dest_chain)
            .try_into()
            .map_err(xdr_err)?,
    ));
    let recipient: ScString = ScString(
        request
            .recipient_address
            .as_str()
            .try_into()
            .map_err(xdr_err)?,
    );

    Ok(InvokeContractArgs {
        contract_address: contract_address(config.bridge_contract_id)?,
        function_name: ScSymbol(LOCK_FUNCTION.try_into().map_err(xdr_err)?),
        args: vec![
            ScVal::Address(user_address),
            ScVal::Address(token_address),
            ScVal::String(dest_token),
            amount,
            dest_chain,
            ScVal::String(recipient),
        ]
        .try_into()
        .map_err(xdr_err)?,
    })
}

fn lock_transaction(
    user_key: &stellar_strkey::ed25519::PublicKey,
    sequence: i64,
    fee: u32,
    args: InvokeContractArgs,
    auth: Vec<SorobanAuthorizationEntry>,
    ext: TransactionExt,
) -> Result<Transaction> {
    let operation = Operation {
        source_account: None,
        body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
            host_function: HostFunction::InvokeContract(args),
            auth: auth.try_into().map_err(xdr_err)?,
        }),
    };

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(Transaction {
        source_account: MuxedAccount::Ed25519(Uint256(user_key.0)),
        fee,
        seq_num: SequenceNumber(sequence),
        cond: Preconditions::Time(TimeBounds {
            min_time: TimePoint(0),
            max_time: TimePoint(now + VALIDITY_WINDOW_SECS),
        }),
        memo: Memo::None,
        operations: vec![operation].try_into().map_err(xdr_err)?,
        ext,
    })
}

fn encode_envelope(tx: Transaction) -> Result<String> {
    let envelope = TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: Default::default(),
    });
    envelope.to_xdr_base64(Limits::none()).map_err(xdr_err)
}

fn prepared_fee_and_ext(simulation: &SimulationResponse) -> Result<(u32, TransactionExt)> {
    let resource_fee: u64 = simulation
        .min_resource_fee
        .as_deref()
        .unwrap_or("0")
        .parse()
        .map_err(|e| BridgeError::Serialization(format!("bad minResourceFee: {}", e)))?;
    let fee = (BASE_FEE_STROOPS as u64)
        .saturating_add(resource_fee)
        .min(u32::MAX as u64) as u32;

    let ext = match simulation.transaction_data.as_deref() {
        Some(data) if !data.is_empty() => {
            let data =
                SorobanTransactionData::from_xdr_base64(data, Limits::none()).map_err(xdr_err)?;
            TransactionExt::V1(data)
        }
        _ => TransactionExt::V0,
    };

    Ok((fee, ext))
}

fn decode_auth_entries(simulation: &SimulationResponse) -> Result<Vec<SorobanAuthorizationEntry>> {
    let mut entries = Vec::new();
    if let Some(result) = simulation.results.first() {
        for raw in &result.auth {
            let entry =
                SorobanAuthorizationEntry::from_xdr_base64(raw, Limits::none()).map_err(xdr_err)?;
            entries.push(entry);
        }
    }
    Ok(entries)
}
