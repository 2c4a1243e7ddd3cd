//! The lock→index→release engine
//!
//! One call to [`BridgeOrchestrator::execute`] drives a single attempt as a
//! sequential pipeline of fallible async steps. Exactly one lock submission
//! happens per attempt; nothing is retried automatically after the lock is
//! on the source ledger, because re-locking would double-spend.

use crate::chain::{HorizonGateway, LedgerGateway, SorobanRpc, SorobanRpcClient};
use crate::config;
use crate::error::BridgeError;
use crate::metrics;
use crate::pipeline::attempt::{
    AttemptStatus, AttemptTracker, BridgeFailure, BridgeProgress, BridgeRequest, BridgeResult,
};
use crate::pipeline::stage::BridgeStage;
use crate::signer::CustodialSigner;
use crate::tx::build_lock_transaction;
use crate::validate;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};
use uuid::Uuid;

lazy_static! {
    static ref DEST_HASH_RE: Regex = Regex::new(r"^0x[0-9a-fA-F]+$").unwrap();
}

/// Tunables for one orchestrator instance
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound applied to every remote call
    pub call_timeout: Duration,
    /// Wait between lock confirmation and release, for source-chain finality
    pub settle_delay: Duration,
    /// Lookup attempts before a confirmed lock hash counts as unresolvable
    pub confirm_attempts: u32,
    /// Pause between confirmation lookups
    pub confirm_backoff: Duration,
    /// Compare the resolved passphrase against the live RPC before building
    pub verify_network: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(6),
            confirm_attempts: 5,
            confirm_backoff: Duration::from_secs(2),
            verify_network: false,
        }
    }
}

/// Context threaded through one attempt's pipeline steps
struct AttemptContext {
    attempt_id: Uuid,
    stage: BridgeStage,
    lock_hash: Option<String>,
}

/// Drives bridge attempts against the source ledger and the custodial
/// backend
pub struct BridgeOrchestrator {
    gateway: Arc<dyn LedgerGateway>,
    soroban: Arc<dyn SorobanRpc>,
    signer: Arc<dyn CustodialSigner>,
    config: OrchestratorConfig,
    progress_tx: broadcast::Sender<BridgeProgress>,
    tracker: AttemptTracker,
}

impl BridgeOrchestrator {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        soroban: Arc<dyn SorobanRpc>,
        signer: Arc<dyn CustodialSigner>,
        config: OrchestratorConfig,
    ) -> Self {
        let (progress_tx, _) = broadcast::channel(64);
        Self {
            gateway,
            soroban,
            signer,
            config,
            progress_tx,
            tracker: AttemptTracker::new(),
        }
    }

    /// Wire live Horizon and Soroban clients for the network serving
    /// `dest_chain`
    pub fn for_network(
        dest_chain: &str,
        signer: Arc<dyn CustodialSigner>,
        config: OrchestratorConfig,
    ) -> Self {
        let net = config::resolve(dest_chain);
        Self::new(
            Arc::new(HorizonGateway::new(net.horizon_url, net.network)),
            Arc::new(SorobanRpcClient::new(net.rpc_url)),
            signer,
            config,
        )
    }

    /// Subscribe to stage/progress events for all attempts on this
    /// orchestrator
    pub fn subscribe_progress(&self) -> broadcast::Receiver<BridgeProgress> {
        self.progress_tx.subscribe()
    }

    /// Live status of a known attempt
    pub fn attempt_status(&self, attempt_id: &Uuid) -> Option<AttemptStatus> {
        self.tracker.get(attempt_id)
    }

    pub fn tracker(&self) -> &AttemptTracker {
        &self.tracker
    }

    /// Run one bridge attempt to a terminal state.
    ///
    /// Callers must not start a second attempt for the same request while
    /// one is in flight; the orchestrator does not deduplicate.
    pub async fn execute(&self, request: BridgeRequest) -> Result<BridgeResult, BridgeFailure> {
        let attempt_id = Uuid::new_v4();
        let started = Instant::now();
        let mut ctx = AttemptContext {
            attempt_id,
            stage: BridgeStage::Validating,
            lock_hash: None,
        };

        self.tracker.record(attempt_id, &request.dest_chain);
        metrics::record_attempt_started(&request.dest_chain);
        self.emit(&ctx);

        info!(
            "Attempt {}: bridging {} {} to chain {} for {}",
            attempt_id, request.amount, request.from_token, request.dest_chain, request.user_address
        );

        if let Err(e) = validate::validate(&request) {
            return Err(self.fail(&mut ctx, &request, e));
        }

        let net = config::resolve(&request.dest_chain);

        self.advance(&mut ctx, BridgeStage::BuildingTransaction);

        if self.config.verify_network {
            match self
                .with_timeout("getNetwork", self.soroban.get_network())
                .await
            {
                Ok(live) if live.passphrase == net.network_passphrase => {}
                Ok(live) => {
                    return Err(self.fail(
                        &mut ctx,
                        &request,
                        BridgeError::Gateway(format!(
                            "network passphrase mismatch: expected {:?}, endpoint reports {:?}",
                            net.network_passphrase, live.passphrase
                        )),
                    ));
                }
                Err(e) => return Err(self.fail(&mut ctx, &request, e)),
            }
        }

        // Sequence numbers are single-use: fetch immediately before building
        let account = match self
            .with_timeout(
                "fetch account",
                self.gateway.fetch_account(&request.user_address),
            )
            .await
        {
            Ok(account) => account,
            Err(e) => return Err(self.fail(&mut ctx, &request, e)),
        };

        let lock_tx = match self
            .with_timeout(
                "build lock transaction",
                build_lock_transaction(&request, &net, &account, self.soroban.as_ref()),
            )
            .await
        {
            Ok(tx) => tx,
            Err(e) => return Err(self.fail(&mut ctx, &request, e)),
        };

        self.advance(&mut ctx, BridgeStage::AwaitingLock);

        // The single lock submission for this attempt
        let signed = match self
            .with_timeout(
                "lock on source",
                self.signer.lock_on_source(&lock_tx.envelope_xdr, net.network),
            )
            .await
        {
            Ok(signed) => signed,
            Err(e) => return Err(self.fail(&mut ctx, &request, e)),
        };

        ctx.lock_hash = Some(signed.hash.clone());
        self.tracker.set_lock_hash(&attempt_id, &signed.hash);
        self.advance(&mut ctx, BridgeStage::LockConfirmed);
        info!("Attempt {}: lock submitted as {}", attempt_id, signed.hash);

        let ledger = match self.confirm_lock(&signed.hash).await {
            Ok(ledger) => ledger,
            Err(e) => return Err(self.fail(&mut ctx, &request, e)),
        };

        self.advance(&mut ctx, BridgeStage::Indexing);
        info!(
            "Attempt {}: lock landed in ledger {}, settling for {:?}",
            attempt_id, ledger, self.config.settle_delay
        );
        sleep(self.config.settle_delay).await;

        self.advance(&mut ctx, BridgeStage::AwaitingRelease);
        let dest_hash = match self
            .with_timeout(
                "index and release",
                self.signer.index_and_release(ledger, &request.dest_chain),
            )
            .await
        {
            Ok(hash) => hash.trim().to_string(),
            Err(e) => return Err(self.fail(&mut ctx, &request, e)),
        };

        if !dest_hash.starts_with(net.dest_address_prefix) || !DEST_HASH_RE.is_match(&dest_hash) {
            return Err(self.fail(
                &mut ctx,
                &request,
                BridgeError::Release(format!(
                    "backend returned malformed destination hash {:?}",
                    dest_hash
                )),
            ));
        }

        self.advance(&mut ctx, BridgeStage::Completed);
        metrics::record_attempt_completed(&request.dest_chain, started.elapsed().as_secs_f64());
        info!(
            "Attempt {}: released as {} on chain {}",
            attempt_id, dest_hash, request.dest_chain
        );

        Ok(BridgeResult {
            attempt_id,
            success: true,
            source_tx_hash: signed.hash.clone(),
            dest_tx_hash: dest_hash.clone(),
            source_explorer_url: config::source_explorer_url(net.network, &signed.hash),
            dest_explorer_url: config::dest_explorer_url(&request.dest_chain, &dest_hash),
            amount: request.amount.clone(),
            token: request.dest_token.clone(),
            recipient: request.recipient_address.clone(),
            dest_chain: request.dest_chain.clone(),
            completed_at: Utc::now(),
        })
    }

    /// Resolve the ledger a submitted lock landed in, with bounded retries
    async fn confirm_lock(&self, hash: &str) -> Result<u32, BridgeError> {
        let mut last_error = None;
        for attempt in 0..self.config.confirm_attempts {
            if attempt > 0 {
                sleep(self.config.confirm_backoff).await;
            }
            match self
                .with_timeout("fetch lock transaction", self.gateway.fetch_transaction(hash))
                .await
            {
                Ok(record) => return Ok(record.ledger),
                Err(e) => {
                    warn!(
                        "Lock {} not yet visible ({}/{}): {}",
                        hash,
                        attempt + 1,
                        self.config.confirm_attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(BridgeError::Confirmation(format!(
            "could not resolve ledger for lock {} after {} attempts: {}",
            hash,
            self.config.confirm_attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn emit(&self, ctx: &AttemptContext) {
        if let Some(percent) = ctx.stage.progress() {
            let _ = self.progress_tx.send(BridgeProgress {
                attempt_id: ctx.attempt_id,
                stage: ctx.stage,
                percent,
            });
        }
    }

    fn advance(&self, ctx: &mut AttemptContext, next: BridgeStage) {
        debug_assert!(
            ctx.stage.can_transition_to(next),
            "illegal transition {} -> {}",
            ctx.stage.name(),
            next.name()
        );
        ctx.stage = next;
        self.tracker.update_stage(&ctx.attempt_id, next);
        self.emit(ctx);
        info!("Attempt {} -> {}", ctx.attempt_id, next.name());
    }

    fn fail(
        &self,
        ctx: &mut AttemptContext,
        request: &BridgeRequest,
        error: BridgeError,
    ) -> BridgeFailure {
        let stage_reached = ctx.stage;
        ctx.stage = BridgeStage::Failed;
        self.tracker.update_stage(&ctx.attempt_id, BridgeStage::Failed);
        metrics::record_attempt_failed(&request.dest_chain, stage_reached.name());

        // Progress stays pinned at the last checkpoint reached
        let _ = self.progress_tx.send(BridgeProgress {
            attempt_id: ctx.attempt_id,
            stage: BridgeStage::Failed,
            percent: stage_reached.progress().unwrap_or(0),
        });

        let lock_explorer_url = ctx.lock_hash.as_ref().map(|hash| {
            config::source_explorer_url(config::resolve(&request.dest_chain).network, hash)
        });

        error!(
            "Attempt {} failed at {}: {}{}",
            ctx.attempt_id,
            stage_reached.name(),
            error,
            ctx.lock_hash
                .as_deref()
                .map(|h| format!(" (funds locked in {}, release pending)", h))
                .unwrap_or_default()
        );

        BridgeFailure {
            attempt_id: ctx.attempt_id,
            stage: stage_reached,
            error,
            lock_hash: ctx.lock_hash.clone(),
            lock_explorer_url,
        }
    }

    async fn with_timeout<T, F>(&self, operation: &str, fut: F) -> Result<T, BridgeError>
    where
        F: Future<Output = Result<T, BridgeError>>,
    {
        match timeout(self.config.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::Timeout {
                operation: operation.to_string(),
            }),
        }
    }
}
