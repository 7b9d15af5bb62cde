use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use alloy::{
    primitives::{Address, TxHash, U256},
    rpc::types::TransactionReceipt,
};
use alloy_sol_types::SolEvent;
use tracing::{debug, warn};

use crate::{
    Chain,
    abi::oracle::ValuationOracle,
    binding::{BindingManager, OracleBinding},
    error::OracleError,
    provider::WalletProvider,
    session::{InitOutcome, Session, SessionManager},
    types::{CollectionStats, Fees, ValuationRecord, ValuationRequest},
};

const RECEIPT_INTERVAL: Duration = Duration::from_secs(2);

/// Entry point tying the session, the binding and the contract surface
/// together.
///
/// Every session transition runs through [`reconcile`](Self::reconcile),
/// which rebuilds or tears down the binding so contract calls always go
/// out under the account the wallet currently exposes. Writes are
/// single-flight; reads run freely and are discarded if the binding they
/// started under is superseded before they land.
#[derive(Debug)]
pub struct OracleClient {
    chain: Chain,
    session: SessionManager,
    binding: BindingManager,
    write_pending: AtomicBool,
    reads_in_flight: AtomicUsize,
    receipt_interval: Duration,
}

impl OracleClient {
    /// Client for `chain`. `None` models a host without an injected
    /// wallet; every operation then reports [`OracleError::ProviderAbsent`]
    /// or stays disconnected instead of panicking.
    pub fn new(chain: Chain, provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            chain,
            session: SessionManager::new(provider),
            binding: BindingManager::default(),
            write_pending: AtomicBool::new(false),
            reads_in_flight: AtomicUsize::new(0),
            receipt_interval: RECEIPT_INTERVAL,
        }
    }

    /// Overrides how long to wait between receipt probes after a
    /// submission.
    pub fn with_receipt_interval(mut self, interval: Duration) -> Self {
        self.receipt_interval = interval;
        self
    }

    pub fn chain(&self) -> &Chain { &self.chain }

    /// Current session snapshot.
    pub fn session(&self) -> Session { self.session.session() }

    /// Whether any contract traffic is in flight.
    pub fn loading(&self) -> bool {
        self.write_pending.load(Ordering::Acquire)
            || self.reads_in_flight.load(Ordering::Acquire) > 0
    }

    /// Detects the provider and restores a previously authorized session
    /// if the wallet still exposes one.
    pub async fn initialize(&self) -> Result<InitOutcome, OracleError> {
        let outcome = self.session.initialize().await?;
        self.reconcile();
        Ok(outcome)
    }

    /// Prompts the wallet for access and binds the granted account.
    pub async fn connect(&self) -> Result<Session, OracleError> {
        let result = self.session.connect().await;
        self.reconcile();
        result
    }

    /// Clears the session and tears the binding down.
    pub fn disconnect(&self) -> Session {
        let session = self.session.disconnect();
        self.reconcile();
        session
    }

    /// Asks the wallet to move to `chain_id`. The session updates when
    /// the wallet's `chainChanged` notification comes back, not here.
    pub async fn switch_network(&self, chain_id: u64) -> Result<(), OracleError> {
        self.session.switch_network(chain_id).await
    }

    /// Releases the provider subscription and clears all session state.
    pub fn shutdown(&self) -> Session {
        let session = self.session.shutdown();
        self.reconcile();
        session
    }

    /// Applies queued wallet notifications in arrival order, then brings
    /// the binding in line with whatever session they produced. Returns
    /// the number of notifications applied.
    pub fn process_pending_events(&self) -> usize {
        let processed = self.session.process_pending_events();
        if processed > 0 {
            self.reconcile();
            self.warn_unsupported_chain();
        }
        processed
    }

    /// Validates, encodes and submits a valuation, then polls until the
    /// transaction is mined. `sleep` paces the receipt probes.
    ///
    /// Only one write may be in flight at a time; a second call while one
    /// is pending fails fast with [`OracleError::WriteInFlight`]. A
    /// submission that confirms is reported even if the signer changed
    /// while it was pending: the chain already recorded it.
    pub async fn submit_valuation<S, SFut>(
        &self,
        request: &ValuationRequest,
        sleep: S,
    ) -> Result<TxHash, OracleError>
    where
        S: Fn(Duration) -> SFut + Copy,
        SFut: Future<Output = ()>,
    {
        let call = request.encode()?;
        let _guard = self.acquire_write()?;
        let binding = self.binding.current()?;
        debug!(
            collection = %request.collection,
            token = %call.tokenId,
            signer = %binding.signer(),
            "submitting valuation"
        );

        let hash = binding.submit_valuation(call).await?;
        let receipt = self.await_confirmation(&binding, hash, sleep).await?;
        if !receipt.inner.status() {
            return Err(OracleError::ContractRevert(format!(
                "submission {hash} reverted on-chain"
            )));
        }
        for log in receipt.inner.logs() {
            if let Ok(event) = ValuationOracle::ValuationSubmitted::decode_log_data(&log.inner.data)
            {
                debug!(id = %event.valuationId, value = %event.estimatedValue, "valuation accepted");
            }
        }
        Ok(hash)
    }

    /// Latest valuation for a token, or `None` when the oracle has no
    /// record of it.
    pub async fn current_valuation(
        &self,
        collection: Address,
        token_id: U256,
    ) -> Result<Option<ValuationRecord>, OracleError> {
        let _guard = self.track_read();
        let binding = self.binding.current()?;
        let raw = binding.current_valuation(collection, token_id).await?;
        self.ensure_current(&binding)?;
        Ok(ValuationRecord::decode(raw))
    }

    /// Every valuation ever recorded for a token, oldest first.
    pub async fn valuation_history(
        &self,
        collection: Address,
        token_id: U256,
    ) -> Result<Vec<ValuationRecord>, OracleError> {
        let _guard = self.track_read();
        let binding = self.binding.current()?;
        let raw = binding.valuation_history(collection, token_id).await?;
        self.ensure_current(&binding)?;
        Ok(raw.into_iter().filter_map(ValuationRecord::decode).collect())
    }

    pub async fn collection_stats(
        &self,
        collection: Address,
    ) -> Result<CollectionStats, OracleError> {
        let _guard = self.track_read();
        let binding = self.binding.current()?;
        let raw = binding.collection_stats(collection).await?;
        self.ensure_current(&binding)?;
        Ok(CollectionStats::decode(raw))
    }

    pub async fn is_authorized_valuator(&self, valuator: Address) -> Result<bool, OracleError> {
        let _guard = self.track_read();
        let binding = self.binding.current()?;
        let authorized = binding.is_authorized_valuator(valuator).await?;
        self.ensure_current(&binding)?;
        Ok(authorized)
    }

    pub async fn total_valuations(&self) -> Result<u64, OracleError> {
        let _guard = self.track_read();
        let binding = self.binding.current()?;
        let total = binding.total_valuations().await?;
        self.ensure_current(&binding)?;
        Ok(total.saturating_to())
    }

    pub async fn valuator_reputation(&self, valuator: Address) -> Result<u64, OracleError> {
        let _guard = self.track_read();
        let binding = self.binding.current()?;
        let reputation = binding.valuator_reputation(valuator).await?;
        self.ensure_current(&binding)?;
        Ok(reputation.saturating_to())
    }

    pub async fn fees(&self) -> Result<Fees, OracleError> {
        let _guard = self.track_read();
        let binding = self.binding.current()?;
        let raw = binding.fee_schedule().await?;
        self.ensure_current(&binding)?;
        Ok(Fees::decode(raw))
    }

    async fn await_confirmation<S, SFut>(
        &self,
        binding: &OracleBinding,
        hash: TxHash,
        sleep: S,
    ) -> Result<TransactionReceipt, OracleError>
    where
        S: Fn(Duration) -> SFut + Copy,
        SFut: Future<Output = ()>,
    {
        loop {
            if let Some(receipt) = binding.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            sleep(self.receipt_interval).await;
        }
    }

    /// Rebuilds or tears down the binding to match the session. Runs
    /// after every transition so a signer change can never leave calls
    /// going out under the previous account.
    fn reconcile(&self) {
        let session = self.session.session();
        if !session.is_connected() {
            self.binding.teardown();
            return;
        }
        let Some(signer) = session.account else {
            self.binding.teardown();
            return;
        };
        if self.binding.signer() != Some(signer)
            && let Some(provider) = self.session.provider()
        {
            self.binding.rebind(&self.chain, provider, signer);
        }
    }

    fn ensure_current(&self, binding: &OracleBinding) -> Result<(), OracleError> {
        if self.binding.is_current(binding) {
            return Ok(());
        }
        debug!(epoch = binding.epoch(), "discarding response from superseded binding");
        Err(OracleError::NotBound)
    }

    fn warn_unsupported_chain(&self) {
        if let Some(chain_id) = self.session.session().chain_id
            && !Chain::is_supported(chain_id)
        {
            warn!(chain_id, "wallet is on a chain the oracle is not deployed to");
        }
    }

    fn acquire_write(&self) -> Result<WriteGuard<'_>, OracleError> {
        self.write_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| OracleError::WriteInFlight)?;
        Ok(WriteGuard { flag: &self.write_pending })
    }

    fn track_read(&self) -> ReadGuard<'_> {
        self.reads_in_flight.fetch_add(1, Ordering::AcqRel);
        ReadGuard { counter: &self.reads_in_flight }
    }
}

struct WriteGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

struct ReadGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::AcqRel);
    }
}
