use std::sync::{
    Arc, RwLock,
    atomic::{AtomicU64, Ordering},
};

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, Bytes, TxHash, U256},
    rpc::types::{TransactionReceipt, TransactionRequest},
};
use alloy_sol_types::SolCall;
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    Chain, abi::oracle::ValuationOracle, error::OracleError, provider::WalletProvider,
};

/// Holds the binding for the active signer and hands out epoch-stamped
/// handles so responses can be checked against the binding they were
/// issued under.
#[derive(Debug, Default)]
pub struct BindingManager {
    binding: RwLock<Option<Arc<OracleBinding>>>,
    epoch: AtomicU64,
}

impl BindingManager {
    /// Replaces any previous binding with one for `signer`.
    pub fn rebind(
        &self,
        chain: &Chain,
        provider: Arc<dyn WalletProvider>,
        signer: Address,
    ) -> Arc<OracleBinding> {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        let binding = Arc::new(OracleBinding {
            oracle: chain.oracle(),
            submission_fee: chain.submission_fee(),
            signer,
            epoch,
            provider,
        });
        *self.binding.write().unwrap() = Some(binding.clone());
        debug!(%signer, epoch, "oracle binding rebuilt");
        binding
    }

    /// Drops the binding. Bumps the epoch so handles still in flight
    /// come back stale.
    pub fn teardown(&self) {
        if self.binding.write().unwrap().take().is_some() {
            let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
            debug!(epoch, "oracle binding torn down");
        }
    }

    /// Active binding, or [`OracleError::NotBound`] when no session backs
    /// one. Failing here keeps contract calls from dialing a dead signer.
    pub fn current(&self) -> Result<Arc<OracleBinding>, OracleError> {
        self.binding.read().unwrap().clone().ok_or(OracleError::NotBound)
    }

    /// Whether `binding` is still the active one. A response produced
    /// under a superseded binding must not be surfaced as current state.
    pub fn is_current(&self, binding: &OracleBinding) -> bool {
        self.epoch.load(Ordering::Acquire) == binding.epoch
    }

    pub fn signer(&self) -> Option<Address> {
        self.binding.read().unwrap().as_ref().map(|b| b.signer)
    }
}

/// Immutable bundle of everything a contract call needs: oracle address,
/// signing account and submission fee. Rebuilt whole on every signer
/// change rather than mutated in place.
#[derive(derive_more::Debug)]
pub struct OracleBinding {
    oracle: Address,
    submission_fee: U256,
    signer: Address,
    epoch: u64,
    #[debug(skip)]
    provider: Arc<dyn WalletProvider>,
}

impl OracleBinding {
    pub fn signer(&self) -> Address { self.signer }

    pub fn epoch(&self) -> u64 { self.epoch }

    /// Read-only contract call against the latest block.
    async fn call(&self, calldata: Vec<u8>) -> Result<Bytes, OracleError> {
        let tx = TransactionRequest::default()
            .with_to(self.oracle)
            .with_input(Bytes::from(calldata));
        let params = Value::Array(vec![serde_json::to_value(&tx)?, json!("latest")]);
        let raw = self.provider.request("eth_call", params).await?;
        serde_json::from_value(raw)
            .map_err(|err| OracleError::Unknown(format!("malformed call response: {err}")))
    }

    /// Sends the valuation through the wallet with the fixed submission
    /// fee attached. Returns as soon as the wallet accepts the
    /// transaction; confirmation is the caller's loop.
    pub(crate) async fn submit_valuation(
        &self,
        call: ValuationOracle::submitValuationCall,
    ) -> Result<TxHash, OracleError> {
        let tx = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(self.oracle)
            .with_value(self.submission_fee)
            .with_input(Bytes::from(call.abi_encode()));
        let params = Value::Array(vec![serde_json::to_value(&tx)?]);
        let raw = self.provider.request("eth_sendTransaction", params).await?;
        serde_json::from_value(raw)
            .map_err(|err| OracleError::Unknown(format!("malformed transaction hash: {err}")))
    }

    pub(crate) async fn current_valuation(
        &self,
        collection: Address,
        token_id: U256,
    ) -> Result<ValuationOracle::Valuation, OracleError> {
        let call = ValuationOracle::getCurrentValuationCall {
            contractAddress: collection,
            tokenId: token_id,
        };
        let raw = self.call(call.abi_encode()).await?;
        Ok(ValuationOracle::getCurrentValuationCall::abi_decode_returns(&raw)?)
    }

    pub(crate) async fn valuation_history(
        &self,
        collection: Address,
        token_id: U256,
    ) -> Result<Vec<ValuationOracle::Valuation>, OracleError> {
        let call = ValuationOracle::getValuationHistoryCall {
            contractAddress: collection,
            tokenId: token_id,
        };
        let raw = self.call(call.abi_encode()).await?;
        Ok(ValuationOracle::getValuationHistoryCall::abi_decode_returns(&raw)?)
    }

    pub(crate) async fn collection_stats(
        &self,
        collection: Address,
    ) -> Result<ValuationOracle::CollectionStats, OracleError> {
        let call = ValuationOracle::getCollectionStatsCall { contractAddress: collection };
        let raw = self.call(call.abi_encode()).await?;
        Ok(ValuationOracle::getCollectionStatsCall::abi_decode_returns(&raw)?)
    }

    pub(crate) async fn is_authorized_valuator(
        &self,
        valuator: Address,
    ) -> Result<bool, OracleError> {
        let call = ValuationOracle::isAuthorizedValuatorCall { valuator };
        let raw = self.call(call.abi_encode()).await?;
        Ok(ValuationOracle::isAuthorizedValuatorCall::abi_decode_returns(&raw)?)
    }

    pub(crate) async fn total_valuations(&self) -> Result<U256, OracleError> {
        let call = ValuationOracle::getTotalValuationsCall {};
        let raw = self.call(call.abi_encode()).await?;
        Ok(ValuationOracle::getTotalValuationsCall::abi_decode_returns(&raw)?)
    }

    pub(crate) async fn valuator_reputation(
        &self,
        valuator: Address,
    ) -> Result<U256, OracleError> {
        let call = ValuationOracle::getValuatorReputationCall { valuator };
        let raw = self.call(call.abi_encode()).await?;
        Ok(ValuationOracle::getValuatorReputationCall::abi_decode_returns(&raw)?)
    }

    pub(crate) async fn fee_schedule(&self) -> Result<ValuationOracle::FeeSchedule, OracleError> {
        let call = ValuationOracle::feesCall {};
        let raw = self.call(call.abi_encode()).await?;
        Ok(ValuationOracle::feesCall::abi_decode_returns(&raw)?)
    }

    /// Receipt for `hash`, or `None` while the transaction is pending.
    pub(crate) async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, OracleError> {
        let raw = self.provider.request("eth_getTransactionReceipt", json!([hash])).await?;
        if raw.is_null() {
            return Ok(None);
        }
        serde_json::from_value(raw)
            .map(Some)
            .map_err(|err| OracleError::Unknown(format!("malformed receipt: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use futures::channel::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::provider::{ProviderError, ProviderEvent};

    struct NullProvider;

    #[async_trait::async_trait]
    impl WalletProvider for NullProvider {
        async fn request(&self, _method: &str, _params: Value) -> Result<Value, ProviderError> {
            Err(ProviderError::new(-32601, "not wired"))
        }

        fn subscribe(&self) -> UnboundedReceiver<ProviderEvent> {
            mpsc::unbounded().1
        }
    }

    #[test]
    fn epochs_supersede_previous_bindings() {
        let manager = BindingManager::default();
        assert!(matches!(manager.current(), Err(OracleError::NotBound)));

        let chain = Chain::mainnet();
        let provider: Arc<dyn WalletProvider> = Arc::new(NullProvider);
        let first = manager.rebind(&chain, provider.clone(), Address::repeat_byte(0x01));
        assert_eq!(first.epoch(), 1);
        assert_eq!(first.signer(), Address::repeat_byte(0x01));
        assert!(manager.is_current(&first));

        let second = manager.rebind(&chain, provider, Address::repeat_byte(0x02));
        assert_eq!(second.epoch(), 2);
        assert!(!manager.is_current(&first));
        assert!(manager.is_current(&second));
        assert_eq!(manager.signer(), Some(Address::repeat_byte(0x02)));

        manager.teardown();
        assert!(!manager.is_current(&second));
        assert!(matches!(manager.current(), Err(OracleError::NotBound)));

        // A second teardown has nothing to drop and leaves the epoch alone.
        manager.teardown();
        let third = manager.rebind(&chain, Arc::new(NullProvider), Address::repeat_byte(0x03));
        assert_eq!(third.epoch(), 4);
    }
}
