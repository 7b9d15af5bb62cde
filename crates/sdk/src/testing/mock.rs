use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use alloy::primitives::{Address, B256, Bytes, TxHash, keccak256};
use alloy::rpc::types::TransactionRequest;
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::channel::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    oneshot,
};
use serde_json::{Value, json};

use crate::{
    abi::oracle::ValuationOracle,
    provider::{ProviderError, ProviderEvent, WalletProvider},
};

/// One request the provider served, in arrival order.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Value,
}

/// Scripted [`WalletProvider`].
///
/// Session methods answer from the configured accounts and chain id.
/// `eth_call` answers from canned responses installed per function
/// selector with [`respond`](Self::respond); a selector without one is a
/// test bug and fails loudly. Accepted transactions get deterministic
/// hashes and synthesized receipts, and a call or receipt can be held
/// open to pin traffic mid-flight.
pub struct MockProvider {
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<u64>,
    authorized: AtomicBool,
    receipts_visible: AtomicBool,
    failed_submissions: AtomicBool,
    accounts_error: Mutex<Option<ProviderError>>,
    connect_error: Mutex<Option<ProviderError>>,
    switch_error: Mutex<Option<ProviderError>>,
    call_returns: DashMap<[u8; 4], Result<Bytes, ProviderError>>,
    call_gates: Mutex<HashMap<[u8; 4], oneshot::Receiver<()>>>,
    sent: DashMap<TxHash, TransactionRequest>,
    requests: Mutex<Vec<RecordedRequest>>,
    subscribers: Mutex<Vec<UnboundedSender<ProviderEvent>>>,
}

impl MockProvider {
    /// Account exposed unless [`with_accounts`](Self::with_accounts)
    /// overrides it.
    pub const DEFAULT_ACCOUNT: Address = Address::repeat_byte(0xab);

    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(vec![Self::DEFAULT_ACCOUNT]),
            chain_id: Mutex::new(1),
            authorized: AtomicBool::new(false),
            receipts_visible: AtomicBool::new(true),
            failed_submissions: AtomicBool::new(false),
            accounts_error: Mutex::new(None),
            connect_error: Mutex::new(None),
            switch_error: Mutex::new(None),
            call_returns: DashMap::new(),
            call_gates: Mutex::new(HashMap::new()),
            sent: DashMap::new(),
            requests: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        *self.accounts.lock().unwrap() = accounts;
        self
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        *self.chain_id.lock().unwrap() = chain_id;
        self
    }

    /// Starts with access already granted, as a wallet remembers across
    /// page loads. `eth_accounts` then answers non-empty before any
    /// connect prompt.
    pub fn with_authorized(self) -> Self {
        self.authorized.store(true, Ordering::Release);
        self
    }

    /// Fails the next `eth_accounts` with `error`, as a locked wallet
    /// does.
    pub fn with_accounts_error(self, error: ProviderError) -> Self {
        *self.accounts_error.lock().unwrap() = Some(error);
        self
    }

    /// Fails the next `eth_requestAccounts` with `error`.
    pub fn with_connect_error(self, error: ProviderError) -> Self {
        *self.connect_error.lock().unwrap() = Some(error);
        self
    }

    /// Fails the next `wallet_switchEthereumChain` with `error`.
    pub fn with_switch_error(self, error: ProviderError) -> Self {
        *self.switch_error.lock().unwrap() = Some(error);
        self
    }

    /// Answers `null` to receipt probes until
    /// [`release_receipts`](Self::release_receipts), keeping a submission
    /// pending for as long as the test needs.
    pub fn with_held_receipts(self) -> Self {
        self.receipts_visible.store(false, Ordering::Release);
        self
    }

    /// Mines every submission with a failed status.
    pub fn with_failed_submissions(self) -> Self {
        self.failed_submissions.store(true, Ordering::Release);
        self
    }

    /// Installs the ABI-encoded return value served for `C`'s selector.
    pub fn respond<C: SolCall>(&self, ret: &C::Return) {
        self.call_returns.insert(C::SELECTOR, Ok(Bytes::from(C::abi_encode_returns(ret))));
    }

    /// Fails calls to `C`'s selector with `error`.
    pub fn respond_error<C: SolCall>(&self, error: ProviderError) {
        self.call_returns.insert(C::SELECTOR, Err(error));
    }

    /// Holds the next call to `C`'s selector until the returned sender is
    /// used or dropped.
    pub fn gate_call<C: SolCall>(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.call_gates.lock().unwrap().insert(C::SELECTOR, rx);
        tx
    }

    pub fn release_receipts(&self) {
        self.receipts_visible.store(true, Ordering::Release);
    }

    /// Swaps the exposed account set and notifies subscribers. An empty
    /// set also revokes authorization, as wallets do.
    pub fn change_accounts(&self, accounts: Vec<Address>) {
        if accounts.is_empty() {
            self.authorized.store(false, Ordering::Release);
        }
        *self.accounts.lock().unwrap() = accounts.clone();
        self.emit(ProviderEvent::AccountsChanged(accounts));
    }

    /// Moves to another chain and notifies subscribers.
    pub fn change_chain(&self, chain_id: u64) {
        *self.chain_id.lock().unwrap() = chain_id;
        self.emit(ProviderEvent::ChainChanged(chain_id));
    }

    pub fn emit(&self, event: ProviderEvent) {
        self.subscribers.lock().unwrap().retain(|tx| tx.unbounded_send(event.clone()).is_ok());
    }

    /// Live subscriptions, with dropped receivers pruned.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    /// Everything requested so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Transactions accepted through `eth_sendTransaction`.
    pub fn sent_transactions(&self) -> Vec<(TxHash, TransactionRequest)> {
        self.sent.iter().map(|entry| (*entry.key(), entry.value().clone())).collect()
    }

    async fn serve_call(&self, params: &Value) -> Result<Value, ProviderError> {
        let tx = Self::transaction(params)?;
        let input = tx.input.input().cloned().unwrap_or_default();
        let selector: [u8; 4] = input
            .get(..4)
            .and_then(|prefix| prefix.try_into().ok())
            .ok_or_else(|| ProviderError::new(-32602, "calldata shorter than a selector"))?;

        let gate = self.call_gates.lock().unwrap().remove(&selector);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match self.call_returns.get(&selector).map(|entry| entry.value().clone()) {
            Some(Ok(bytes)) => Ok(json!(bytes)),
            Some(Err(error)) => Err(error),
            None => Err(ProviderError::new(
                -32000,
                format!("no canned response for selector 0x{}", alloy::hex::encode(selector)),
            )),
        }
    }

    fn accept_transaction(&self, params: &Value) -> Result<Value, ProviderError> {
        let tx = Self::transaction(params)?;
        let hash = keccak256(format!("mock-tx-{}", self.sent.len()));
        self.sent.insert(hash, tx);
        Ok(json!(hash))
    }

    fn serve_receipt(&self, params: &Value) -> Result<Value, ProviderError> {
        if !self.receipts_visible.load(Ordering::Acquire) {
            return Ok(Value::Null);
        }
        let hash: TxHash = serde_json::from_value(params.get(0).cloned().unwrap_or(Value::Null))
            .map_err(|err| ProviderError::new(-32602, format!("malformed hash: {err}")))?;
        let Some(tx) = self.sent.get(&hash) else {
            return Ok(Value::Null);
        };
        Ok(self.receipt_json(hash, tx.value()))
    }

    fn switch_chain(&self, params: &Value) -> Result<Value, ProviderError> {
        if let Some(error) = self.switch_error.lock().unwrap().take() {
            return Err(error);
        }
        let hex = params
            .get(0)
            .and_then(|entry| entry.get("chainId"))
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::new(-32602, "missing chainId"))?;
        let chain_id = u64::from_str_radix(hex.trim_start_matches("0x"), 16)
            .map_err(|err| ProviderError::new(-32602, format!("malformed chainId {hex:?}: {err}")))?;
        self.change_chain(chain_id);
        Ok(Value::Null)
    }

    /// Receipt in the shape `eth_getTransactionReceipt` returns, with a
    /// `ValuationSubmitted` log synthesized from the submitted calldata.
    fn receipt_json(&self, hash: TxHash, tx: &TransactionRequest) -> Value {
        let failed = self.failed_submissions.load(Ordering::Acquire);
        let to = tx.to.and_then(|kind| kind.to().copied());

        let mut logs = Vec::new();
        if !failed
            && let Some(input) = tx.input.input()
            && let Ok(call) = ValuationOracle::submitValuationCall::abi_decode(input)
        {
            let event = ValuationOracle::ValuationSubmitted {
                valuationId: keccak256(hash),
                contractAddress: call.contractAddress,
                tokenId: call.tokenId,
                estimatedValue: call.estimatedValue,
                rarityScore: call.rarityScore,
                valuator: tx.from.unwrap_or_default(),
                confidence: call.confidence,
            };
            let data = event.encode_log_data();
            logs.push(json!({
                "address": to.unwrap_or_default(),
                "topics": data.topics(),
                "data": data.data,
                "blockHash": B256::ZERO,
                "blockNumber": "0x1",
                "transactionHash": hash,
                "transactionIndex": "0x0",
                "logIndex": "0x0",
                "removed": false,
            }));
        }

        json!({
            "type": "0x2",
            "status": if failed { "0x0" } else { "0x1" },
            "cumulativeGasUsed": "0x5208",
            "logs": logs,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "transactionHash": hash,
            "transactionIndex": "0x0",
            "blockHash": B256::ZERO,
            "blockNumber": "0x1",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x0",
            "from": tx.from.unwrap_or_default(),
            "to": to,
            "contractAddress": null,
        })
    }

    fn transaction(params: &Value) -> Result<TransactionRequest, ProviderError> {
        serde_json::from_value(params.get(0).cloned().unwrap_or(Value::Null))
            .map_err(|err| ProviderError::new(-32602, format!("malformed transaction: {err}")))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest { method: method.to_string(), params: params.clone() });

        match method {
            "eth_accounts" => {
                if let Some(error) = self.accounts_error.lock().unwrap().take() {
                    return Err(error);
                }
                if self.authorized.load(Ordering::Acquire) {
                    Ok(json!(*self.accounts.lock().unwrap()))
                } else {
                    Ok(json!([]))
                }
            },
            "eth_requestAccounts" => {
                if let Some(error) = self.connect_error.lock().unwrap().take() {
                    return Err(error);
                }
                self.authorized.store(true, Ordering::Release);
                Ok(json!(*self.accounts.lock().unwrap()))
            },
            "eth_chainId" => Ok(json!(format!("{:#x}", *self.chain_id.lock().unwrap()))),
            "eth_call" => self.serve_call(&params).await,
            "eth_sendTransaction" => self.accept_transaction(&params),
            "eth_getTransactionReceipt" => self.serve_receipt(&params),
            "wallet_switchEthereumChain" => self.switch_chain(&params),
            other => Err(ProviderError::new(-32601, format!("method {other} not supported"))),
        }
    }

    fn subscribe(&self) -> UnboundedReceiver<ProviderEvent> {
        let (tx, rx) = mpsc::unbounded();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }
}
