use alloy::{
    network::EthereumWallet,
    primitives::{Address, TxHash},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::{client::RpcClient, types::TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::{
        RpcError, TransportErrorKind,
        layers::{RetryBackoffLayer, ThrottleLayer},
    },
};
use anyhow::Context;
use async_trait::async_trait;
use carat_sdk::provider::{ProviderError, ProviderEvent, WalletProvider};
use futures::channel::mpsc::{self, UnboundedReceiver};
use serde_json::{Value, json};

/// Headless wallet: a local signing key over a plain JSON-RPC endpoint,
/// speaking the same injected-provider surface a browser wallet would.
pub(crate) struct RpcWalletProvider {
    provider: DynProvider,
    account: Address,
    chain_id: u64,
}

impl RpcWalletProvider {
    pub(crate) async fn connect(
        rpc_url: &str,
        throttle: Option<u32>,
        signer: PrivateKeySigner,
    ) -> anyhow::Result<Self> {
        let client = if let Some(throttle) = throttle {
            RpcClient::builder()
                .layer(ThrottleLayer::new(throttle))
                .layer(RetryBackoffLayer::new(10, 100, 200))
                .connect(rpc_url)
                .await
                .context("connecting to RPC")?
        } else {
            RpcClient::builder()
                .layer(RetryBackoffLayer::new(10, 100, 200))
                .connect(rpc_url)
                .await
                .context("connecting to RPC")?
        };

        let account = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_client(client)
            .erased();
        let chain_id = provider.get_chain_id().await.context("fetching chain ID")?;

        Ok(Self { provider, account, chain_id })
    }

    pub(crate) fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            // The key holder is the one exposed account, no prompt involved.
            "eth_accounts" | "eth_requestAccounts" => Ok(json!([self.account])),
            "eth_chainId" => Ok(json!(format!("{:#x}", self.chain_id))),
            "eth_call" => {
                let tx = transaction(&params)?;
                let bytes = self.provider.call(tx).await.map_err(rpc_error)?;
                Ok(json!(bytes))
            },
            "eth_sendTransaction" => {
                let tx = transaction(&params)?;
                let pending = self.provider.send_transaction(tx).await.map_err(rpc_error)?;
                Ok(json!(pending.tx_hash()))
            },
            "eth_getTransactionReceipt" => {
                let hash: TxHash = serde_json::from_value(first_param(&params))
                    .map_err(|err| malformed(format!("transaction hash: {err}")))?;
                let receipt =
                    self.provider.get_transaction_receipt(hash).await.map_err(rpc_error)?;
                serde_json::to_value(receipt)
                    .map_err(|err| ProviderError::new(-32603, err.to_string()))
            },
            other => Err(ProviderError::new(-32601, format!("method not supported: {other}"))),
        }
    }

    fn subscribe(&self) -> UnboundedReceiver<ProviderEvent> {
        // Nothing rotates the key out from under a headless session.
        mpsc::unbounded().1
    }
}

fn first_param(params: &Value) -> Value {
    params.get(0).cloned().unwrap_or(Value::Null)
}

fn transaction(params: &Value) -> Result<TransactionRequest, ProviderError> {
    serde_json::from_value(first_param(params))
        .map_err(|err| malformed(format!("transaction object: {err}")))
}

fn malformed(what: String) -> ProviderError {
    ProviderError::new(-32602, format!("malformed {what}"))
}

fn rpc_error(err: RpcError<TransportErrorKind>) -> ProviderError {
    match err.as_error_resp() {
        Some(payload) => ProviderError::new(payload.code, payload.message.to_string()),
        None => ProviderError::new(-32000, err.to_string()),
    }
}
