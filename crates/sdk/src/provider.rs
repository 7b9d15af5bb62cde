use alloy::primitives::Address;
use async_trait::async_trait;
use futures::channel::mpsc::UnboundedReceiver;
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC error object returned by a wallet provider.
///
/// Codes follow EIP-1193/EIP-1474; [`crate::error::OracleError`] classifies
/// them for callers.
#[derive(Clone, Debug, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    /// EIP-1193: the user rejected the request.
    pub const USER_REJECTED: i64 = 4001;
    /// EIP-1474: the transaction or call reverted during execution.
    pub const EXECUTION_ERROR: i64 = 3;
    /// EIP-3326: the wallet has no configuration for the requested chain.
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;

    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

/// Wallet-side notification delivered between requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The exposed account set changed; empty means access was revoked.
    AccountsChanged(Vec<Address>),
    /// The wallet moved to another chain.
    ChainChanged(u64),
}

/// Injected wallet transport.
///
/// Mirrors the browser provider surface: a single `request(method, params)`
/// entry point plus an event subscription, so a browser wallet bridge, a
/// headless RPC signer and the scripted test double are interchangeable.
/// The SDK never reaches for an ambient provider; whoever constructs the
/// session manager decides what this is.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Sends one JSON-RPC request (`eth_*` / `wallet_*`) to the wallet.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Opens an event subscription. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> UnboundedReceiver<ProviderEvent>;
}
