use std::sync::{Arc, Mutex, RwLock};

use alloy::primitives::Address;
use futures::channel::mpsc::UnboundedReceiver;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    error::OracleError,
    provider::{ProviderError, ProviderEvent, WalletProvider},
};

/// Connection status of the wallet session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Disconnected => write!(f, "disconnected"),
            SessionStatus::Connecting => write!(f, "connecting"),
            SessionStatus::Connected => write!(f, "connected"),
        }
    }
}

/// Snapshot of the wallet session.
///
/// Replaced wholesale on every transition, so a copy handed to a caller is
/// internally consistent: never a new account with a stale chain id or the
/// other way around.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Session {
    /// Active signing account, present while connected.
    pub account: Option<Address>,
    /// Chain the wallet is on, present while connected.
    pub chain_id: Option<u64>,
    /// Lifecycle status.
    pub status: SessionStatus,
}

impl Session {
    fn connecting() -> Self {
        Self { account: None, chain_id: None, status: SessionStatus::Connecting }
    }

    fn connected(account: Address, chain_id: u64) -> Self {
        Self { account: Some(account), chain_id: Some(chain_id), status: SessionStatus::Connected }
    }

    pub fn is_connected(&self) -> bool { self.status == SessionStatus::Connected }
}

/// Result of [`SessionManager::initialize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    /// No wallet provider was injected. Surfaced for messaging; the session
    /// simply stays disconnected.
    ProviderAbsent,
    /// Provider present, no prior authorization; waiting for `connect`.
    Ready,
    /// A previously authorized session was restored without prompting.
    Resumed,
}

/// Owns the wallet session and the provider event subscription.
///
/// The provider is injected at construction and never read from ambient
/// state; `None` models a host without a wallet. All mutations replace the
/// whole [`Session`] value under a short write lock.
#[derive(derive_more::Debug)]
pub struct SessionManager {
    #[debug(skip)]
    provider: Option<Arc<dyn WalletProvider>>,
    session: RwLock<Session>,
    #[debug(skip)]
    events: Mutex<Option<UnboundedReceiver<ProviderEvent>>>,
}

impl SessionManager {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>) -> Self {
        Self { provider, session: RwLock::new(Session::default()), events: Mutex::new(None) }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session { *self.session.read().unwrap() }

    /// Injected wallet provider, if the host has one.
    pub fn provider(&self) -> Option<Arc<dyn WalletProvider>> { self.provider.clone() }

    /// Detects the provider, opens the event subscription and attempts to
    /// restore a previously authorized session without prompting.
    ///
    /// Resume failures degrade to [`InitOutcome::Ready`]: a wallet that
    /// cannot answer a silent account query is a messaging concern, not an
    /// initialization error.
    pub async fn initialize(&self) -> Result<InitOutcome, OracleError> {
        let Some(provider) = &self.provider else {
            debug!("no wallet provider injected");
            return Ok(InitOutcome::ProviderAbsent);
        };
        *self.events.lock().unwrap() = Some(provider.subscribe());

        match self.resume(provider.as_ref()).await {
            Ok(true) => Ok(InitOutcome::Resumed),
            Ok(false) => Ok(InitOutcome::Ready),
            Err(err) => {
                warn!(%err, "session resume failed, starting disconnected");
                Ok(InitOutcome::Ready)
            },
        }
    }

    async fn resume(&self, provider: &dyn WalletProvider) -> Result<bool, OracleError> {
        let accounts = accounts_from(provider.request("eth_accounts", json!([])).await?)?;
        let Some(account) = accounts.first().copied() else {
            return Ok(false);
        };
        let chain_id = chain_id_from(provider.request("eth_chainId", json!([])).await?)?;
        self.replace(Session::connected(account, chain_id));
        debug!(%account, chain_id, "session resumed");
        Ok(true)
    }

    /// Requests wallet access and establishes a connected session.
    ///
    /// On rejection or provider failure the session is back at
    /// `Disconnected` before the error is returned.
    pub async fn connect(&self) -> Result<Session, OracleError> {
        let provider = self.require_provider()?.clone();
        self.replace(Session::connecting());

        match Self::establish(provider.as_ref()).await {
            Ok(session) => {
                debug!(account = ?session.account, chain_id = ?session.chain_id, "wallet connected");
                Ok(self.replace(session))
            },
            Err(err) => {
                self.replace(Session::default());
                Err(err)
            },
        }
    }

    async fn establish(provider: &dyn WalletProvider) -> Result<Session, OracleError> {
        let accounts = accounts_from(provider.request("eth_requestAccounts", json!([])).await?)?;
        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| OracleError::Unknown("wallet returned no accounts".to_string()))?;
        let chain_id = chain_id_from(provider.request("eth_chainId", json!([])).await?)?;
        Ok(Session::connected(account, chain_id))
    }

    /// Clears the session. The caller tears down any binding built on it.
    pub fn disconnect(&self) -> Session {
        debug!("wallet disconnected");
        self.replace(Session::default())
    }

    /// Applies an `accountsChanged` notification.
    ///
    /// An empty list means the wallet revoked access and forces a full
    /// disconnect. Otherwise the first account becomes the active signer
    /// with the chain id preserved; ignored while not connected.
    pub fn handle_accounts_changed(&self, accounts: &[Address]) -> Session {
        let current = self.session();
        let Some(account) = accounts.first().copied() else {
            return self.disconnect();
        };
        if current.status != SessionStatus::Connected {
            return current;
        }
        if current.account != Some(account) {
            debug!(%account, "active account changed");
        }
        self.replace(Session { account: Some(account), ..current })
    }

    /// Applies a `chainChanged` notification. The binding is unaffected:
    /// the oracle address does not vary per chain. Callers decide whether
    /// the new chain deserves a warning.
    pub fn handle_chain_changed(&self, chain_id: u64) -> Session {
        let current = self.session();
        if current.status != SessionStatus::Connected {
            return current;
        }
        debug!(chain_id, "chain changed");
        self.replace(Session { chain_id: Some(chain_id), ..current })
    }

    /// Asks the wallet to move to `chain_id`.
    ///
    /// The snapshot is not touched here; the wallet confirms the switch
    /// through the ensuing `chainChanged` notification. A wallet that does
    /// not know the chain answers with code 4902, mapped to
    /// [`OracleError::UnsupportedChain`] so the caller can offer to add it.
    pub async fn switch_network(&self, chain_id: u64) -> Result<(), OracleError> {
        let provider = self.require_provider()?;
        let params = json!([{ "chainId": format!("{chain_id:#x}") }]);
        match provider.request("wallet_switchEthereumChain", params).await {
            Ok(_) => Ok(()),
            Err(err) if err.code == ProviderError::UNRECOGNIZED_CHAIN => {
                Err(OracleError::UnsupportedChain(chain_id))
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Drops the provider event subscription and clears the session.
    /// The subscription is also released when the manager itself drops.
    pub fn shutdown(&self) -> Session {
        self.events.lock().unwrap().take();
        self.disconnect()
    }

    /// Synchronously drains queued provider notifications, applying each to
    /// the session in arrival order. Returns the number applied.
    pub fn process_pending_events(&self) -> usize {
        let mut processed = 0;
        let mut events = self.events.lock().unwrap();
        let Some(rx) = events.as_mut() else {
            return 0;
        };
        while let Ok(Some(event)) = rx.try_next() {
            match event {
                ProviderEvent::AccountsChanged(accounts) => {
                    self.handle_accounts_changed(&accounts);
                },
                ProviderEvent::ChainChanged(chain_id) => {
                    self.handle_chain_changed(chain_id);
                },
            }
            processed += 1;
        }
        processed
    }

    fn replace(&self, session: Session) -> Session {
        *self.session.write().unwrap() = session;
        session
    }

    fn require_provider(&self) -> Result<&Arc<dyn WalletProvider>, OracleError> {
        self.provider.as_ref().ok_or(OracleError::ProviderAbsent)
    }
}

fn accounts_from(value: Value) -> Result<Vec<Address>, OracleError> {
    serde_json::from_value(value)
        .map_err(|err| OracleError::Unknown(format!("malformed accounts response: {err}")))
}

fn chain_id_from(value: Value) -> Result<u64, OracleError> {
    let hex: String = serde_json::from_value(value)
        .map_err(|err| OracleError::Unknown(format!("malformed chain id response: {err}")))?;
    let digits = hex.strip_prefix("0x").unwrap_or(&hex);
    u64::from_str_radix(digits, 16)
        .map_err(|err| OracleError::Unknown(format!("malformed chain id {hex:?}: {err}")))
}
