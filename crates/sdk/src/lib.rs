//! Carat NFT valuation oracle SDK.
//!
//! # Overview
//!
//! Wallet session and contract binding layer for the on-chain NFT
//! valuation oracle.
//!
//! Construct a [`client::OracleClient`] over an injected
//! [`provider::WalletProvider`], call
//! [`initialize`](client::OracleClient::initialize) to restore a prior
//! session, then [`connect`](client::OracleClient::connect) to prompt for
//! one. Contract reads and the single-flight
//! [`submit_valuation`](client::OracleClient::submit_valuation) write go
//! through the client; it rebuilds the oracle binding whenever the wallet
//! changes the active account, so calls never go out under a stale signer.
//!
//! See `./tests` for examples.
//!
//! # Limitations/follow-ups
//!
//! * Wallet notifications are applied when
//!   [`process_pending_events`](client::OracleClient::process_pending_events)
//!   runs; a push-driven event loop could follow.
//!
//! * [`valuation_history`](client::OracleClient::valuation_history) fetches
//!   the full history in one call; pagination could follow.
//!
//! # Features
//!
//! | Feature | Default | Description |
//! | --- | --- | --- |
//! | `display` | yes | Enables [`tabled::Tabled`] implementations for record types. |
//! | `testing` | yes | Enables [`testing`] module. |
//!
//! # Testing
//!
//! [`testing`] module provides a scripted wallet double with canned
//! contract responses, so session and submission flows run without a
//! browser wallet or a node.

pub mod abi;
pub mod binding;
pub mod client;
pub mod error;
pub mod num;
pub mod provider;
pub mod session;
#[cfg(feature = "testing")]
pub mod testing;
pub mod types;

use alloy::primitives::{Address, U256, address};

/// Oracle deployment address, shared by all supported chains.
pub const ORACLE_ADDRESS: Address = address!("0x1234567890123456789012345678901234567890");

/// Fixed fee attached to every valuation submission, 0.001 native token.
pub const SUBMISSION_FEE: U256 = U256::from_limbs([1_000_000_000_000_000, 0, 0, 0]);

#[derive(Clone, Debug)]
/// Chain the oracle is operating on.
pub struct Chain {
    chain_id: u64,
    name: String,
    oracle: Address,
    submission_fee: U256,
    rpc_url: String,
}

impl Chain {
    pub fn mainnet() -> Self {
        Self {
            chain_id: 1,
            name: "Ethereum Mainnet".to_string(),
            oracle: ORACLE_ADDRESS,
            submission_fee: SUBMISSION_FEE,
            rpc_url: "https://mainnet.infura.io/v3/YOUR_INFURA_KEY".to_string(),
        }
    }

    pub fn goerli() -> Self {
        Self {
            chain_id: 5,
            name: "Goerli Testnet".to_string(),
            oracle: ORACLE_ADDRESS,
            submission_fee: SUBMISSION_FEE,
            rpc_url: "https://goerli.infura.io/v3/YOUR_INFURA_KEY".to_string(),
        }
    }

    pub fn polygon() -> Self {
        Self {
            chain_id: 137,
            name: "Polygon".to_string(),
            oracle: ORACLE_ADDRESS,
            submission_fee: SUBMISSION_FEE,
            rpc_url: "https://polygon-rpc.com".to_string(),
        }
    }

    pub fn mumbai() -> Self {
        Self {
            chain_id: 80001,
            name: "Mumbai Testnet".to_string(),
            oracle: ORACLE_ADDRESS,
            submission_fee: SUBMISSION_FEE,
            rpc_url: "https://rpc-mumbai.maticvigil.com".to_string(),
        }
    }

    pub fn custom(
        chain_id: u64,
        name: String,
        oracle: Address,
        submission_fee: U256,
        rpc_url: String,
    ) -> Self {
        Self { chain_id, name, oracle, submission_fee, rpc_url }
    }

    /// Registry lookup by chain id.
    pub fn by_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Self::mainnet()),
            5 => Some(Self::goerli()),
            137 => Some(Self::polygon()),
            80001 => Some(Self::mumbai()),
            _ => None,
        }
    }

    /// Whether the oracle has a deployment on `chain_id`.
    pub fn is_supported(chain_id: u64) -> bool {
        Self::by_id(chain_id).is_some()
    }

    /// Overrides the oracle address, for forks and local deployments.
    pub fn with_oracle(mut self, oracle: Address) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: String) -> Self {
        self.rpc_url = rpc_url;
        self
    }

    pub fn chain_id(&self) -> u64 { self.chain_id }

    pub fn name(&self) -> &str { &self.name }

    pub fn oracle(&self) -> Address { self.oracle }

    pub fn submission_fee(&self) -> U256 { self.submission_fee }

    pub fn rpc_url(&self) -> &str { &self.rpc_url }
}
