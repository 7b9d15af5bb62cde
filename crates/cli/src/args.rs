use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};

pub(crate) const DEFAULT_CHAIN_ID: u64 = 1;
pub(crate) const DEFAULT_RECEIPT_INTERVAL: u64 = 2;

#[derive(Parser, Debug)]
#[command(name = "carat-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Chain to operate on (1, 5, 137 or 80001)
    #[arg(long, global = true, default_value_t = DEFAULT_CHAIN_ID)]
    pub chain: u64,

    /// RPC endpoint to connect to [default: the chain's public endpoint]
    #[arg(long, global = true)]
    pub rpc: Option<String>,

    /// RPC throttling (req/sec) [default: none]
    #[arg(long, global = true)]
    pub rpc_throttle: Option<u32>,

    /// Oracle smart contract address [default: the chain's deployment]
    #[arg(long, global = true)]
    pub oracle: Option<Address>,

    /// Hex private key to sign submissions with [default: a throwaway key,
    /// reads only]
    #[arg(long, global = true, env = "CARAT_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Seconds between receipt probes while a submission confirms
    #[arg(long, global = true, default_value_t = DEFAULT_RECEIPT_INTERVAL)]
    pub receipt_interval: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show live oracle state for a collection, token or valuator
    Show {
        #[command(subcommand)]
        command: ShowCommands,
    },
    /// Submit a valuation and wait for it to confirm on-chain
    Submit {
        /// NFT collection contract address
        collection: Address,

        /// Token ID inside the collection
        #[arg(long)]
        token: String,

        /// Estimated value in native units, up to 18 decimal places
        #[arg(long)]
        value: String,

        /// Rarity score, up to 2 decimal places
        #[arg(long)]
        score: String,

        /// Rarity rank inside the collection (1 = rarest)
        #[arg(long)]
        rank: String,

        /// Valuation methodology, free text
        #[arg(long)]
        methodology: String,

        /// Confidence percentage (0-100)
        #[arg(long)]
        confidence: String,
    },
    /// Watch collection aggregates, refreshed until terminated (Ctrl+C)
    Watch {
        /// NFT collection contract address
        collection: Address,

        /// Seconds between refreshes
        #[arg(long, default_value_t = 10)]
        interval: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ShowCommands {
    /// Show the current valuation of a token
    Valuation {
        /// NFT collection contract address
        collection: Address,

        /// Token ID inside the collection
        token: U256,

        /// Show the full submission history instead of the latest record
        #[arg(long, default_value_t = false)]
        history: bool,
    },
    /// Show collection aggregates
    Stats {
        /// NFT collection contract address
        collection: Address,
    },
    /// Show the oracle's submission fee schedule
    Fees,
    /// Show how many valuations the oracle holds in total
    Totals,
    /// Show a valuator's standing
    Valuator {
        /// Valuator account address
        address: Address,
    },
}
