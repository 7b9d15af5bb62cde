pub mod args;
mod provider;
mod show;
mod submit;
mod watch;

use std::{sync::Arc, time::Duration};

use alloy::signers::local::PrivateKeySigner;
use anyhow::Context;
use args::Cli;
use carat_sdk::{Chain, client::OracleClient, types::ValuationRequest};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crate::{
    args::{Commands, ShowCommands},
    provider::RpcWalletProvider,
};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut chain = Chain::by_id(cli.chain)
        .with_context(|| format!("unsupported chain ID {}, see `--chain`", cli.chain))?;
    if let Some(oracle) = cli.oracle {
        chain = chain.with_oracle(oracle);
    }
    if let Some(rpc) = &cli.rpc {
        chain = chain.with_rpc_url(rpc.clone());
    }

    let signer = match &cli.private_key {
        Some(key) => key.parse::<PrivateKeySigner>().context("parsing private key")?,
        None if matches!(cli.command, Commands::Submit { .. }) => {
            return Err(anyhow::anyhow!(
                "submissions sign transactions, set `--private-key` or CARAT_PRIVATE_KEY"
            ));
        },
        // Reads only need an account to bind to.
        None => PrivateKeySigner::random(),
    };

    let provider = RpcWalletProvider::connect(chain.rpc_url(), cli.rpc_throttle, signer).await?;
    if provider.chain_id() != chain.chain_id() {
        return Err(anyhow::anyhow!(
            "RPC endpoint is on chain {}, expected {} ({})",
            provider.chain_id(),
            chain.chain_id(),
            chain.name(),
        ));
    }

    let client = OracleClient::new(chain, Some(Arc::new(provider) as _))
        .with_receipt_interval(Duration::from_secs(cli.receipt_interval));
    client.initialize().await.context("initializing session")?;
    let session = client.connect().await.context("establishing session")?;
    if let Some(account) = session.account {
        tracing::info!(%account, chain = client.chain().name(), "session established");
    }

    let cancellation_signal = CancellationToken::new();
    let cancellation_token = cancellation_signal.child_token();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        cancellation_signal.cancel();
    });

    match &cli.command {
        Commands::Show { command } => match command {
            ShowCommands::Valuation { collection, token, history } => {
                show::valuation(&client, *collection, *token, *history).await?
            },
            ShowCommands::Stats { collection } => show::stats(&client, *collection).await?,
            ShowCommands::Fees => show::fees(&client).await?,
            ShowCommands::Totals => show::totals(&client).await?,
            ShowCommands::Valuator { address } => show::valuator(&client, *address).await?,
        },
        Commands::Submit { collection, token, value, score, rank, methodology, confidence } => {
            let request = ValuationRequest {
                collection: *collection,
                token_id: token.clone(),
                estimated_value: value.clone(),
                rarity_score: score.clone(),
                rarity_rank: rank.clone(),
                methodology: methodology.clone(),
                confidence: confidence.clone(),
            };
            submit::render(&client, &request).await?
        },
        Commands::Watch { collection, interval } => {
            watch::render(
                &client,
                *collection,
                Duration::from_secs(*interval),
                cancellation_token,
            )
            .await?
        },
    }

    client.shutdown();

    Ok(())
}
