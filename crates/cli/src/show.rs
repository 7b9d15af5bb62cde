use alloy::primitives::{Address, U256};
use carat_sdk::client::OracleClient;
use colored::Colorize;
use tabled::{Table, Tabled, settings::Style};

pub(crate) async fn valuation(
    client: &OracleClient,
    collection: Address,
    token: U256,
    history: bool,
) -> anyhow::Result<()> {
    if history {
        let records = client.valuation_history(collection, token).await?;
        if records.is_empty() {
            println!("No valuations recorded for {collection} #{token}");
            return Ok(());
        }

        println!("\n{}\n", format!("**** Valuation history {collection} #{token}").bright_blue());
        let mut table = Table::new(&records);
        table.with(Style::sharp());
        println!("{table}");
    } else {
        match client.current_valuation(collection, token).await? {
            Some(record) => {
                println!("\n{}\n", format!("**** Valuation {collection} #{token}").bright_blue());
                let mut table = Table::new([record]);
                table.with(Style::sharp());
                println!("{table}");
            },
            None => println!("No valuation recorded for {collection} #{token}"),
        }
    }

    Ok(())
}

pub(crate) async fn stats(client: &OracleClient, collection: Address) -> anyhow::Result<()> {
    let stats = client.collection_stats(collection).await?;

    println!("\n{}\n", format!("**** Collection {collection}").bright_blue());
    let mut table = Table::new([stats]);
    table.with(Style::sharp());
    println!("{table}");

    Ok(())
}

pub(crate) async fn fees(client: &OracleClient) -> anyhow::Result<()> {
    let fees = client.fees().await?;

    println!("\n{}\n", "**** Submission fees".bright_blue());
    let mut table = Table::new([fees]);
    table.with(Style::sharp());
    println!("{table}");

    Ok(())
}

pub(crate) async fn totals(client: &OracleClient) -> anyhow::Result<()> {
    let total = client.total_valuations().await?;

    println!("\n{}\n", format!("**** {total} valuation(s) recorded").bright_blue());

    Ok(())
}

#[derive(Tabled)]
struct ValuatorDetails {
    #[tabled(rename = "Valuator")]
    address: String,
    #[tabled(rename = "Authorized")]
    authorized: String,
    #[tabled(rename = "Reputation")]
    reputation: u64,
}

pub(crate) async fn valuator(client: &OracleClient, address: Address) -> anyhow::Result<()> {
    let authorized = client.is_authorized_valuator(address).await?;
    let reputation = client.valuator_reputation(address).await?;

    println!("\n{}\n", format!("**** Valuator {address}").bright_blue());
    let mut table = Table::new([ValuatorDetails {
        address: address.to_string(),
        authorized: if authorized {
            "yes".green().to_string()
        } else {
            "no".red().to_string()
        },
        reputation,
    }]);
    table.with(Style::sharp());
    println!("{table}");

    Ok(())
}
