use carat_sdk::{client::OracleClient, types::ValuationRequest};
use colored::Colorize;

pub(crate) async fn render(
    client: &OracleClient,
    request: &ValuationRequest,
) -> anyhow::Result<()> {
    println!(
        "\n{}\n",
        format!("**** Submitting valuation {} #{}", request.collection, request.token_id)
            .bright_blue()
    );
    println!(
        "  value {} / score {} / rank {} / confidence {}%",
        request.estimated_value, request.rarity_score, request.rarity_rank, request.confidence,
    );

    let hash = client.submit_valuation(request, tokio::time::sleep).await?;

    println!("\n{}\n", format!("Confirmed in transaction {hash}").green());

    Ok(())
}
