use std::{io::Write, time::Duration};

use alloy::primitives::Address;
use carat_sdk::client::OracleClient;
use crossterm::{
    QueueableCommand,
    cursor::MoveTo,
    execute,
    style::Print,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use tabled::{Table, settings::Style};
use tokio_util::sync::CancellationToken;

pub(crate) async fn render(
    client: &OracleClient,
    collection: Address,
    interval: Duration,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();

    execute!(stdout, EnterAlternateScreen, Clear(ClearType::All), MoveTo(0, 0))?;

    loop {
        let stats = client.collection_stats(collection).await?;

        let mut table = Table::new([stats]);
        table.with(Style::sharp());

        stdout.queue(Clear(ClearType::All))?;
        stdout.queue(MoveTo(0, 0))?;
        stdout.queue(Print(format!("**** Collection {collection}\n\n")))?;
        stdout.queue(Print(table))?;
        stdout.flush()?;

        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {},
        }
    }

    execute!(stdout, LeaveAlternateScreen)?;

    Ok(())
}
