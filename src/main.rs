use anyhow::Result;
use labportal::bootstrap::{Bootstrap, ReadyStep};
use labportal::config::Config;
use labportal::logging::init_logging;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Labportal {} starting up", labportal::telemetry::RELEASE);

    // Session and wallet state live in the external store; the binary only
    // drives the sequence
    let mut app = Bootstrap::new(config)
        .session(ReadyStep::new("auth/initApp"))
        .wallet(ReadyStep::new("metamask/initWeb3"))
        .contracts(ReadyStep::new("metamask/contracts/initContracts"))
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Startup failed: {}", e))?;

    app.analytics()
        .track("App Mounted", serde_json::Map::new())
        .await;

    // One `filter value` expression per line, one formatted line out
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let rendered = match app.filters().render_expression(&line) {
            Ok(s) => s,
            Err(e) => {
                error!("{}", e);
                if let Some(t) = app.telemetry() {
                    t.capture_error(&e).await;
                }
                String::new()
            }
        };
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;

    // Contracts run alongside the filter loop and are only collected here
    if let Some(Err(e)) = app.join_contracts().await {
        error!("{}", e);
    }
    app.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}
