// risk-client-rs/src/main.rs
// Risk Monitor - polls the accident-risk prediction service and logs each result

use anyhow::Context;
use dotenv::dotenv;
use risk_client::config::{ConfigProviderExt, DEFAULT_PROVIDER};
use risk_client::{advisory_for, PredictionClient, PredictionConfig, PredictionPoller, PredictionSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PredictionConfig::from_env().context("Failed to load prediction configuration")?;
    let client = PredictionClient::new_with_config(&config).context("Failed to build prediction client")?;

    for endpoint in &config.endpoints {
        log::info!("Configured endpoint: {}", endpoint);
    }

    let poll_once = DEFAULT_PROVIDER
        .get_optional_bool("poll_once")
        .context("Invalid RISK_POLL_ONCE")?
        .unwrap_or(false);

    if poll_once {
        let outcome = client.scan().await?;

        if let Some(text) = advisory_for(&outcome.prediction) {
            log::info!("Advisory: {}", text);
        }

        println!("{}", serde_json::to_string_pretty(&outcome.prediction)?);
        return Ok(());
    }

    let poller = PredictionPoller::from_config(client, &config);
    poller.start().await;

    log::info!("Risk Monitor polling every {:?}, press Ctrl-C to stop", config.poll_interval);

    let mut last_seen = 0;
    let mut report = tokio::time::interval(std::time::Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("Shutdown requested");
                break;
            }
            _ = report.tick() => {
                let status = poller.status().await;
                if status.scan_count == last_seen {
                    continue;
                }
                last_seen = status.scan_count;

                log::info!("Status: {}", status.message);
                match (&status.last_prediction, status.attempts.back()) {
                    (Some(prediction), _) if status.message != risk_client::poller::STATUS_NETWORK_ERROR => {
                        log::info!(
                            "Risk: {} ({:.0}%) via {}",
                            prediction.risk,
                            prediction.probability * 100.0,
                            status.last_endpoint.as_deref().unwrap_or("unknown")
                        );
                        if let Some(text) = advisory_for(prediction) {
                            log::info!("Advisory: {}", text);
                        }
                    }
                    (_, Some(last_error)) => log::warn!("{}", last_error),
                    _ => {}
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}
