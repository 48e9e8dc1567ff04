use anyhow::{Context, Result};
use chrono::Local;
use tracing::info;
use crate::config::{Config, DataConfig, EnvConfig};
use crate::data::fetcher::MarketDataClient;
use crate::data::types::MarketFrame;
use crate::data::{loader, reconcile, DataError};
use crate::forecast::pipeline::run_forecast;
use crate::notify::recipients::load_recipients;
use crate::notify::{ForecastReport, Notifier, SmtpConnector};

/// Fetch, reconcile, forecast and mail the daily report.
pub async fn run_predict(config: &Config, env: &EnvConfig) -> Result<ForecastReport> {
    let client = MarketDataClient::new(&config.data, env.price_api_key.clone());
    let frame = prepare_data(&client, &config.data)
        .await
        .context("Error preparing data")?;

    let now = Local::now();
    let outcome = run_forecast(&frame, &config.forecast, now.date_naive())?;

    let today = frame.last().context("Error preparing data: no rows loaded")?;
    let report = ForecastReport::new(
        today,
        outcome.greed,
        outcome.price,
        now.naive_local(),
        config.notify.correction_threshold,
        config.notify.milestones.clone(),
    );

    if config.system.dry_run || env.dry_run {
        info!("Dry run, report not sent:\n{}", report.render_html());
        return Ok(report);
    }

    let sent = send_report(config, env, report.clone())
        .await
        .context("Failed to send email")?;
    info!("Forecast mailed to {} recipients", sent);

    Ok(report)
}

/// Refresh the CSV from both APIs and load it back.
async fn prepare_data(client: &MarketDataClient, config: &DataConfig) -> Result<MarketFrame, DataError> {
    let (greed, prices) = client.fetch_all().await?;
    let rows = reconcile::reconcile(&greed, &prices, config.match_tolerance_secs)?;
    reconcile::write_csv(&rows, &config.csv_path)?;

    loader::load_frame(&config.csv_path)
}

async fn send_report(config: &Config, env: &EnvConfig, report: ForecastReport) -> Result<usize> {
    let (sender, password) = env.smtp_credentials()?;
    let recipients = load_recipients(&config.notify.recipients_path)?;
    let notifier = Notifier::new(
        SmtpConnector::new(sender.clone(), password),
        config.notify.smtp_host.clone(),
        config.notify.smtp_port,
        sender,
        config.notify.subject.clone(),
    );

    let sent = tokio::task::spawn_blocking(move || notifier.send_report(&report, &recipients)).await??;
    Ok(sent)
}
