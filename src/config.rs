use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SystemConfig {
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_greed_url")]
    pub greed_url: String,
    #[serde(default = "default_greed_limit")]
    pub greed_limit: u32,
    #[serde(default = "default_price_url")]
    pub price_url: String,
    #[serde(default = "default_price_symbol")]
    pub price_symbol: String,
    #[serde(default = "default_price_currency")]
    pub price_currency: String,
    #[serde(default = "default_price_limit")]
    pub price_limit: u32,
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
    #[serde(default = "default_match_tolerance")]
    pub match_tolerance_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_horizon")]
    pub horizon_days: usize,
    /// (p, d, q) for the greed coefficient model
    #[serde(default = "default_greed_order")]
    pub greed_order: [usize; 3],
    /// (p, d, q) for the price model
    #[serde(default = "default_price_order")]
    pub price_order: [usize; 3],
    /// (P, D, Q, s) for the price model
    #[serde(default = "default_price_seasonal_order")]
    pub price_seasonal_order: [usize; 4],
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_recipients_path")]
    pub recipients_path: String,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_correction_threshold")]
    pub correction_threshold: f64,
    /// Forecast days reported as percentage price changes
    #[serde(default = "default_milestones")]
    pub milestones: Vec<usize>,
}

fn default_greed_url() -> String { "https://api.alternative.me/fng/".to_string() }
fn default_greed_limit() -> u32 { 100_000 }
fn default_price_url() -> String { "https://min-api.cryptocompare.com/data/v2/histoday".to_string() }
fn default_price_symbol() -> String { "BTC".to_string() }
fn default_price_currency() -> String { "USD".to_string() }
fn default_price_limit() -> u32 { 2000 }
fn default_csv_path() -> String { "data.csv".to_string() }
fn default_match_tolerance() -> i64 { crate::data::reconcile::DEFAULT_TOLERANCE_SECS }

fn default_horizon() -> usize { 10 }
fn default_greed_order() -> [usize; 3] { [1, 0, 2] }
fn default_price_order() -> [usize; 3] { [5, 0, 0] }
fn default_price_seasonal_order() -> [usize; 4] { [2, 1, 0, 7] }
fn default_max_iter() -> usize { 1000 }

fn default_smtp_host() -> String { "smtp.gmail.com".to_string() }
fn default_smtp_port() -> u16 { 465 }
fn default_recipients_path() -> String { "reciever_emails.csv".to_string() }
fn default_subject() -> String { "Today's BTC prediction".to_string() }
fn default_correction_threshold() -> f64 { 100.0 }
fn default_milestones() -> Vec<usize> { vec![5, 10] }

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            greed_url: default_greed_url(),
            greed_limit: default_greed_limit(),
            price_url: default_price_url(),
            price_symbol: default_price_symbol(),
            price_currency: default_price_currency(),
            price_limit: default_price_limit(),
            csv_path: default_csv_path(),
            match_tolerance_secs: default_match_tolerance(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon(),
            greed_order: default_greed_order(),
            price_order: default_price_order(),
            price_seasonal_order: default_price_seasonal_order(),
            max_iter: default_max_iter(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            recipients_path: default_recipients_path(),
            subject: default_subject(),
            correction_threshold: default_correction_threshold(),
            milestones: default_milestones(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub price_api_key: Option<String>,
    pub smtp_sender: Option<String>,
    pub smtp_password: Option<String>,
    pub dry_run: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {}", path))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }
}

impl EnvConfig {
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        Ok(Self {
            price_api_key: std::env::var("PRICE_API_KEY").ok(),
            smtp_sender: std::env::var("SMTP_SENDER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            dry_run: std::env::var("DRY_RUN")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }

    /// Sender address and password; only needed when mail actually goes out.
    pub fn smtp_credentials(&self) -> Result<(String, String)> {
        let sender = self.smtp_sender.clone().context("SMTP_SENDER not set")?;
        let password = self.smtp_password.clone().context("SMTP_PASSWORD not set")?;
        Ok((sender, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [system]
            dry_run = true

            [data]
            csv_path = "out.csv"
            match_tolerance_secs = 3600

            [forecast]
            horizon_days = 7
            price_seasonal_order = [1, 1, 0, 7]

            [notify]
            smtp_port = 2465
            milestones = [3, 7]
            "#,
        )
        .unwrap();

        assert!(config.system.dry_run);
        assert_eq!(config.data.csv_path, "out.csv");
        assert_eq!(config.data.match_tolerance_secs, 3600);
        assert_eq!(config.data.price_symbol, "BTC");
        assert_eq!(config.forecast.horizon_days, 7);
        assert_eq!(config.forecast.greed_order, [1, 0, 2]);
        assert_eq!(config.forecast.price_seasonal_order, [1, 1, 0, 7]);
        assert_eq!(config.notify.smtp_port, 2465);
        assert_eq!(config.notify.smtp_host, "smtp.gmail.com");
        assert_eq!(config.notify.milestones, vec![3, 7]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();

        assert!(!config.system.dry_run);
        assert_eq!(config.data.csv_path, "data.csv");
        assert_eq!(config.data.match_tolerance_secs, 86_400);
        assert_eq!(config.forecast.horizon_days, 10);
        assert_eq!(config.forecast.price_order, [5, 0, 0]);
        assert_eq!(config.forecast.max_iter, 1000);
        assert_eq!(config.notify.smtp_port, 465);
        assert_eq!(config.notify.recipients_path, "reciever_emails.csv");
    }

    #[test]
    fn test_missing_credentials_error() {
        let env = EnvConfig {
            price_api_key: None,
            smtp_sender: Some("bot@example.com".to_string()),
            smtp_password: None,
            dry_run: false,
        };

        let err = env.smtp_credentials().unwrap_err();
        assert!(err.to_string().contains("SMTP_PASSWORD"));
    }
}
