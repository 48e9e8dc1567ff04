use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};
use crate::config::DataConfig;
use crate::data::types::{GreedRecord, PriceRecord};
use crate::data::DataError;

pub struct MarketDataClient {
    client: Client,
    greed_url: String,
    greed_limit: u32,
    price_url: String,
    price_symbol: String,
    price_currency: String,
    price_limit: u32,
    price_api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreedResponse {
    #[serde(default)]
    data: Vec<GreedRecord>,
}

#[derive(Debug, Deserialize)]
struct HistodayResponse {
    #[serde(rename = "Response", default)]
    response: Option<String>,
    #[serde(rename = "Message", default)]
    message: Option<String>,
    #[serde(rename = "Data", default)]
    data: HistodayData,
}

#[derive(Debug, Deserialize, Default)]
struct HistodayData {
    #[serde(rename = "Data", default)]
    data: Vec<PriceRecord>,
}

impl MarketDataClient {
    pub fn new(config: &DataConfig, price_api_key: Option<String>) -> Self {
        Self::with_client(Client::new(), config, price_api_key)
    }

    pub fn with_client(client: Client, config: &DataConfig, price_api_key: Option<String>) -> Self {
        Self {
            client,
            greed_url: config.greed_url.clone(),
            greed_limit: config.greed_limit,
            price_url: config.price_url.clone(),
            price_symbol: config.price_symbol.clone(),
            price_currency: config.price_currency.clone(),
            price_limit: config.price_limit,
            price_api_key,
        }
    }

    /// Fetch the full greed index history, newest first.
    pub async fn fetch_greed_index(&self) -> Result<Vec<GreedRecord>, DataError> {
        let limit = self.greed_limit.to_string();

        let response: GreedResponse = self.client
            .get(&self.greed_url)
            .query(&[("limit", limit.as_str()), ("date_format", "eu")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.data.is_empty() {
            return Err(DataError::EmptyDataset("greed index"));
        }

        info!("Fetched {} greed index records", response.data.len());
        Ok(response.data)
    }

    /// Fetch daily price history, oldest first.
    pub async fn fetch_price_history(&self) -> Result<Vec<PriceRecord>, DataError> {
        let limit = self.price_limit.to_string();
        let mut query = vec![
            ("fsym", self.price_symbol.as_str()),
            ("tsym", self.price_currency.as_str()),
            ("limit", limit.as_str()),
        ];
        if let Some(key) = &self.price_api_key {
            query.push(("api_key", key.as_str()));
        }

        let response: HistodayResponse = self.client
            .get(&self.price_url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.data.data.is_empty() {
            if response.response.as_deref() == Some("Error") {
                warn!(
                    "Price API reported an error: {}",
                    response.message.as_deref().unwrap_or("no message")
                );
            }
            return Err(DataError::EmptyDataset("price history"));
        }

        info!(
            "Fetched {} {}/{} price records",
            response.data.data.len(),
            self.price_symbol,
            self.price_currency
        );
        Ok(response.data.data)
    }

    /// Fetch both datasets; either one failing aborts.
    pub async fn fetch_all(&self) -> Result<(Vec<GreedRecord>, Vec<PriceRecord>), DataError> {
        let greed = self.fetch_greed_index().await?;
        let prices = self.fetch_price_history().await?;
        Ok((greed, prices))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> MarketDataClient {
        let config = DataConfig {
            greed_url: server.url("/fng/"),
            price_url: server.url("/data/v2/histoday"),
            ..DataConfig::default()
        };
        MarketDataClient::with_client(Client::new(), &config, Some("secret".to_string()))
    }

    #[tokio::test]
    async fn test_fetch_all_parses_both_payloads() {
        let server = MockServer::start_async().await;

        let greed_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/fng/")
                    .query_param("limit", "100000")
                    .query_param("date_format", "eu");
                then.status(200).json_body(serde_json::json!({
                    "name": "Fear and Greed Index",
                    "data": [
                        { "value": "75", "value_classification": "Greed", "timestamp": "22-03-2024" },
                        { "value": "78", "value_classification": "Extreme Greed", "timestamp": "21-03-2024" }
                    ],
                    "metadata": { "error": null }
                }));
            })
            .await;

        let price_mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/data/v2/histoday")
                    .query_param("fsym", "BTC")
                    .query_param("tsym", "USD")
                    .query_param("limit", "2000")
                    .query_param("api_key", "secret");
                then.status(200).json_body(serde_json::json!({
                    "Response": "Success",
                    "Data": {
                        "Aggregated": false,
                        "Data": [
                            { "time": 1710979200, "open": 67857.3, "close": 65493.22 },
                            { "time": 1711065600, "open": 65493.22, "close": 63778.76 }
                        ]
                    }
                }));
            })
            .await;

        let (greed, prices) = client_for(&server).fetch_all().await.unwrap();

        greed_mock.assert_async().await;
        price_mock.assert_async().await;
        assert_eq!(greed.len(), 2);
        assert_eq!(greed[0].value.as_deref(), Some("75"));
        assert_eq!(greed[0].timestamp, "22-03-2024");
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].time, 1710979200);
        assert_eq!(prices[1].open, Some(65493.22));
    }

    #[tokio::test]
    async fn test_empty_greed_payload_is_rejected() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/fng/");
                then.status(200).json_body(serde_json::json!({ "data": [] }));
            })
            .await;

        let err = client_for(&server).fetch_all().await.unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset("greed index")));
    }

    #[tokio::test]
    async fn test_price_api_error_payload_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/v2/histoday");
                then.status(200).json_body(serde_json::json!({
                    "Response": "Error",
                    "Message": "You are over your rate limit",
                    "Data": {}
                }));
            })
            .await;

        let err = client_for(&server).fetch_price_history().await.unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset("price history")));
    }

    #[tokio::test]
    async fn test_http_error_status_aborts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/fng/");
                then.status(503);
            })
            .await;

        let err = client_for(&server).fetch_greed_index().await.unwrap_err();
        assert!(matches!(err, DataError::Http(_)));
    }
}
