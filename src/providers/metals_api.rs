use super::util::RetryPolicy;
use crate::core::config::ProviderConfig;
use crate::core::error::ProviderError;
use crate::core::price::RateProvider;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::{debug, error, instrument};

#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    rates: HashMap<String, Option<f64>>,
}

/// Client for metals price APIs answering
/// `GET ?api_key=..&base=USD&currencies=XAU` with `{"rates": {"XAU": 0.0005}}`.
pub struct MetalsApiProvider {
    url: Url,
    symbol: String,
    timeout_secs: u64,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl MetalsApiProvider {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let url = Url::parse_with_params(
            &config.base_url,
            &[
                ("api_key", config.api_key.as_str()),
                ("base", config.base_currency.as_str()),
                ("currencies", config.symbol.as_str()),
            ],
        )
        .with_context(|| format!("Invalid provider base_url: {}", config.base_url))?;

        let client = reqwest::Client::builder()
            .user_agent("aurum/1.0")
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            url,
            symbol: config.symbol.clone(),
            timeout_secs: config.timeout_secs,
            retry: RetryPolicy::from_config(config),
            client,
        })
    }

    fn map_request_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout_secs)
        } else {
            ProviderError::Http(err)
        }
    }

    async fn send(&self) -> Result<reqwest::Response, ProviderError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.map_request_error(e))?;
        if response.status() != StatusCode::OK {
            return Err(ProviderError::Status(response.status()));
        }
        Ok(response)
    }
}

/// Errors worth another attempt: the provider may answer the next request.
fn is_transient(err: &ProviderError) -> bool {
    match err {
        ProviderError::Timeout(_) => true,
        ProviderError::Http(e) => e.is_connect() || e.is_request(),
        ProviderError::Status(status) => {
            status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
        }
        _ => false,
    }
}

#[async_trait]
impl RateProvider for MetalsApiProvider {
    #[instrument(
        name = "GoldRateFetch",
        skip(self),
        fields(symbol = %self.symbol)
    )]
    async fn fetch_raw_rate(&self) -> Result<Decimal, ProviderError> {
        // The query string carries the api key, so only the path is logged
        debug!("Requesting gold rate from {}", self.url.path());

        let response = self.retry.run(|| self.send(), is_transient).await?;

        let text = response
            .text()
            .await
            .map_err(|e| self.map_request_error(e))?;

        let data: RatesResponse = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) => {
                error!(
                    error = ?e,
                    response = %text,
                    "Failed to parse rate response"
                );
                return Err(ProviderError::Parse(e.to_string()));
            }
        };

        let rate = data
            .rates
            .get(&self.symbol)
            .copied()
            .flatten()
            .ok_or_else(|| ProviderError::MissingRate(self.symbol.clone()))?;

        // Go through the shortest decimal text so 0.0005 stays 0.0005
        let rate = Decimal::from_str(&rate.to_string())
            .map_err(|e| ProviderError::Parse(format!("rate {rate}: {e}")))?;
        debug!(%rate, "Received gold rate");
        Ok(rate)
    }
}
