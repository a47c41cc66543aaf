//! Raydium price API client (native chain)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{check_status, http_client, request_error};
use crate::domain::ChainClass;
use crate::ports::{PriceSource, PriceSourceError};

pub const RAYDIUM_PRICE_API: &str = "https://api.raydium.io/v2/main/price";

#[derive(Debug, Clone)]
pub struct RaydiumPriceSource {
    http: Client,
    api_url: String,
    timeout: Duration,
}

impl RaydiumPriceSource {
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, PriceSourceError> {
        Ok(Self {
            http: http_client(timeout)?,
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }
}

/// Price for `mint` out of a Raydium price map
///
/// The map is keyed by mint; values are either a bare number or an object
/// with a `price` field. A mint missing from the map has no price (`0.0`).
fn parse_price(body: &Value, mint: &str) -> Result<f64, PriceSourceError> {
    let map = body
        .as_object()
        .ok_or_else(|| PriceSourceError::ParseError("expected a JSON object".to_string()))?;

    let entry = match map.get(mint) {
        Some(entry) => entry,
        None => return Ok(0.0),
    };

    let price = match entry {
        Value::Object(obj) => obj.get("price").cloned().unwrap_or(Value::Null),
        other => other.clone(),
    };

    match price {
        Value::Null => Ok(0.0),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| PriceSourceError::ParseError(format!("bad price for {}", mint))),
        Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| PriceSourceError::ParseError(format!("bad price '{}': {}", s, e))),
        other => Err(PriceSourceError::ParseError(format!("unexpected price value {}", other))),
    }
}

#[async_trait]
impl PriceSource for RaydiumPriceSource {
    fn name(&self) -> &'static str {
        "raydium"
    }

    fn supports(&self, chain: ChainClass) -> bool {
        chain == ChainClass::SecondaryPrimary
    }

    async fn price_usd(&self, address: &str) -> Result<f64, PriceSourceError> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[("ids", address)])
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        check_status(&response)?;

        let body: Value = response.json().await?;
        parse_price(&body, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::TcpListener;

    const MINT: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

    fn keyed(mint: &str, value: Value) -> Value {
        let mut map = serde_json::Map::new();
        map.insert(mint.to_string(), value);
        Value::Object(map)
    }

    #[test]
    fn test_bare_number() {
        let body = keyed(MINT, json!(0.0000213));
        assert_eq!(parse_price(&body, MINT), Ok(0.0000213));
    }

    #[test]
    fn test_object_with_price() {
        let body = keyed(MINT, json!({ "price": "1.5" }));
        assert_eq!(parse_price(&body, MINT), Ok(1.5));
    }

    #[test]
    fn test_missing_mint_is_zero() {
        let body = json!({ "So11111111111111111111111111111111111111112": 150.0 });
        assert_eq!(parse_price(&body, MINT), Ok(0.0));
    }

    #[test]
    fn test_mint_lookup_is_case_sensitive() {
        let body = keyed(MINT, json!(2.0));
        assert_eq!(parse_price(&body, &MINT.to_lowercase()), Ok(0.0));
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_price(&json!([1, 2]), MINT).is_err());
        assert!(parse_price(&keyed(MINT, json!(true)), MINT).is_err());
    }

    #[test]
    fn test_supports_native_only() {
        let source = RaydiumPriceSource::new(RAYDIUM_PRICE_API, Duration::from_secs(1)).unwrap();
        assert!(source.supports(ChainClass::SecondaryPrimary));
        assert!(!source.supports(ChainClass::Primary));
    }

    #[tokio::test]
    async fn test_silent_server_is_timeout() {
        // Accepts the connection in the backlog but never answers
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let timeout = Duration::from_millis(100);
        let source = RaydiumPriceSource::new(&url, timeout).unwrap();

        assert_eq!(source.price_usd(MINT).await, Err(PriceSourceError::Timeout(timeout)));
    }
}
