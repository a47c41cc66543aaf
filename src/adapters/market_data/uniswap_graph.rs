//! Uniswap v3 subgraph price source (EVM chain)
//!
//! USD price = token.derivedETH * bundle.ethPriceUSD

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{check_status, http_client, request_error};
use crate::domain::ChainClass;
use crate::ports::{PriceSource, PriceSourceError};

pub const UNISWAP_V3_SUBGRAPH: &str = "https://api.thegraph.com/subgraphs/name/uniswap/uniswap-v3";

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: Option<GraphData>,
    #[serde(default)]
    errors: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct GraphData {
    token: Option<GraphToken>,
    bundle: Option<GraphBundle>,
}

#[derive(Debug, Deserialize)]
struct GraphToken {
    #[serde(rename = "derivedETH")]
    derived_eth: String,
}

#[derive(Debug, Deserialize)]
struct GraphBundle {
    #[serde(rename = "ethPriceUSD")]
    eth_price_usd: String,
}

#[derive(Debug, Clone)]
pub struct UniswapGraphPriceSource {
    http: Client,
    endpoint: String,
    timeout: Duration,
}

impl UniswapGraphPriceSource {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, PriceSourceError> {
        Ok(Self {
            http: http_client(timeout)?,
            endpoint: endpoint.to_string(),
            timeout,
        })
    }
}

fn price_query(address: &str) -> String {
    format!(
        r#"{{ token(id: "{}") {{ derivedETH }} bundle(id: "1") {{ ethPriceUSD }} }}"#,
        address.to_lowercase()
    )
}

fn parse_decimal(field: &str, value: &str) -> Result<f64, PriceSourceError> {
    value
        .parse::<f64>()
        .map_err(|e| PriceSourceError::ParseError(format!("{} '{}': {}", field, value, e)))
}

/// A token the subgraph does not index is a failed lookup, not a zero price
fn price_from_response(response: GraphResponse) -> Result<f64, PriceSourceError> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        return Err(PriceSourceError::ParseError(format!("graph errors: {:?}", errors)));
    }

    let data = response
        .data
        .ok_or_else(|| PriceSourceError::ParseError("missing data".to_string()))?;
    let (token, bundle) = match (data.token, data.bundle) {
        (Some(token), Some(bundle)) => (token, bundle),
        _ => {
            return Err(PriceSourceError::ParseError(
                "missing token/bundle in response".to_string(),
            ))
        }
    };

    let derived_eth = parse_decimal("derivedETH", &token.derived_eth)?;
    let eth_usd = parse_decimal("ethPriceUSD", &bundle.eth_price_usd)?;
    Ok(derived_eth * eth_usd)
}

#[async_trait]
impl PriceSource for UniswapGraphPriceSource {
    fn name(&self) -> &'static str {
        "uniswap-graph"
    }

    fn supports(&self, chain: ChainClass) -> bool {
        chain == ChainClass::Primary
    }

    async fn price_usd(&self, address: &str) -> Result<f64, PriceSourceError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&serde_json::json!({ "query": price_query(address) }))
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        check_status(&response)?;

        let body: GraphResponse = response.json().await?;
        price_from_response(body)
    }
}
