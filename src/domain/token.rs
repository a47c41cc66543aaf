//! Token Snapshot
//!
//! Point-in-time market data for one candidate token, as handed over by the
//! discovery collaborator. The raw form is loose (camelCase keys, numbers that
//! may arrive as strings, optional sentiment); `TokenSnapshot` is the validated
//! form every gate works on.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::chain::{ChainClass, PRIMARY_CHAIN_ID};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("Snapshot has no address")]
    MissingAddress,

    #[error("Field {field} must be finite and >= 0, got {value}")]
    InvalidNumber { field: &'static str, value: f64 },
}

/// Snapshot exactly as discovery serializes it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenSnapshot {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price_usd: Option<f64>,
    #[serde(default, alias = "volume_24h", deserialize_with = "lenient_f64")]
    pub volume24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub liquidity: Option<f64>,
    #[serde(default, alias = "sent_score", deserialize_with = "lenient_f64")]
    pub sentiment_score: Option<f64>,
    #[serde(default, alias = "sent_mentions", deserialize_with = "lenient_f64")]
    pub sentiment_mentions: Option<f64>,
    #[serde(default, alias = "is_trusted")]
    pub is_trusted: bool,
}

/// Accept `1.5`, `"1.5"`, `null` or `""` for numeric fields
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrString::Number(n)) => Ok(Some(n)),
        Some(NumberOrString::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrString::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Validated snapshot, immutable for the duration of an evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSnapshot {
    /// Address as reported (case preserved; base58 addresses are case-sensitive)
    address: String,
    /// Lower-cased address used for every cache/registry lookup
    key: String,
    chain_id: String,
    chain: ChainClass,
    pub symbol: String,
    pub price_usd: f64,
    pub volume_24h: f64,
    pub liquidity: f64,
    pub sentiment_score: i64,
    pub sentiment_mentions: i64,
    pub is_trusted: bool,
}

impl TokenSnapshot {
    /// Build a snapshot directly (used by tests and in-process callers)
    pub fn new(
        address: &str,
        chain_id: &str,
        symbol: &str,
        price_usd: f64,
        volume_24h: f64,
        liquidity: f64,
    ) -> Result<Self, SnapshotError> {
        RawTokenSnapshot {
            address: Some(address.to_string()),
            chain_id: Some(chain_id.to_string()),
            symbol: Some(symbol.to_string()),
            price_usd: Some(price_usd),
            volume24h: Some(volume_24h),
            liquidity: Some(liquidity),
            ..Default::default()
        }
        .try_into()
    }

    /// Set sentiment fields
    pub fn with_sentiment(mut self, score: i64, mentions: i64) -> Self {
        self.sentiment_score = score;
        self.sentiment_mentions = mentions;
        self
    }

    /// Mark the snapshot as trusted
    pub fn trusted(mut self) -> Self {
        self.is_trusted = true;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Lower-cased address
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn chain(&self) -> ChainClass {
        self.chain
    }
}

fn non_negative(field: &'static str, value: Option<f64>) -> Result<f64, SnapshotError> {
    let value = value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        return Err(SnapshotError::InvalidNumber { field, value });
    }
    Ok(value)
}

impl TryFrom<RawTokenSnapshot> for TokenSnapshot {
    type Error = SnapshotError;

    fn try_from(raw: RawTokenSnapshot) -> Result<Self, Self::Error> {
        let address = raw
            .address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .ok_or(SnapshotError::MissingAddress)?;

        let chain_id = raw
            .chain_id
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| PRIMARY_CHAIN_ID.to_string());

        Ok(Self {
            key: address.to_lowercase(),
            chain: ChainClass::from_chain_id(&chain_id),
            address,
            chain_id,
            symbol: raw.symbol.unwrap_or_else(|| "UNKNOWN".to_string()),
            price_usd: non_negative("priceUsd", raw.price_usd)?,
            volume_24h: non_negative("volume24h", raw.volume24h)?,
            liquidity: non_negative("liquidity", raw.liquidity)?,
            sentiment_score: raw.sentiment_score.unwrap_or(0.0) as i64,
            sentiment_mentions: raw.sentiment_mentions.unwrap_or(0.0) as i64,
            is_trusted: raw.is_trusted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_discovery_json() {
        let json = r#"{
            "address": "0xABCdef",
            "chainId": "Ethereum",
            "symbol": "PEPE",
            "priceUsd": "0.0012",
            "volume24h": 25000,
            "liquidity": 12000.5,
            "sent_score": 44,
            "sent_mentions": 2
        }"#;
        let raw: RawTokenSnapshot = serde_json::from_str(json).unwrap();
        let snapshot = TokenSnapshot::try_from(raw).unwrap();

        assert_eq!(snapshot.address(), "0xABCdef");
        assert_eq!(snapshot.key(), "0xabcdef");
        assert_eq!(snapshot.chain(), ChainClass::Primary);
        assert_eq!(snapshot.price_usd, 0.0012);
        assert_eq!(snapshot.volume_24h, 25_000.0);
        assert_eq!(snapshot.sentiment_score, 44);
        assert_eq!(snapshot.sentiment_mentions, 2);
        assert!(!snapshot.is_trusted);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let raw: RawTokenSnapshot = serde_json::from_str(r#"{"address": "0x1"}"#).unwrap();
        let snapshot = TokenSnapshot::try_from(raw).unwrap();

        assert_eq!(snapshot.chain_id(), "ethereum");
        assert_eq!(snapshot.symbol, "UNKNOWN");
        assert_eq!(snapshot.price_usd, 0.0);
        assert_eq!(snapshot.sentiment_score, 0);
        assert_eq!(snapshot.sentiment_mentions, 0);
    }

    #[test]
    fn test_missing_address_rejected() {
        let raw: RawTokenSnapshot = serde_json::from_str(r#"{"address": "  ", "priceUsd": 1}"#).unwrap();
        assert_eq!(TokenSnapshot::try_from(raw), Err(SnapshotError::MissingAddress));
    }

    #[test]
    fn test_negative_numbers_rejected() {
        let result = TokenSnapshot::new("0x1", "ethereum", "X", 1.0, -5.0, 10.0);
        assert!(matches!(
            result,
            Err(SnapshotError::InvalidNumber { field: "volume24h", .. })
        ));
    }

    #[test]
    fn test_native_address_keeps_case() {
        let snapshot = TokenSnapshot::new(
            "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
            "solana",
            "BONK",
            0.00002,
            1_000_000.0,
            500_000.0,
        )
        .unwrap();
        assert_eq!(snapshot.address(), "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263");
        assert_eq!(snapshot.key(), "dezxaz8z7pnrnrjjz3wxborgixca6xjnb7yab1ppb263");
        assert_eq!(snapshot.chain(), ChainClass::SecondaryPrimary);
    }
}
