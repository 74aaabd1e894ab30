use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// IP lookup response. The service answers in GBK-encoded JSON.
#[derive(Debug, Deserialize)]
struct IpJsonResponse {
    #[serde(default)]
    city: Option<String>,
}

pub const UNKNOWN_CITY: &str = "Unknown city";

#[derive(Debug, Clone)]
pub struct PconlineClient {
    client: Client,
    base_url: String,
}

impl PconlineClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, GeoError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    /// City for `ip`, or `UNKNOWN_CITY` when the service has none.
    pub async fn city(&self, ip: &str) -> Result<String, GeoError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("ip", ip), ("json", "true")])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(GeoError::Status(status));
        }

        let body = response.bytes().await?;
        debug!("Geolocation response for {}: {} bytes", ip, body.len());
        parse_city(&body)
    }
}

/// Decode a GBK body, falling back to lossy UTF-8, and extract the city.
pub fn parse_city(body: &[u8]) -> Result<String, GeoError> {
    let (decoded, _, had_errors) = encoding_rs::GBK.decode(body);
    let text = if had_errors {
        String::from_utf8_lossy(body).into_owned()
    } else {
        decoded.into_owned()
    };

    let parsed: IpJsonResponse = serde_json::from_str(text.trim())?;
    let city = parsed.city.unwrap_or_default();
    let city = city.trim();
    if city.is_empty() || city == "null" {
        Ok(UNKNOWN_CITY.to_string())
    } else {
        Ok(city.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_gbk_city() {
        let json = r#"{"ip":"1.2.3.4","pro":"北京市","city":"北京市","isp":"联通"}"#;
        let (gbk, _, _) = encoding_rs::GBK.encode(json);
        assert_eq!(parse_city(&gbk).unwrap(), "北京市");
    }

    #[test]
    fn empty_or_null_city_is_unknown() {
        assert_eq!(parse_city(br#"{"city":""}"#).unwrap(), UNKNOWN_CITY);
        assert_eq!(parse_city(br#"{"city":"null"}"#).unwrap(), UNKNOWN_CITY);
        assert_eq!(parse_city(br#"{"ip":"1.2.3.4"}"#).unwrap(), UNKNOWN_CITY);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(parse_city(b"<html>busy</html>"), Err(GeoError::Parse(_))));
    }
}
