use async_trait::async_trait;
use moka::future::Cache;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{info, warn};

use crate::clients::pconline_client::{GeoError, PconlineClient};
use crate::config::Config;
use crate::utils::ip::is_local;

pub const LOCAL_NETWORK: &str = "Local network";
pub const LOOKUP_NETWORK: &str = "Region lookup failed: network error";
pub const LOOKUP_BAD_STATUS: &str = "Region lookup failed: bad response";
pub const LOOKUP_UNPARSABLE: &str = "Region lookup failed: unparsable response";
pub const LOOKUP_INVALID_IP: &str = "Region lookup failed: invalid address";

/// Resolves a client IP to a readable region. Never fails.
#[async_trait]
pub trait RegionLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> String;
}

/// Region lookup against the public IP service, cached per address.
pub struct GeoService {
    client: PconlineClient,
    cache: Cache<String, String>,
}

impl GeoService {
    pub fn new(client: PconlineClient, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(10_000).time_to_live(ttl).build();
        Self { client, cache }
    }

    pub fn from_config(config: &Config) -> Result<Self, GeoError> {
        let client = PconlineClient::new(
            config.geo_api_url.clone(),
            Duration::from_secs(config.geo_timeout_secs),
        )?;
        info!("Geolocation client initialized for {}", config.geo_api_url);
        Ok(Self::new(client, Duration::from_secs(config.geo_cache_ttl_secs)))
    }
}

#[async_trait]
impl RegionLookup for GeoService {
    async fn lookup(&self, ip: &str) -> String {
        if let Some(sentinel) = short_circuit(ip) {
            return sentinel.to_string();
        }

        if let Some(region) = self.cache.get(ip).await {
            return region;
        }

        match self.client.city(ip).await {
            Ok(city) => {
                self.cache.insert(ip.to_string(), city.clone()).await;
                city
            }
            Err(e) => {
                warn!("Region lookup for {} failed: {}", ip, e);
                sentinel_for(&e).to_string()
            }
        }
    }
}

/// Answer for addresses that never warrant a network call.
fn short_circuit(ip: &str) -> Option<&'static str> {
    match ip.parse::<IpAddr>() {
        Ok(addr) if is_local(&addr) => Some(LOCAL_NETWORK),
        Ok(_) => None,
        Err(_) => Some(LOOKUP_INVALID_IP),
    }
}

fn sentinel_for(error: &GeoError) -> &'static str {
    match error {
        GeoError::Network(_) => LOOKUP_NETWORK,
        GeoError::Status(_) => LOOKUP_BAD_STATUS,
        GeoError::Parse(_) => LOOKUP_UNPARSABLE,
    }
}

/// Fixed answer for every address.
pub struct StaticRegion(pub String);

#[async_trait]
impl RegionLookup for StaticRegion {
    async fn lookup(&self, _ip: &str) -> String {
        self.0.clone()
    }
}
