// Runtime configuration for the proxy and its upstream collaborators

use std::{env, net::SocketAddr, time::Duration};

use tracing::warn;

pub const DEFAULT_TOKEN_URL: &str = "https://test.api.amadeus.com/v1/security/oauth2/token";
pub const DEFAULT_FLIGHT_URL: &str = "https://test.api.amadeus.com/v2/shopping/flight-offers";
pub const DEFAULT_RATES_BASE_URL: &str = "https://open.er-api.com/v6/latest";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";

// Credentials and endpoints for the flight offer provider
#[derive(Debug, Clone)]
pub struct AmadeusConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub token_url: String,
    pub flight_offers_url: String,
    pub timeout_ms: u64,
}

impl Default for AmadeusConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            token_url: DEFAULT_TOKEN_URL.to_string(),
            flight_offers_url: DEFAULT_FLIGHT_URL.to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl AmadeusConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Exchange rate endpoint; the base currency is appended as a path segment
#[derive(Debug, Clone)]
pub struct RatesConfig {
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_RATES_BASE_URL.to_string(),
            timeout_ms: 5_000,
        }
    }
}

impl RatesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn url_for(&self, base_currency: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), base_currency)
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub flight_ttl_seconds: u64,
    pub rate_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flight_ttl_seconds: 300,
            rate_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub listen_addr: SocketAddr,
    pub amadeus: AmadeusConfig,
    pub rates: RatesConfig,
    pub cache: CacheConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            amadeus: AmadeusConfig::default(),
            rates: RatesConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Build the configuration from process environment variables.
    ///
    /// Missing credentials are not an error here; the token provider reports
    /// them when a lookup actually needs a token.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let listen_addr = match non_empty("LISTEN_ADDR") {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!(value = %raw, error = %err, "invalid LISTEN_ADDR, using default");
                defaults.listen_addr
            }),
            None => defaults.listen_addr,
        };

        let ttl = |key: &str, default: u64| match non_empty(key) {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                warn!(key, value = %raw, error = %err, "invalid TTL, using default");
                default
            }),
            None => default,
        };

        Self {
            listen_addr,
            amadeus: AmadeusConfig {
                client_id: non_empty("AMADEUS_CLIENT_ID"),
                client_secret: non_empty("AMADEUS_CLIENT_SECRET"),
                token_url: non_empty("AMADEUS_TOKEN_URL").unwrap_or(defaults.amadeus.token_url),
                flight_offers_url: non_empty("AMADEUS_FLIGHT_URL")
                    .unwrap_or(defaults.amadeus.flight_offers_url),
                ..defaults.amadeus
            },
            rates: RatesConfig {
                base_url: non_empty("RATES_BASE_URL").unwrap_or(defaults.rates.base_url),
                ..defaults.rates
            },
            cache: CacheConfig {
                flight_ttl_seconds: ttl(
                    "FLIGHT_CACHE_TTL_SECONDS",
                    defaults.cache.flight_ttl_seconds,
                ),
                rate_ttl_seconds: ttl("RATE_CACHE_TTL_SECONDS", defaults.cache.rate_ttl_seconds),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_is_empty() {
        let config = ProxyConfig::from_lookup(|_| None);
        assert_eq!(config.amadeus.client_id, None);
        assert_eq!(config.amadeus.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.amadeus.timeout(), Duration::from_secs(10));
        assert_eq!(config.rates.timeout(), Duration::from_secs(5));
        assert_eq!(config.cache.flight_ttl_seconds, 300);
        assert_eq!(config.cache.rate_ttl_seconds, 3600);
        assert_eq!(config.listen_addr.to_string(), DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn test_reads_overrides_and_ignores_blank_secrets() {
        let config = ProxyConfig::from_lookup(lookup_from(&[
            ("AMADEUS_CLIENT_ID", "id-123"),
            ("AMADEUS_CLIENT_SECRET", "   "),
            ("RATES_BASE_URL", "http://rates.local/latest/"),
            ("FLIGHT_CACHE_TTL_SECONDS", "60"),
            ("RATE_CACHE_TTL_SECONDS", "not-a-number"),
            ("LISTEN_ADDR", "127.0.0.1:9000"),
        ]));

        assert_eq!(config.amadeus.client_id.as_deref(), Some("id-123"));
        assert_eq!(config.amadeus.client_secret, None);
        assert_eq!(config.rates.url_for("USD"), "http://rates.local/latest/USD");
        assert_eq!(config.cache.flight_ttl_seconds, 60);
        assert_eq!(config.cache.rate_ttl_seconds, 3600);
        assert_eq!(config.listen_addr.port(), 9000);
    }
}
