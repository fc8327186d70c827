use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    cache::{rate_cache_key, Clock, SystemClock, TtlCache},
    config::RatesConfig,
    error::PriceError,
    model::RatesResponse,
    transport::{HttpRequest, HttpTransport},
};

/// Rate returned when a lookup fails: no conversion applied.
pub const FALLBACK_RATE: f64 = 1.0;

/// Conversion rates per currency pair, cached for the configured TTL.
pub struct ExchangeRateCache {
    config: RatesConfig,
    transport: Arc<dyn HttpTransport>,
    cache: TtlCache<f64>,
}

impl ExchangeRateCache {
    pub fn new(config: RatesConfig, transport: Arc<dyn HttpTransport>, ttl: Duration) -> Self {
        Self::with_clock(config, transport, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: RatesConfig,
        transport: Arc<dyn HttpTransport>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            transport,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    pub fn cache(&self) -> &TtlCache<f64> {
        &self.cache
    }

    /// Never fails: any lookup error degrades to [`FALLBACK_RATE`], which is
    /// not cached.
    pub async fn get_rate(&self, from_currency: &str, to_currency: &str) -> f64 {
        let key = rate_cache_key(from_currency, to_currency);
        if let Some(rate) = self.cache.get(&key) {
            debug!(%key, rate, "exchange rate cache hit");
            return rate;
        }

        match self.fetch_rate(from_currency, to_currency).await {
            Ok(rate) => {
                self.cache.insert(key, rate);
                rate
            }
            Err(err) => {
                warn!(
                    from = from_currency,
                    to = to_currency,
                    kind = err.kind(),
                    error = %err,
                    "exchange rate lookup failed, using fallback rate"
                );
                FALLBACK_RATE
            }
        }
    }

    async fn fetch_rate(&self, from_currency: &str, to_currency: &str) -> Result<f64, PriceError> {
        let request = HttpRequest::get(self.config.url_for(from_currency), self.config.timeout());
        let response = self.transport.send(request).await?.error_for_status()?;
        let table: RatesResponse = serde_json::from_str(&response.body)?;

        Ok(table.rate_for(to_currency).unwrap_or_else(|| {
            debug!(from = from_currency, to = to_currency, "currency missing from rate table");
            FALLBACK_RATE
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::transport::mock_transport::MockTransport;
    use serde_json::json;

    const USD_URL: &str = "http://rates.test/latest/USD";

    fn rates_with_mock() -> (ExchangeRateCache, Arc<MockTransport>, ManualClock) {
        let mock = Arc::new(MockTransport::new());
        let clock = ManualClock::new();
        let config = RatesConfig {
            base_url: "http://rates.test/latest".to_string(),
            ..Default::default()
        };
        let rates = ExchangeRateCache::with_clock(
            config,
            mock.clone(),
            Duration::from_secs(3600),
            Arc::new(clock.clone()),
        );
        (rates, mock, clock)
    }

    #[tokio::test]
    async fn test_rate_is_cached_per_pair() {
        let (rates, mock, clock) = rates_with_mock();
        mock.respond_json(USD_URL, json!({ "rates": { "INR": 83.12, "EUR": 0.91 } }));

        assert_eq!(rates.get_rate("USD", "INR").await, 83.12);
        assert_eq!(rates.get_rate("USD", "INR").await, 83.12);
        assert_eq!(mock.calls_to(USD_URL), 1);

        // a different pair has its own key
        assert_eq!(rates.get_rate("USD", "EUR").await, 0.91);
        assert_eq!(mock.calls_to(USD_URL), 2);

        clock.advance(Duration::from_secs(3600));
        assert_eq!(rates.get_rate("USD", "INR").await, 83.12);
        assert_eq!(mock.calls_to(USD_URL), 3);
    }

    #[tokio::test]
    async fn test_request_uses_rate_timeout() {
        let (rates, mock, _clock) = rates_with_mock();
        mock.respond_json(USD_URL, json!({ "rates": { "INR": 83.0 } }));

        rates.get_rate("USD", "INR").await;
        assert_eq!(mock.requests_to(USD_URL)[0].timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_currency_defaults_to_one_and_is_cached() {
        let (rates, mock, _clock) = rates_with_mock();
        mock.respond_json(USD_URL, json!({ "rates": { "GBP": 0.79 } }));

        assert_eq!(rates.get_rate("USD", "INR").await, 1.0);
        assert_eq!(rates.get_rate("USD", "INR").await, 1.0);
        assert_eq!(mock.calls_to(USD_URL), 1);
    }

    #[tokio::test]
    async fn test_unrelated_non_numeric_rate_does_not_break_lookup() {
        let (rates, mock, _clock) = rates_with_mock();
        mock.respond_json(
            USD_URL,
            json!({ "rates": { "INR": 83.12, "XYZ": null, "EUR": 0.91 } }),
        );

        assert_eq!(rates.get_rate("USD", "INR").await, 83.12);
        assert_eq!(rates.get_rate("USD", "XYZ").await, FALLBACK_RATE);
    }

    #[tokio::test]
    async fn test_failures_degrade_to_identity_and_are_not_cached() {
        let (rates, mock, _clock) = rates_with_mock();

        mock.fail(USD_URL, PriceError::Timeout(5000));
        assert_eq!(rates.get_rate("USD", "INR").await, FALLBACK_RATE);

        mock.respond(USD_URL, 503, "unavailable");
        assert_eq!(rates.get_rate("USD", "INR").await, FALLBACK_RATE);

        mock.respond(USD_URL, 200, "<html>");
        assert_eq!(rates.get_rate("USD", "INR").await, FALLBACK_RATE);

        assert!(rates.cache().is_empty());

        mock.respond_json(USD_URL, json!({ "rates": { "INR": 84.5 } }));
        assert_eq!(rates.get_rate("USD", "INR").await, 84.5);
        assert_eq!(mock.calls_to(USD_URL), 4);
    }
}
