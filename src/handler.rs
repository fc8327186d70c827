use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tracing::warn;

use crate::{
    cache::CacheStats,
    config::ProxyConfig,
    conversion::PriceConverter,
    flights::FlightPriceService,
    model::PriceResult,
    rates::ExchangeRateCache,
    transport::HttpTransport,
};

#[derive(Debug, Default)]
pub struct SearchStats {
    pub requests_total: AtomicUsize,
    pub fallbacks_total: AtomicUsize,
}

/// Point-in-time copy of every counter the service exposes.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub requests_total: usize,
    pub fallbacks_total: usize,
    pub flight_cache: CacheStats,
    pub rate_cache: CacheStats,
}

/// The externally callable search operation. It always produces a price.
pub struct SearchHandler {
    flights: FlightPriceService,
    stats: SearchStats,
}

impl SearchHandler {
    pub fn new(flights: FlightPriceService) -> Self {
        Self {
            flights,
            stats: SearchStats::default(),
        }
    }

    /// Wires the full pipeline from configuration over one shared transport.
    pub fn from_config(config: &ProxyConfig, transport: Arc<dyn HttpTransport>) -> Self {
        let rates = ExchangeRateCache::new(
            config.rates.clone(),
            transport.clone(),
            std::time::Duration::from_secs(config.cache.rate_ttl_seconds),
        );
        let flights = FlightPriceService::new(
            config.amadeus.clone(),
            transport,
            PriceConverter::new(Arc::new(rates)),
            std::time::Duration::from_secs(config.cache.flight_ttl_seconds),
        );
        Self::new(flights)
    }

    pub async fn handle_search(
        &self,
        origin: &str,
        destination: &str,
        date: Option<&str>,
    ) -> PriceResult {
        self.stats.requests_total.fetch_add(1, Ordering::Relaxed);

        match self.flights.get_flight_price(origin, destination, date).await {
            Ok(result) => result,
            Err(err) => {
                self.stats.fallbacks_total.fetch_add(1, Ordering::Relaxed);
                warn!(
                    origin,
                    destination,
                    date = date.unwrap_or_default(),
                    kind = err.kind(),
                    error = %err,
                    "search failed, serving fallback price"
                );
                PriceResult::fallback(origin, destination)
            }
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            requests_total: self.stats.requests_total.load(Ordering::Relaxed),
            fallbacks_total: self.stats.fallbacks_total.load(Ordering::Relaxed),
            flight_cache: self.flights.cache().stats(),
            rate_cache: self.flights.converter().rates().cache().stats(),
        }
    }
}
