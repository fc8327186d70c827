// Flight price lookup: cache check, token exchange, offer search, conversion.

use std::{sync::Arc, time::Duration};

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info};

use crate::{
    cache::{flight_cache_key, Clock, SystemClock, TtlCache},
    config::AmadeusConfig,
    conversion::PriceConverter,
    error::PriceError,
    model::{FlightOffersResponse, Money, Price, PriceResult, PriceSource},
    token::TokenProvider,
    transport::{HttpRequest, HttpTransport},
};

/// How far ahead the search looks when the caller gives no departure date.
pub const DEFAULT_DEPARTURE_OFFSET_DAYS: i64 = 14;

pub fn default_departure_date(today: NaiveDate) -> String {
    (today + chrono::Duration::days(DEFAULT_DEPARTURE_OFFSET_DAYS))
        .format("%Y-%m-%d")
        .to_string()
}

pub struct FlightPriceService {
    config: AmadeusConfig,
    transport: Arc<dyn HttpTransport>,
    tokens: TokenProvider,
    converter: PriceConverter,
    cache: TtlCache<PriceResult>,
}

impl FlightPriceService {
    pub fn new(
        config: AmadeusConfig,
        transport: Arc<dyn HttpTransport>,
        converter: PriceConverter,
        ttl: Duration,
    ) -> Self {
        Self::with_clock(config, transport, converter, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: AmadeusConfig,
        transport: Arc<dyn HttpTransport>,
        converter: PriceConverter,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = TokenProvider::new(config.clone(), transport.clone());
        Self {
            config,
            transport,
            tokens,
            converter,
            cache: TtlCache::with_clock(ttl, clock),
        }
    }

    pub fn cache(&self) -> &TtlCache<PriceResult> {
        &self.cache
    }

    pub fn converter(&self) -> &PriceConverter {
        &self.converter
    }

    /// Looks up the cheapest offer for the route, served from cache when fresh.
    ///
    /// The cache key is built from the date exactly as the caller passed it,
    /// so an omitted date keys as `origin-destination-` even though the
    /// upstream search uses the defaulted date.
    pub async fn get_flight_price(
        &self,
        origin: &str,
        destination: &str,
        departure_date: Option<&str>,
    ) -> Result<PriceResult, PriceError> {
        let raw_date = departure_date.unwrap_or_default();
        let key = flight_cache_key(origin, destination, raw_date);

        if let Some(hit) = self.cache.get(&key) {
            debug!(%key, "flight price cache hit");
            return Ok(hit.with_cached(true));
        }

        let departure_date = if raw_date.is_empty() {
            default_departure_date(Local::now().date_naive())
        } else {
            raw_date.to_string()
        };

        let original = self
            .fetch_offer_price(origin, destination, &departure_date)
            .await?;
        let conversions = self
            .converter
            .build_conversions(original.amount, &original.currency)
            .await;

        let result = PriceResult {
            origin: origin.to_string(),
            destination: destination.to_string(),
            price: Price {
                original,
                conversions,
            },
            source: PriceSource::Amadeus,
            cached: false,
        };

        info!(
            %key,
            amount = result.price.original.amount,
            currency = %result.price.original.currency,
            "fetched flight price"
        );
        self.cache.insert(key, result.clone());

        Ok(result)
    }

    async fn fetch_offer_price(
        &self,
        origin: &str,
        destination: &str,
        departure_date: &str,
    ) -> Result<Money, PriceError> {
        let token = self.tokens.acquire_token().await?;

        let request = HttpRequest::get(&self.config.flight_offers_url, self.config.timeout())
            .query("originLocationCode", origin)
            .query("destinationLocationCode", destination)
            .query("departureDate", departure_date)
            .query("adults", 1)
            .query("max", 1)
            .bearer(token);

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            error!(
                status = response.status,
                body = %response.body,
                "flight offers request failed"
            );
        }
        let response = response.error_for_status()?;

        let offers: FlightOffersResponse = serde_json::from_str(&response.body)?;
        let offer = offers
            .data
            .into_iter()
            .next()
            .ok_or_else(|| PriceError::Data("flight offers list is empty".to_string()))?;

        let amount = offer.price.total.trim().parse::<f64>().map_err(|e| {
            PriceError::Data(format!("invalid price total {:?}: {e}", offer.price.total))
        })?;
        if !amount.is_finite() {
            return Err(PriceError::Data(format!(
                "price total {:?} is not a finite number",
                offer.price.total
            )));
        }

        Ok(Money {
            amount,
            currency: offer.price.currency,
        })
    }
}
