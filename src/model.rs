use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

/// Currencies every price is converted into, in lookup order.
pub const TARGET_CURRENCIES: [&str; 2] = ["INR", "EUR"];

pub const FALLBACK_AMOUNT: f64 = 5555.0;
pub const FALLBACK_CURRENCY: &str = "INR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Amadeus,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Money {
    #[serde(serialize_with = "serialize_amount")]
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub amount: f64,
    pub rate: f64,
}

pub type Conversions = BTreeMap<String, Conversion>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub original: Money,
    pub conversions: Conversions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceResult {
    pub origin: String,
    pub destination: String,
    pub price: Price,
    pub source: PriceSource,
    pub cached: bool,
}

impl PriceResult {
    /// The synthetic response served when the real pipeline fails.
    pub fn fallback(origin: &str, destination: &str) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            price: Price {
                original: Money {
                    amount: FALLBACK_AMOUNT,
                    currency: FALLBACK_CURRENCY.to_string(),
                },
                conversions: Conversions::new(),
            },
            source: PriceSource::Fallback,
            cached: true,
        }
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }
}

// Whole amounts go on the wire as integers (5555, not 5555.0).
fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.is_finite() && amount.fract() == 0.0 && amount.abs() < i64::MAX as f64 {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

// Upstream payloads

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlightOffersResponse {
    #[serde(default)]
    pub data: Vec<FlightOffer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlightOffer {
    pub price: OfferPrice,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OfferPrice {
    pub total: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatesResponse {
    #[serde(default)]
    pub rates: BTreeMap<String, serde_json::Value>,
}

impl RatesResponse {
    /// Rate for `currency`; other entries are never inspected.
    pub fn rate_for(&self, currency: &str) -> Option<f64> {
        self.rates.get(currency).and_then(serde_json::Value::as_f64)
    }
}
