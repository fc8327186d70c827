use std::sync::Arc;

use futures::future::join_all;

use crate::{
    model::{round_to, Conversion, Conversions, TARGET_CURRENCIES},
    rates::ExchangeRateCache,
};

/// Converts a price into each target currency other than its own.
pub struct PriceConverter {
    rates: Arc<ExchangeRateCache>,
}

impl PriceConverter {
    pub fn new(rates: Arc<ExchangeRateCache>) -> Self {
        Self { rates }
    }

    pub fn rates(&self) -> &ExchangeRateCache {
        &self.rates
    }

    /// Amounts are rounded to 2 decimals and rates to 4. The lookups for the
    /// individual targets run concurrently.
    pub async fn build_conversions(&self, amount: f64, original_currency: &str) -> Conversions {
        let targets: Vec<&str> = TARGET_CURRENCIES
            .iter()
            .copied()
            .filter(|target| *target != original_currency)
            .collect();

        let rates = join_all(
            targets
                .iter()
                .map(|target| self.rates.get_rate(original_currency, target)),
        )
        .await;

        targets
            .into_iter()
            .zip(rates)
            .map(|(target, rate)| {
                let conversion = Conversion {
                    amount: round_to(amount * rate, 2),
                    rate: round_to(rate, 4),
                };
                (target.to_string(), conversion)
            })
            .collect()
    }
}
