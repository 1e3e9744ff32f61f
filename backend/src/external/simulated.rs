use async_trait::async_trait;
use bigdecimal::{BigDecimal, FromPrimitive};
use rand::Rng;

use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::utils::round_currency;

/// Offline quote source: each quote is the last price moved by a random
/// percentage in `[-max_swing / 2, max_swing / 2]`.
pub struct SimulatedPriceProvider {
    max_swing: f64,
}

impl SimulatedPriceProvider {
    pub fn new(max_swing: f64) -> Self {
        Self {
            max_swing: max_swing.abs(),
        }
    }

    fn next_price(&self, last_price: &BigDecimal, swing: f64) -> Result<BigDecimal, PriceProviderError> {
        let factor = BigDecimal::from_f64(1.0 + swing)
            .ok_or_else(|| PriceProviderError::BadResponse(format!("invalid swing {}", swing)))?;
        let next = round_currency(&(last_price * factor));
        Ok(next.max(min_price()))
    }
}

fn min_price() -> BigDecimal {
    BigDecimal::new(1.into(), 2)
}

#[async_trait]
impl PriceProvider for SimulatedPriceProvider {
    async fn quote(
        &self,
        symbol: &str,
        last_price: &BigDecimal,
    ) -> Result<BigDecimal, PriceProviderError> {
        if symbol.trim().is_empty() {
            return Err(PriceProviderError::UnknownSymbol(symbol.to_string()));
        }
        let half = self.max_swing / 2.0;
        let swing = if half > 0.0 {
            rand::rng().random_range(-half..=half)
        } else {
            0.0
        };
        self.next_price(last_price, swing)
    }
}
