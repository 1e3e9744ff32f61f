use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),
}

/// Source of current market prices used by the refresh endpoint.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Returns the current price for `symbol`. `last_price` is the most recent
    /// price the caller knows about; quote sources may ignore it.
    async fn quote(
        &self,
        symbol: &str,
        last_price: &BigDecimal,
    ) -> Result<BigDecimal, PriceProviderError>;
}
