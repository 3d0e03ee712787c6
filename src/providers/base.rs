use crate::errors::Result;
use crate::models::candle::Candle;
use crate::models::range::{FetchRange, Interval};
use async_trait::async_trait;

/// Base trait for market data providers
#[async_trait]
pub trait MarketDataProvider {
    /// Get the provider code this implementation is for
    fn provider_code(&self) -> &'static str;

    /// Fetch candles for a symbol over the given range and interval
    /// Returns an empty vector when the symbol has no data in range
    async fn fetch_candles(
        &self,
        symbol: &str,
        range: &FetchRange,
        interval: Interval,
    ) -> Result<Vec<Candle>>;
}
