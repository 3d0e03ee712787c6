pub mod base;
pub mod yahoo;

pub use base::MarketDataProvider;
pub use yahoo::YahooProvider;
