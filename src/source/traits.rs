use crate::model::{Lookback, Series, SourceError};

#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    /// Daily closes for `symbol` over `lookback`, oldest first.
    async fn fetch(&self, symbol: &str, lookback: Lookback) -> Result<Series, SourceError>;
}
