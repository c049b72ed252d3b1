// Stand-in used when no real source could be built
use crate::model::{Lookback, Series, SourceError};
use crate::source::traits::PriceSource;

/// Fails every fetch with the same network error, so a run still reports
/// "could not retrieve data" for each symbol instead of producing nothing.
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl PriceSource for UnavailableSource {
    async fn fetch(&self, _symbol: &str, _lookback: Lookback) -> Result<Series, SourceError> {
        Err(SourceError::Network(self.reason.clone()))
    }
}
