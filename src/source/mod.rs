// Market data sources
pub mod traits;
pub mod unavailable;
pub mod yahoo;

pub use traits::PriceSource;
pub use unavailable::UnavailableSource;
pub use yahoo::YahooSource;
