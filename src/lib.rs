// Flight price proxy: cached Amadeus price lookups converted into INR and EUR

pub mod cache;
pub mod config;
pub mod conversion;
pub mod error;
pub mod flights;
pub mod handler;
pub mod model;
pub mod rates;
pub mod server;
pub mod token;
pub mod transport;

// Re-export key types for convenience
pub use cache::{CacheStats, Clock, ManualClock, SystemClock, TtlCache};
pub use config::{AmadeusConfig, CacheConfig, ProxyConfig, RatesConfig};
pub use conversion::PriceConverter;
pub use error::PriceError;
pub use flights::FlightPriceService;
pub use handler::{SearchHandler, StatsSnapshot};
pub use model::{Conversion, Money, Price, PriceResult, PriceSource};
pub use rates::ExchangeRateCache;
pub use token::TokenProvider;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
