//! Rate engine: value types, storage and provider seams, conversion and the
//! fetch pipeline.

pub mod config;
pub mod converter;
pub mod currency;
pub mod date;
pub mod error;
pub mod log;
pub mod pipeline;
pub mod rate;
pub mod scheduler;

// Re-export main types for cleaner imports
pub use converter::RateConverter;
pub use currency::CurrencyCode;
pub use date::BusinessDate;
pub use error::{
    ConversionError, FetchError, InvalidCurrency, InvalidDate, PipelineError, StorageError,
};
pub use pipeline::RatePipeline;
pub use rate::{PairRate, RateQuote, RateStore, RatesProvider, RawRatesResponse};
pub use scheduler::{Schedule, Scheduler, Shutdown};
