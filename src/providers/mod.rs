pub mod currency_freaks;
pub mod util;

pub use currency_freaks::CurrencyFreaksProvider;
