use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Limit price - uses Decimal for precision
pub type Price = Decimal;

/// Share quantity - whole shares only
pub type Quantity = u64;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Ticker symbol, normalized to upper case
pub type Symbol = String;
