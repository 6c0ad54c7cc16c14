pub mod types;
pub mod service;

pub use types::{AmountLimits, FeeBreakdown, FeeQuote, FeeRequest};
pub use service::{FeeSchedule, FeeTracker, amount_from_f64, format_amount, parse_amount, validate_amount};
