pub mod http;
pub mod timeout;

pub use http::{ApiClient, TransportError};
pub use timeout::with_timeout;
