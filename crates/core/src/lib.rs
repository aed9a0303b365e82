pub mod error;
pub mod json;
pub mod transport;

pub use crate::core::error::{SdkError, TransportError};
pub use crate::core::transport::{HttpTransport, TransportConfig};
pub use crate::types::ValidationError;
