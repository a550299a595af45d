pub mod client;
pub mod serialization;
pub mod transmission;
pub mod transport;

pub use client::{ClientConfig, ClientError, TransportStats};
pub use serialization::{BatchSerializer, SerializationError};
pub use transmission::{HttpTransport, TransportError};
pub use transport::{NullTransport, Payload, Transport};

#[cfg(test)]
pub use transport::MockTransport;
