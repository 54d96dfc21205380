//! HTTP transport port

pub mod ports;

pub use ports::{HttpTransport, TransportError};
