//! Token acquisition and storage ports

pub mod ports;

pub use ports::{TokenProvider, TokenStore};
