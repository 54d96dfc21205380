//! Token endpoint adapter

pub mod client_credentials;

pub use client_credentials::ClientCredentialsProvider;
