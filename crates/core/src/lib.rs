//! # socialcontext core
//!
//! Client logic with no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the HTTP transport, token provider and
//!   token store
//! - The authenticated dispatcher state machine
//! - Typed resource endpoints
//!
//! ## Architecture Principles
//! - Only depends on `socialcontext-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod auth;
pub mod dispatch;
pub mod endpoints;
pub mod transport;

// Test doubles
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export specific items to avoid ambiguity
pub use auth::{TokenProvider, TokenStore};
pub use dispatch::{
    AttemptOutcome, AuthenticatedDispatcher, AuthenticatedTransport, DispatchState, ReauthPolicy,
    ReauthTrigger,
};
pub use endpoints::{ContentEndpoint, SocialContextClient};
pub use transport::{HttpTransport, TransportError};
