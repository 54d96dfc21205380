//! Authenticated request dispatch

pub mod policy;
pub mod service;
pub mod transport;

pub use policy::{AttemptOutcome, DispatchState, ReauthPolicy, ReauthTrigger};
pub use service::AuthenticatedDispatcher;
pub use transport::AuthenticatedTransport;
