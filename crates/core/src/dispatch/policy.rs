//! Reauthentication policy and attempt bookkeeping

use std::collections::BTreeSet;
use std::fmt;

use socialcontext_domain::constants::DEFAULT_REAUTH_STATUSES;
use socialcontext_domain::{HttpResponse, SocialContextError};

/// Response statuses that mean "the cached token is no longer good"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReauthPolicy {
    statuses: BTreeSet<u16>,
}

impl ReauthPolicy {
    pub fn new<I: IntoIterator<Item = u16>>(statuses: I) -> Self {
        Self { statuses: statuses.into_iter().collect() }
    }

    /// Whether `status` should discard the token and retry.
    pub fn triggers(&self, status: u16) -> bool {
        self.statuses.contains(&status)
    }

    pub fn statuses(&self) -> impl Iterator<Item = u16> + '_ {
        self.statuses.iter().copied()
    }
}

impl Default for ReauthPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_REAUTH_STATUSES)
    }
}

/// Lifecycle of the dispatcher's credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// No transport built yet, or the last reauthentication failed
    Unauthenticated,
    Authenticated,
    /// A fresh token is being fetched after an invalidation
    Reauthenticating,
}

impl DispatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticated => "authenticated",
            Self::Reauthenticating => "reauthenticating",
        }
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an attempt asked for reauthentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReauthTrigger {
    /// The service answered with a policy status
    Status(HttpResponse),
    /// The transport had no usable token to send
    InvalidToken(String),
}

impl ReauthTrigger {
    pub fn reason(&self) -> String {
        match self {
            Self::Status(response) => format!("status {}", response.status),
            Self::InvalidToken(msg) => format!("invalid token: {msg}"),
        }
    }
}

/// Result of a single authenticated attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Completed(HttpResponse),
    NeedsReauth(ReauthTrigger),
    Failed(SocialContextError),
}
