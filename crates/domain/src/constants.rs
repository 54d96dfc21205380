//! Client constants
//!
//! Centralized location for service defaults and environment variable names.

// Service endpoint
pub const DEFAULT_API_ROOT: &str = "https://beta.socialcontext.ai";
pub const OPENAPI_PATH: &str = "docs/openapi.json";
pub const TOKEN_PATH: &str = "token";
pub const TOKEN_REFRESH_PATH: &str = "token-refresh";

// HTTP defaults
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("socialcontext/", env!("CARGO_PKG_VERSION"));

/// Response statuses that invalidate the cached token
pub const DEFAULT_REAUTH_STATUSES: [u16; 3] = [400, 401, 403];

// Batch jobs
pub const DEFAULT_BATCH_SIZE: u32 = 1000;
pub const MIN_BATCH_SIZE: u32 = 500;
pub const MAX_BATCH_SIZE: u32 = 5000;

// Environment variables
pub const ENV_API_ROOT: &str = "SOCIALCONTEXT_API_ROOT";
pub const ENV_APP_ID: &str = "SOCIALCONTEXT_APP_ID";
pub const ENV_APP_SECRET: &str = "SOCIALCONTEXT_APP_SECRET";
pub const ENV_TOKEN_STORE: &str = "SOCIALCONTEXT_TOKEN_STORE";
pub const ENV_TIMEOUT_SECS: &str = "SOCIALCONTEXT_TIMEOUT_SECS";
pub const ENV_REAUTH_STATUSES: &str = "SOCIALCONTEXT_REAUTH_STATUSES";

// Local files, relative to the home directory
pub const TOKEN_STORE_DIR: &str = ".socialcontext";
pub const TOKEN_STORE_FILE: &str = "tokens.db";
pub const PROFILE_FILE: &str = ".socialcontext.json";
