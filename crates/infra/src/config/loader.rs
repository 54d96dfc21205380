//! Configuration loader
//!
//! Builds a [`ClientConfig`] from a config file and the environment.
//!
//! ## Loading Strategy
//! 1. Start from defaults, or from the first config file found
//! 2. Overlay every `SOCIALCONTEXT_*` environment variable that is set
//! 3. Validate the result
//!
//! ## Environment Variables
//! - `SOCIALCONTEXT_API_ROOT`: Service root (default `https://beta.socialcontext.ai`)
//! - `SOCIALCONTEXT_APP_ID`: Application client id
//! - `SOCIALCONTEXT_APP_SECRET`: Application client secret
//! - `SOCIALCONTEXT_TOKEN_STORE`: Token store file path
//! - `SOCIALCONTEXT_TIMEOUT_SECS`: HTTP timeout in seconds
//! - `SOCIALCONTEXT_REAUTH_STATUSES`: Comma separated statuses that trigger
//!   re-authentication (e.g. `401,403`)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./socialcontext.toml` or `./socialcontext.json`
//! 2. `~/.config/socialcontext/config.toml` or `config.json`

use std::path::{Path, PathBuf};

use socialcontext_domain::constants::{
    ENV_API_ROOT, ENV_APP_ID, ENV_APP_SECRET, ENV_REAUTH_STATUSES, ENV_TIMEOUT_SECS,
    ENV_TOKEN_STORE, TOKEN_STORE_DIR, TOKEN_STORE_FILE,
};
use socialcontext_domain::{ClientConfig, Result, SocialContextError};

/// Load configuration from the probed config file and the environment.
///
/// A missing config file is not an error; the environment alone may be
/// enough.
///
/// # Errors
/// Returns `SocialContextError::Config` if a file cannot be parsed, an
/// environment variable has an invalid value or the merged configuration
/// fails validation.
pub fn load() -> Result<ClientConfig> {
    load_from(None)
}

/// Like [`load`], but reads `path` instead of probing when one is given.
///
/// # Errors
/// Same as [`load`]; additionally fails if an explicit `path` is missing.
pub fn load_from(path: Option<PathBuf>) -> Result<ClientConfig> {
    let base = match path.or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::debug!("No config file found, using defaults");
            ClientConfig::default()
        }
    };

    let config = apply_overrides(base, |key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// Supports JSON and TOML (detected by file extension). Fields absent from
/// the file keep their defaults.
///
/// # Errors
/// Returns `SocialContextError::Config` if the file is missing, unreadable
/// or invalid.
pub fn load_from_file(config_path: &Path) -> Result<ClientConfig> {
    if !config_path.exists() {
        return Err(SocialContextError::Config(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(config_path)
        .map_err(|e| SocialContextError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, config_path)
}

/// Parse configuration from string content, format chosen by extension.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SocialContextError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SocialContextError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(SocialContextError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("socialcontext.toml"));
        candidates.push(cwd.join("socialcontext.json"));
    }

    if let Some(dir) = config_dir() {
        candidates.push(dir.join("config.toml"));
        candidates.push(dir.join("config.json"));
    }

    candidates.into_iter().find(|path| path.is_file())
}

/// Per-user configuration directory (`~/.config/socialcontext`).
pub fn config_dir() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".config").join("socialcontext"))
}

/// Default token store location (`~/.socialcontext/tokens.db`).
///
/// Falls back to a path relative to the working directory when no home
/// directory can be determined.
pub fn default_token_store_path() -> PathBuf {
    home_dir()
        .map(|h| h.join(TOKEN_STORE_DIR))
        .unwrap_or_else(|| PathBuf::from(TOKEN_STORE_DIR))
        .join(TOKEN_STORE_FILE)
}

pub(crate) fn home_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}

/// Overlay environment values onto `config`.
///
/// `lookup` abstracts the environment so the merge can be tested without
/// mutating process state. Empty values count as unset.
fn apply_overrides<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(root) = var(ENV_API_ROOT) {
        config.api_root = root;
    }
    if let Some(id) = var(ENV_APP_ID) {
        config.client_id = Some(id);
    }
    if let Some(secret) = var(ENV_APP_SECRET) {
        config.client_secret = Some(secret);
    }
    if let Some(path) = var(ENV_TOKEN_STORE) {
        config.token_store_path = Some(PathBuf::from(path));
    }
    if let Some(timeout) = var(ENV_TIMEOUT_SECS) {
        config.timeout_secs = timeout.parse::<u64>().map_err(|e| {
            SocialContextError::Config(format!("Invalid {ENV_TIMEOUT_SECS}: {e}"))
        })?;
    }
    if let Some(statuses) = var(ENV_REAUTH_STATUSES) {
        config.reauth_statuses = parse_status_list(&statuses)?;
    }

    Ok(config)
}

/// Parse a comma separated list of HTTP status codes.
fn parse_status_list(raw: &str) -> Result<Vec<u16>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>().map_err(|e| {
                SocialContextError::Config(format!("Invalid {ENV_REAUTH_STATUSES} entry '{s}': {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::TempDir;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_every_field() {
        let config = apply_overrides(
            ClientConfig::default(),
            env(&[
                (ENV_API_ROOT, "http://localhost:8080"),
                (ENV_APP_ID, "app"),
                (ENV_APP_SECRET, "secret"),
                (ENV_TOKEN_STORE, "/tmp/tokens.db"),
                (ENV_TIMEOUT_SECS, "5"),
                (ENV_REAUTH_STATUSES, "401, 403"),
            ]),
        )
        .unwrap();

        assert_eq!(config.api_root, "http://localhost:8080");
        assert_eq!(config.client_id.as_deref(), Some("app"));
        assert_eq!(config.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.token_store_path, Some(PathBuf::from("/tmp/tokens.db")));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.reauth_statuses, vec![401, 403]);
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let config =
            apply_overrides(ClientConfig::default(), env(&[(ENV_API_ROOT, "  "), (ENV_APP_ID, "")]))
                .unwrap();

        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_env_invalid_number() {
        let err = apply_overrides(ClientConfig::default(), env(&[(ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, SocialContextError::Config(_)));

        let err =
            apply_overrides(ClientConfig::default(), env(&[(ENV_REAUTH_STATUSES, "401,forbidden")]))
                .unwrap_err();
        assert!(matches!(err, SocialContextError::Config(_)));
    }

    #[test]
    fn test_env_wins_over_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("socialcontext.toml");
        std::fs::write(&path, "api_root = \"http://file.example\"\nclient_id = \"from-file\"\n")
            .unwrap();

        let base = load_from_file(&path).unwrap();
        let config = apply_overrides(base, env(&[(ENV_APP_ID, "from-env")])).unwrap();

        assert_eq!(config.api_root, "http://file.example");
        assert_eq!(config.client_id.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("socialcontext.json");
        std::fs::write(
            &path,
            r#"{"client_id": "app", "timeout_secs": 12, "reauth_statuses": [401]}"#,
        )
        .unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("app"));
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.reauth_statuses, vec![401]);
        assert_eq!(config.api_root, ClientConfig::default().api_root);
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "token_store_path = \"/var/tmp/t.db\"\ntimeout_secs = 9\n").unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.token_store_path, Some(PathBuf::from("/var/tmp/t.db")));
        assert_eq!(config.timeout_secs, 9);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Path::new("/nonexistent/socialcontext.json"));
        assert!(matches!(result, Err(SocialContextError::Config(_))));
    }

    #[test]
    fn test_load_from_explicit_missing_path_does_not_probe() {
        let result = load_from(Some(PathBuf::from("/nonexistent/explicit.toml")));
        assert!(matches!(result, Err(SocialContextError::Config(msg)) if msg.contains("explicit.toml")));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("socialcontext.json");
        std::fs::write(&path, r#"{ "client_id": "#).unwrap();

        assert!(matches!(load_from_file(&path), Err(SocialContextError::Config(_))));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("api_root: x", Path::new("socialcontext.yaml"));
        assert!(result.is_err(), "Should fail with unsupported format");
    }

    #[test]
    fn test_default_token_store_path() {
        let path = default_token_store_path();
        assert!(path.ends_with(".socialcontext/tokens.db"));
    }
}
