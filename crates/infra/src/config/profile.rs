//! Named job profiles from `~/.socialcontext.json`.
//!
//! ```json
//! {"profiles": {"weekly": {"content_models": ["political"], "options": []}}}
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use socialcontext_domain::constants::PROFILE_FILE;
use socialcontext_domain::{JobProfile, Result, SocialContextError};

use super::loader::home_dir;

#[derive(Debug, Default, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    profiles: BTreeMap<String, JobProfile>,
}

/// Location of the profile file in the user's home directory.
pub fn default_profile_path() -> Option<PathBuf> {
    home_dir().map(|h| h.join(PROFILE_FILE))
}

/// Load the profile `name` from the default profile file.
///
/// # Errors
/// Returns `SocialContextError::Config` if the home directory is unknown,
/// the file is missing or malformed, or has no such profile.
pub fn load_profile(name: &str) -> Result<JobProfile> {
    let path = default_profile_path().ok_or_else(|| {
        SocialContextError::Config("cannot locate home directory for profiles".to_string())
    })?;
    load_profile_from(&path, name)
}

/// Load the profile `name` from an explicit file.
pub fn load_profile_from(path: &Path, name: &str) -> Result<JobProfile> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        SocialContextError::Config(format!("failed to read profiles from {}: {e}", path.display()))
    })?;

    let file: ProfileFile = serde_json::from_str(&contents).map_err(|e| {
        SocialContextError::Config(format!("invalid profile file {}: {e}", path.display()))
    })?;

    let profile = file.profiles.get(name).cloned().ok_or_else(|| {
        SocialContextError::Config(format!("profile '{name}' not found in {}", path.display()))
    })?;

    tracing::debug!(profile = name, path = %path.display(), "job profile loaded");
    Ok(profile)
}
