//! Configuration loading and management
//!
//! Client configuration comes from environment variables and config files;
//! job profiles come from `~/.socialcontext.json`.

pub mod loader;
pub mod profile;

pub use loader::{
    config_dir, default_token_store_path, load, load_from, load_from_file,
    probe_config_paths,
};
pub use profile::{default_profile_path, load_profile, load_profile_from};
