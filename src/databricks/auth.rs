//! Workspace Authentication
//!
//! Resolves the workspace host and personal access token from command-line
//! flags, environment variables, the ucprov config file, or a profile in the
//! Databricks CLI configuration file (`~/.databrickscfg`).

use anyhow::{anyhow, Result};
use std::fmt;
use std::path::PathBuf;

use crate::config::Config;

/// Profile used when none is selected
pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Host and token for one workspace
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Values read from one `[profile]` section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub host: Option<String>,
    pub token: Option<String>,
}

/// Get the Databricks CLI configuration file path
pub fn config_file_path() -> Option<PathBuf> {
    // Check DATABRICKS_CONFIG_FILE environment variable first
    if let Ok(path) = std::env::var("DATABRICKS_CONFIG_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|p| p.join(".databrickscfg"))
}

/// Validate a profile name before using it
/// Profile names are section headers: letters, digits, `-`, `_` and `.`
fn validate_profile_name(profile: &str) -> bool {
    !profile.is_empty()
        && profile
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Parse one profile out of `.databrickscfg` content
pub fn parse_profile(content: &str, profile: &str) -> Option<Profile> {
    let header = format!("[{}]", profile);
    let mut in_section = false;
    let mut found = false;
    let mut result = Profile::default();

    for line in content.lines() {
        let line = line.trim();
        // Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_section = line == header;
            found |= in_section;
            continue;
        }
        if !in_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match key.trim() {
            "host" => result.host = Some(value.to_string()),
            "token" => result.token = Some(value.to_string()),
            _ => {}
        }
    }

    found.then_some(result)
}

/// Read a profile from the Databricks CLI configuration file
pub fn read_profile(profile: &str) -> Option<Profile> {
    if !validate_profile_name(profile) {
        tracing::warn!("Invalid characters in profile name");
        return None;
    }

    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    let parsed = parse_profile(&content, profile);
    if parsed.is_none() {
        tracing::debug!("Profile [{}] not found in {:?}", profile, path);
    }
    parsed
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Pick the first value present, in precedence order
fn first_of<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates.into_iter().flatten().next()
}

/// Resolve credentials
///
/// Host: flag > `DATABRICKS_HOST` > config file > profile.
/// Token: `DATABRICKS_TOKEN` > profile.
/// Profile: flag > `DATABRICKS_CONFIG_PROFILE` > config file > `DEFAULT`.
pub fn resolve_credentials(
    host_flag: Option<&str>,
    profile_flag: Option<&str>,
    config: &Config,
) -> Result<Credentials> {
    let profile_name = first_of([
        profile_flag.map(str::to_string),
        env_var("DATABRICKS_CONFIG_PROFILE"),
        config.profile.clone(),
    ])
    .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let profile = read_profile(&profile_name).unwrap_or_default();

    let host = first_of([
        host_flag.map(str::to_string),
        env_var("DATABRICKS_HOST"),
        config.host.clone(),
        profile.host,
    ])
    .ok_or_else(|| {
        anyhow!(
            "No workspace host configured. Set DATABRICKS_HOST, use --host, or add host to profile [{}]",
            profile_name
        )
    })?;

    let token = first_of([env_var("DATABRICKS_TOKEN"), profile.token]).ok_or_else(|| {
        anyhow!(
            "No access token configured. Set DATABRICKS_TOKEN or add token to profile [{}]",
            profile_name
        )
    })?;

    tracing::info!("Using workspace host {} (profile [{}])", host, profile_name);

    Ok(Credentials { host, token })
}
