// ABOUTME: Endpoint credentials and TOML configuration for a migration run
// ABOUTME: Resolves missing token secrets from the environment or an interactive prompt

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::MigratorError;

pub const DEFAULT_MANIFEST_FILE: &str = "manifest.json";

/// Connection details for one server environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointConfig {
    pub base_url: String,
    pub site: String,
    pub token_name: String,
    #[serde(default)]
    pub token_secret: String,
}

impl EndpointConfig {
    pub fn new(
        base_url: impl Into<String>,
        site: impl Into<String>,
        token_name: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            site: site.into(),
            token_name: token_name.into(),
            token_secret: token_secret.into(),
        }
    }

    /// Returns every problem found, prefixed with `role` ("source" or "destination").
    pub fn validate(&self, role: &str) -> Vec<String> {
        let mut errors = Vec::new();

        let url = self.base_url.trim();
        if url.is_empty() {
            errors.push(format!("{} base URL is empty", role));
        } else if !(url.starts_with("https://") || url.starts_with("http://")) {
            errors.push(format!(
                "{} base URL '{}' must start with http:// or https://",
                role, url
            ));
        }
        if self.token_name.trim().is_empty() {
            errors.push(format!("{} access token name is empty", role));
        }
        if self.token_secret.is_empty() {
            errors.push(format!("{} access token secret is empty", role));
        }

        errors
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MigratorConfig {
    pub source: EndpointConfig,
    pub destination: EndpointConfig,
    pub manifest_path: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MigratorConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: MigratorConfig =
            toml::from_str(raw).map_err(|e| MigratorError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Fills empty token secrets from `MIGRATOR_SOURCE_TOKEN` / `MIGRATOR_DESTINATION_TOKEN`,
    /// prompting on the terminal when `interactive` is set and the variable is missing.
    pub fn resolve_secrets(&mut self, interactive: bool) -> Result<()> {
        resolve_secret(&mut self.source, "source", "MIGRATOR_SOURCE_TOKEN", interactive)?;
        resolve_secret(
            &mut self.destination,
            "destination",
            "MIGRATOR_DESTINATION_TOKEN",
            interactive,
        )?;
        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.manifest_path.clone().unwrap_or_else(default_manifest_path)
    }
}

fn resolve_secret(
    endpoint: &mut EndpointConfig,
    role: &str,
    env_var: &str,
    interactive: bool,
) -> Result<()> {
    if !endpoint.token_secret.is_empty() {
        return Ok(());
    }

    if let Ok(secret) = std::env::var(env_var) {
        if !secret.is_empty() {
            endpoint.token_secret = secret;
            return Ok(());
        }
    }

    if interactive {
        endpoint.token_secret = dialoguer::Password::new()
            .with_prompt(format!(
                "Access token secret for {} ({})",
                role, endpoint.token_name
            ))
            .interact()
            .with_context(|| format!("Failed to read {} token secret", role))?;
    }

    Ok(())
}

/// `manifest.json` beside the running executable, or in the working directory
/// when the executable path is unavailable.
pub fn default_manifest_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_MANIFEST_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_FILE))
}
