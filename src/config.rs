use anyhow::{Context, Result};
use attendance_core::{Branch, BranchDirectory, Role, SessionConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides the token from the config file.
pub const TOKEN_ENV: &str = "ATTENDANCE_TOKEN";

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the attendance backend, e.g. https://example.edu/api/
    pub api_url: String,

    /// Access token sent as a bearer token on every request
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_role")]
    pub role: Role,

    /// Display name of the logged-in user
    #[serde(default)]
    pub name: Option<String>,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// The fixed list of branches sessions can be assigned to
    #[serde(default)]
    pub branches: Vec<Branch>,
}

fn default_role() -> Role {
    Role::Supervisor
}

impl Config {
    /// Session settings, with the token taken from the environment when set.
    pub fn session_config(&self) -> SessionConfig {
        self.session_config_with(std::env::var(TOKEN_ENV).ok())
    }

    fn session_config_with(&self, env_token: Option<String>) -> SessionConfig {
        SessionConfig {
            token: env_token.filter(|t| !t.trim().is_empty()).or_else(|| self.token.clone()),
            role: self.role,
            name: self.name.clone(),
        }
    }

    pub fn branch_directory(&self) -> BranchDirectory {
        BranchDirectory::new(self.branches.clone())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Get the config directory path (~/.config/attendance)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("attendance");
    Ok(config_dir)
}

/// Get the config file path (~/.config/attendance/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from `path`, or from ~/.config/attendance/config.toml
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with your backend URL and token:\n\n\
            api_url = \"https://attendance.example.edu/api/\"\n\
            token = \"your-access-token\"\n\
            role = \"supervisor\"\n\n\
            [[branches]]\n\
            id = \"1\"\n\
            name = \"Main Campus\"",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    parse_config(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents)?;
    Ok(config)
}
