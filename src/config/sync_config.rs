//! linear-sync configuration file handling
//!
//! Loads ~/.config/linear-sync/config.yaml (or an explicit path) and applies
//! environment overrides. Secrets are only ever read from the environment.

use super::integrations::{AutomationConfig, GitHubIntegration, LinearIntegration};
use crate::identity::IdentityMap;
use crate::sync::EngineSettings;
use crate::{Result, SyncError};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// linear-sync configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub github: GitHubIntegration,

    #[serde(default)]
    pub linear: LinearIntegration,

    #[serde(default)]
    pub automation: AutomationConfig,

    /// GitHub logins eligible as assignees for new issues.
    /// Empty means every configured user.
    #[serde(default)]
    pub maintainers: Vec<String>,

    /// Linear display name -> GitHub login
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

impl SyncConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from the default path (~/.config/linear-sync/config.yaml)
    pub fn load_default() -> Result<Self> {
        Self::load(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SyncError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading linear-sync configuration");

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            users = config.users.len(),
            maintainers = config.maintainers.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/linear-sync/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("linear-sync");
        path.push("config.yaml");
        path
    }

    /// Apply `LINEAR_TEAM_ID`, `MAINTAINERS` and `AUTOMATION_ACTOR` from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup (blank values are ignored)
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(team_id) = lookup("LINEAR_TEAM_ID") {
            self.linear.team_id = Some(team_id);
        }
        if let Some(maintainers) = lookup("MAINTAINERS") {
            self.maintainers = maintainers
                .split(';')
                .map(str::trim)
                .filter(|login| !login.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(actor) = lookup("AUTOMATION_ACTOR") {
            self.automation.actor = actor;
        }
    }

    /// Full identity map from the `users` table
    pub fn identity_map(&self) -> Result<IdentityMap> {
        IdentityMap::from_display_names(self.users.iter().map(|(k, v)| (k.clone(), v.clone())))
    }

    /// Identity map restricted to the maintainers (all users when none are listed)
    pub fn maintainer_identities(&self) -> Result<IdentityMap> {
        let identities = self.identity_map()?;
        if self.maintainers.is_empty() {
            return Ok(identities);
        }
        Ok(identities.restrict_to(&self.maintainers))
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            team_id: self.linear.team_id.clone(),
            automation_actor: self.automation.actor.clone(),
            comment_author: self.automation.comment_author.clone(),
            autoclosed_state_name: self.automation.autoclosed_state.name.clone(),
            autoclosed_state_category: self.automation.autoclosed_state.category.clone(),
        }
    }
}

/// API secrets read from the environment
#[derive(Clone)]
pub struct Credentials {
    pub github_token: String,
    pub linear_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &"<redacted>")
            .field("linear_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Read the variables named in the configuration from the process environment
    pub fn from_env(config: &SyncConfig) -> Result<Self> {
        Self::from_lookup(config, |name| std::env::var(name).ok())
    }

    pub fn from_lookup(config: &SyncConfig, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| SyncError::Config(format!("Missing env variable {}", name)))
        };

        Ok(Self {
            github_token: require(&config.github.token_env)?,
            linear_api_key: require(&config.linear.api_key_env)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
linear:
  team_id: team-123
maintainers: [alcuadrado, kanej]
users:
  pato: alcuadrado
  john: kanej
  morgan: morgansliman
"#;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::new();
        assert_eq!(config.github.url, "https://github.com");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert_eq!(config.linear.api_url, "https://api.linear.app/graphql");
        assert_eq!(config.automation.actor, "nomic-foundation-automation");
        assert_eq!(config.automation.autoclosed_state.name, "Autoclosed");
    }

    #[test]
    fn test_load_partial_yaml() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), SAMPLE).unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.linear.team_id.as_deref(), Some("team-123"));
        assert_eq!(config.users.len(), 3);
        assert_eq!(config.automation.comment_author, "github-actions[bot]");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = SyncConfig::new();
        config.users.insert("pato".to_string(), "alcuadrado".to_string());
        config.save(&path).unwrap();

        assert_eq!(SyncConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let result = SyncConfig::load("/nonexistent/config.yaml");
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn test_default_path() {
        assert!(SyncConfig::default_path().ends_with("linear-sync/config.yaml"));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("LINEAR_TEAM_ID", " team-9 "),
            ("MAINTAINERS", "kanej;;fvictorio"),
            ("AUTOMATION_ACTOR", "   "),
        ]
        .into_iter()
        .collect();

        let mut config = SyncConfig::new();
        config.apply_overrides_from(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.linear.team_id.as_deref(), Some("team-9"));
        assert_eq!(config.maintainers, vec!["kanej", "fvictorio"]);
        assert_eq!(config.automation.actor, "nomic-foundation-automation");
    }

    #[test]
    fn test_maintainer_identities() {
        let config: SyncConfig = serde_yaml::from_str(SAMPLE).unwrap();

        let maintainers = config.maintainer_identities().unwrap();
        assert_eq!(maintainers.len(), 2);
        assert!(maintainers.to_external("morgansliman").is_none());

        let everyone = config.identity_map().unwrap();
        assert_eq!(everyone.to_ticket_system("morgan"), Some("morgansliman"));
    }

    #[test]
    fn test_credentials() {
        let config = SyncConfig::new();

        let missing = Credentials::from_lookup(&config, |name| {
            (name == "GITHUB_TOKEN").then(|| "ghp_x".to_string())
        });
        match missing {
            Err(SyncError::Config(msg)) => assert_eq!(msg, "Missing env variable LINEAR_API_KEY"),
            other => panic!("unexpected: {:?}", other),
        }

        let credentials =
            Credentials::from_lookup(&config, |_| Some("secret".to_string())).unwrap();
        assert_eq!(credentials.linear_api_key, "secret");
        assert!(!format!("{:?}", credentials).contains("secret"));
    }
}
