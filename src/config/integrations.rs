//! GitHub, Linear and automation settings

use serde::{Deserialize, Serialize};

/// GitHub integration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHubIntegration {
    /// GitHub instance URL (e.g., "https://github.com" or "https://github.example.com")
    #[serde(default = "default_github_url")]
    pub url: String,

    /// Environment variable holding the API token
    #[serde(default = "default_github_token_env")]
    pub token_env: String,
}

fn default_github_url() -> String {
    "https://github.com".to_string()
}

fn default_github_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl Default for GitHubIntegration {
    fn default() -> Self {
        Self {
            url: default_github_url(),
            token_env: default_github_token_env(),
        }
    }
}

/// Linear integration configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearIntegration {
    /// GraphQL endpoint
    #[serde(default = "default_linear_api_url")]
    pub api_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_linear_api_key_env")]
    pub api_key_env: String,

    /// Team that receives mirrored issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
}

fn default_linear_api_url() -> String {
    "https://api.linear.app/graphql".to_string()
}

fn default_linear_api_key_env() -> String {
    "LINEAR_API_KEY".to_string()
}

impl Default for LinearIntegration {
    fn default() -> Self {
        Self {
            api_url: default_linear_api_url(),
            api_key_env: default_linear_api_key_env(),
            team_id: None,
        }
    }
}

/// Workflow state a Linear issue is moved to when its GitHub side closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoclosedState {
    #[serde(default = "default_autoclosed_name")]
    pub name: String,

    /// Linear state type (`completed`, `canceled`, ...)
    #[serde(default = "default_autoclosed_category")]
    pub category: String,
}

fn default_autoclosed_name() -> String {
    "Autoclosed".to_string()
}

fn default_autoclosed_category() -> String {
    "completed".to_string()
}

impl Default for AutoclosedState {
    fn default() -> Self {
        Self {
            name: default_autoclosed_name(),
            category: default_autoclosed_category(),
        }
    }
}

/// Identities used by the automation itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// GitHub account the Linear webhook acts as
    #[serde(default = "default_actor")]
    pub actor: String,

    /// GitHub account that posts the tracking comments
    #[serde(default = "default_comment_author")]
    pub comment_author: String,

    #[serde(default)]
    pub autoclosed_state: AutoclosedState,
}

fn default_actor() -> String {
    "nomic-foundation-automation".to_string()
}

fn default_comment_author() -> String {
    "github-actions[bot]".to_string()
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            actor: default_actor(),
            comment_author: default_comment_author(),
            autoclosed_state: AutoclosedState::default(),
        }
    }
}
