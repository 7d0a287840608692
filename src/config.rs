//! Layered configuration
//!
//! Built-in defaults, then the user file `<config_dir>/weft/config.toml`,
//! then the repository file `.weft/config.toml`. Tables are merged key by
//! key so a later layer only needs to name what it changes.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub executor: ExecutorConfig,
    pub tracker: TrackerConfig,
    /// Extra or overridden agent roles.
    pub agents: BTreeMap<String, AgentConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Executor used when a command does not name one.
    pub default: String,
    pub claude_binary: String,
    /// Shell command run by the `command` executor.
    pub command: Option<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            default: "claude".to_string(),
            claude_binary: "claude".to_string(),
            command: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub gh_binary: String,
    pub labels: Vec<String>,
    pub repo: Option<String>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            gh_binary: "gh".to_string(),
            labels: Vec::new(),
            repo: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentConfig {
    pub description: Option<String>,
    pub prompt: Option<String>,
}

impl Config {
    /// Load the user layer (if any) and the repository layer (if any).
    pub fn load(repo_config: &Path) -> Result<Self> {
        let user = user_config_path();
        let layers: Vec<&Path> = user
            .as_deref()
            .into_iter()
            .chain(std::iter::once(repo_config))
            .collect();
        Self::from_layers(&layers)
    }

    /// Merge the given files in order. Missing files are skipped.
    pub fn from_layers(paths: &[&Path]) -> Result<Self> {
        let mut merged = toml::Value::Table(toml::Table::new());
        for path in paths {
            if !path.exists() {
                continue;
            }
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let layer: toml::Value = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::debug!(path = %path.display(), "config layer loaded");
            merge(&mut merged, layer);
        }
        merged
            .try_into::<Config>()
            .context("Invalid configuration")
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("weft").join("config.toml"))
}

/// Overlay `layer` onto `base`: tables merge recursively, anything else
/// replaces.
fn merge(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("config.toml");
        let config = Config::from_layers(&[&missing]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.executor.default, "claude");
        assert_eq!(config.tracker.gh_binary, "gh");
    }

    #[test]
    fn test_later_layer_overrides_key_by_key() {
        let temp = tempfile::tempdir().unwrap();
        let user = temp.path().join("user.toml");
        let repo = temp.path().join("repo.toml");
        fs::write(
            &user,
            "[executor]\ndefault = \"command\"\ncommand = \"my-agent\"\n\n[tracker]\nlabels = [\"weft\"]\n",
        )
        .unwrap();
        fs::write(&repo, "[executor]\ncommand = \"repo-agent\"\n").unwrap();

        let config = Config::from_layers(&[&user, &repo]).unwrap();
        assert_eq!(config.executor.default, "command");
        assert_eq!(config.executor.command.as_deref(), Some("repo-agent"));
        assert_eq!(config.executor.claude_binary, "claude");
        assert_eq!(config.tracker.labels, vec!["weft"]);
    }

    #[test]
    fn test_agent_roles_from_config() {
        let temp = tempfile::tempdir().unwrap();
        let repo = temp.path().join("config.toml");
        fs::write(
            &repo,
            "[agents.security]\ndescription = \"Audits changes\"\nprompt = \"Look for injection bugs.\"\n",
        )
        .unwrap();

        let config = Config::from_layers(&[&repo]).unwrap();
        let role = &config.agents["security"];
        assert_eq!(role.description.as_deref(), Some("Audits changes"));
    }

    #[test]
    fn test_invalid_toml_is_reported_with_path() {
        let temp = tempfile::tempdir().unwrap();
        let repo = temp.path().join("config.toml");
        fs::write(&repo, "[executor\n").unwrap();

        let err = Config::from_layers(&[&repo]).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
