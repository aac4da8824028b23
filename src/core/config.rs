//! Configuration management with layered hierarchy
//!
//! Sources, lowest precedence first: built-in defaults, the global user
//! config (`~/.config/qms/config.yaml`), the project config
//! (`.qms/config.yaml`), then `QMS_*` environment variables. Command-line
//! flags are applied on top by the CLI.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::project::Project;

/// Tenant used when nothing else names one
pub const DEFAULT_TENANT: &str = "default";

/// QMS configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tenant that owns records created from this project
    pub tenant: Option<String>,

    /// Default actor for transitions
    pub author: Option<String>,

    /// Tracing filter directive (e.g. "info" or "qms=debug")
    pub log_level: Option<String>,

    /// Default output format
    pub default_format: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Self {
        let project = Project::discover().ok();
        Self::load_for(project.as_ref())
    }

    /// Same as [`Config::load`] with an explicit project
    pub fn load_for(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&project.qms_dir().join("config.yaml")) {
                config.merge(project_config);
            }
        }

        config.merge(Self::from_env());
        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yml::from_str::<Config>(&contents) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config file");
                    None
                }
            },
            Err(_) => None,
        }
    }

    fn from_env() -> Config {
        Config {
            tenant: std::env::var("QMS_TENANT").ok(),
            author: std::env::var("QMS_AUTHOR").ok(),
            log_level: std::env::var("QMS_LOG").ok(),
            default_format: None,
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "qms")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.tenant.is_some() {
            self.tenant = other.tenant;
        }
        if other.author.is_some() {
            self.author = other.author;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
    }

    /// Tenant to operate as
    pub fn tenant(&self) -> String {
        self.tenant
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TENANT.to_string())
    }

    /// Get the author name, falling back to git config or username
    pub fn author(&self) -> String {
        if let Some(ref author) = self.author {
            return author.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            tenant: Some("acme".to_string()),
            author: Some("alice".to_string()),
            ..Config::default()
        };
        base.merge(Config {
            tenant: Some("globex".to_string()),
            ..Config::default()
        });

        assert_eq!(base.tenant(), "globex");
        assert_eq!(base.author(), "alice");
    }

    #[test]
    fn test_tenant_falls_back_to_default() {
        let config = Config {
            tenant: Some("  ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.tenant(), DEFAULT_TENANT);
    }

    #[test]
    fn test_parse_project_config() {
        let yaml = "tenant: acme\nlog_level: debug\n";
        let config: Config = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.tenant.as_deref(), Some("acme"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert!(config.default_format.is_none());
    }
}
