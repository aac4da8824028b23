//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project marker directory
pub const PROJECT_DIR: &str = ".qms";

/// Database file inside the project directory
const DATABASE_FILE: &str = "quality.db";

/// Represents a QMS project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .qms/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project at the given path
    pub fn init(path: &Path, tenant: Option<&str>) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_structure(root, tenant)
    }

    /// Initialize even if .qms/ exists. The database is left untouched.
    pub fn init_force(path: &Path, tenant: Option<&str>) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_structure(root, tenant)
    }

    fn write_structure(root: PathBuf, tenant: Option<&str>) -> Result<Self, ProjectError> {
        let qms_dir = root.join(PROJECT_DIR);
        std::fs::create_dir_all(&qms_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(qms_dir.join("config.yaml"), Self::default_config(tenant))
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(qms_dir.join(".gitignore"), "quality.db*\n")
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config(tenant: Option<&str>) -> String {
        let tenant_line = match tenant {
            Some(t) => format!("tenant: {}", t),
            None => "# tenant: default".to_string(),
        };

        format!(
            r#"# QMS Project Configuration

# Tenant that owns records created from this project (or QMS_TENANT / --tenant)
{}

# Default actor recorded on transitions (or QMS_AUTHOR)
# author: ""

# Log level: error, warn, info, debug, trace (or QMS_LOG)
# log_level: warn

# Default output format (auto, yaml, json, tsv, csv, id)
# default_format: auto
"#,
            tenant_line
        )
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .qms configuration directory
    pub fn qms_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    /// Path of the project database
    pub fn database_path(&self) -> PathBuf {
        self.qms_dir().join(DATABASE_FILE)
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a QMS project (searched from {searched_from:?}). Run 'qms init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("QMS project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path(), Some("acme")).unwrap();

        assert!(project.qms_dir().is_dir());
        let config = std::fs::read_to_string(project.qms_dir().join("config.yaml")).unwrap();
        assert!(config.contains("tenant: acme"));
        assert_eq!(project.database_path(), project.qms_dir().join("quality.db"));
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), None).unwrap();

        let err = Project::init(tmp.path(), None).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init_force(tmp.path(), None).is_ok());
    }

    #[test]
    fn test_project_discover_finds_qms_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path(), None).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_qms_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }
}
