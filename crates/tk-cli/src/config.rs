//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tk_core::ProjectConfig;

/// Environment variable consulted when `api_key` is not configured.
pub const GEMINI_API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// JSON file listing the projects to analyze.
    pub projects_file: PathBuf,

    /// Inline project list; takes precedence over `projects_file`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<ProjectConfig>,

    /// Gemini API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Gemini model identifier.
    pub model: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("projects_file", &self.projects_file)
            .field("projects", &self.projects)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs_config_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            projects_file: config_dir.join("projects.json"),
            projects: Vec::new(),
            api_key: None,
            model: tk_llm::DEFAULT_MODEL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (TIMEKEEP_*)
        figment = figment.merge(Env::prefixed("TIMEKEEP_"));

        figment.extract()
    }

    /// The configured API key, falling back to `GEMINI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        fn non_blank(key: &str) -> Option<String> {
            let key = key.trim();
            (!key.is_empty()).then(|| key.to_string())
        }

        self.api_key
            .as_deref()
            .and_then(non_blank)
            .or_else(|| {
                std::env::var(GEMINI_API_KEY_VAR)
                    .ok()
                    .as_deref()
                    .and_then(non_blank)
            })
    }

    /// Returns the projects to analyze, reading `projects_file` when no
    /// inline list is configured.
    pub fn load_projects(&self) -> Result<Vec<ProjectConfig>> {
        let projects = if self.projects.is_empty() {
            read_projects_file(&self.projects_file)?
        } else {
            self.projects.clone()
        };
        Ok(projects.into_iter().map(normalize_project).collect())
    }
}

fn read_projects_file(path: &Path) -> Result<Vec<ProjectConfig>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            bail!("project configuration file not found: {}", path.display())
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    serde_json::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn normalize_project(mut project: ProjectConfig) -> ProjectConfig {
    project.path = expand_home(&project.path);
    if project.author_filter().is_none() {
        project.author_email = None;
    }
    project
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest))
}

/// Returns the platform-specific config directory for timekeep.
///
/// On Linux: `~/.config/timekeep`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("timekeep"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config_reads_projects_from_config_dir() {
        let config = Config::default();
        let config_dir = dirs_config_path().unwrap();
        assert_eq!(config.projects_file, config_dir.join("projects.json"));
        assert_eq!(config.model, tk_llm::DEFAULT_MODEL);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("super-secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_load_from_file_with_inline_projects() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model = "gemini-test"

[[projects]]
name = "site"
path = "/srv/site"
author_email = "me@example.com"
"#
        )
        .unwrap();
        file.flush().unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.model, "gemini-test");
        let projects = config.load_projects().unwrap();
        assert_eq!(
            projects,
            vec![ProjectConfig::new("site", "/srv/site").with_author_email("me@example.com")]
        );
    }

    #[test]
    fn test_load_projects_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(
            &path,
            r#"[{"name": "api", "path": "/srv/api", "author_email": ""}, {"name": "web", "path": "/srv/web"}]"#,
        )
        .unwrap();

        let config = Config {
            projects_file: path,
            ..Config::default()
        };
        let projects = config.load_projects().unwrap();
        assert_eq!(projects.len(), 2);
        assert_eq!(projects[0].name, "api");
        assert_eq!(projects[0].author_email, None);
        assert_eq!(projects[1].path, PathBuf::from("/srv/web"));
    }

    #[test]
    fn test_missing_projects_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            projects_file: dir.path().join("missing.json"),
            ..Config::default()
        };
        let err = config.load_projects().unwrap_err();
        assert!(err.to_string().contains("project configuration file not found"));
    }

    #[test]
    fn test_invalid_projects_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("projects.json");
        std::fs::write(&path, "{not json").unwrap();
        let config = Config {
            projects_file: path,
            ..Config::default()
        };
        let err = config.load_projects().unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_expand_home_replaces_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home(Path::new("~/code/app")), home.join("code/app"));
        assert_eq!(expand_home(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        assert_eq!(expand_home(Path::new("~other/x")), PathBuf::from("~other/x"));
    }
}
