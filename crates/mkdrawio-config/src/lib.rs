//! Configuration management for mkdrawio.
//!
//! Parses `mkdrawio.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `site.docs_dir`
//! - `site.site_dir`
//! - `drawio.file_extension`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override page source directory.
    pub docs_dir: Option<PathBuf>,
    /// Override rendered site directory.
    pub site_dir: Option<PathBuf>,
    /// Override diagram file extension.
    pub file_extension: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mkdrawio.toml";

/// Project data directory name, next to the config file.
const PROJECT_DIRNAME: &str = ".mkdrawio";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Site layout (paths are relative strings from TOML).
    site: SiteConfigRaw,
    /// Diagram embedding configuration.
    pub drawio: DrawioConfig,

    /// Resolved site configuration (set after loading).
    #[serde(skip)]
    pub site_resolved: SiteConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw site configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct SiteConfigRaw {
    docs_dir: Option<String>,
    site_dir: Option<String>,
    use_directory_urls: Option<bool>,
}

/// Resolved site configuration with absolute paths.
#[derive(Debug, Default)]
pub struct SiteConfig {
    /// Page sources; diagram references resolve against these directories.
    pub docs_dir: PathBuf,
    /// Rendered HTML output, transformed in place.
    pub site_dir: PathBuf,
    /// Project directory for mkdrawio data (.mkdrawio/).
    pub project_dir: PathBuf,
    /// Whether pages are rendered as `page/index.html`.
    pub use_directory_urls: bool,
}

impl SiteConfig {
    /// Viewer asset directory (.mkdrawio/static/).
    #[must_use]
    pub fn viewer_dir(&self) -> PathBuf {
        self.project_dir.join("static")
    }
}

/// Diagram embedding configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DrawioConfig {
    /// Substring identifying diagram references in image sources.
    pub file_extension: String,
}

impl Default for DrawioConfig {
    fn default() -> Self {
        Self {
            // Same value as `mkdrawio_embed::DEFAULT_FILE_EXTENSION`
            file_extension: ".drawio".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.docs_dir`").
        field: String,
        /// Error message (e.g., "${`DOCS_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mkdrawio.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails, or
    /// the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(docs_dir) = &settings.docs_dir {
            self.site_resolved.docs_dir.clone_from(docs_dir);
        }
        if let Some(site_dir) = &settings.site_dir {
            self.site_resolved.site_dir.clone_from(site_dir);
        }
        if let Some(file_extension) = &settings.file_extension {
            self.drawio.file_extension.clone_from(file_extension);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfigRaw::default(),
            drawio: DrawioConfig::default(),
            site_resolved: SiteConfig {
                docs_dir: base.join("docs"),
                site_dir: base.join("site"),
                project_dir: base.join(PROJECT_DIRNAME),
                use_directory_urls: true,
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.drawio.file_extension, "drawio.file_extension")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.site.docs_dir {
            self.site.docs_dir = Some(expand::expand_env(dir, "site.docs_dir")?);
        }
        if let Some(ref dir) = self.site.site_dir {
            self.site.site_dir = Some(expand::expand_env(dir, "site.site_dir")?);
        }
        self.drawio.file_extension =
            expand::expand_env(&self.drawio.file_extension, "drawio.file_extension")?;
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>, default: &str| config_dir.join(path.unwrap_or(default));

        self.site_resolved = SiteConfig {
            docs_dir: resolve(self.site.docs_dir.as_deref(), "docs"),
            site_dir: resolve(self.site.site_dir.as_deref(), "site"),
            project_dir: config_dir.join(PROJECT_DIRNAME),
            use_directory_urls: self.site.use_directory_urls.unwrap_or(true),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.site_resolved.docs_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.site_resolved.site_dir, PathBuf::from("/test/site"));
        assert_eq!(
            config.site_resolved.project_dir,
            PathBuf::from("/test/.mkdrawio")
        );
        assert_eq!(
            config.site_resolved.viewer_dir(),
            PathBuf::from("/test/.mkdrawio/static")
        );
        assert!(config.site_resolved.use_directory_urls);
        assert_eq!(config.drawio.file_extension, ".drawio");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.drawio.file_extension, ".drawio");
        assert!(config.site.docs_dir.is_none());
    }

    #[test]
    fn test_parse_drawio_config() {
        let toml = r#"
[drawio]
file_extension = ".dio"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.drawio.file_extension, ".dio");
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[site]
docs_dir = "documentation"
site_dir = "public"
use_directory_urls = false
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.site_resolved.docs_dir,
            PathBuf::from("/project/documentation")
        );
        assert_eq!(config.site_resolved.site_dir, PathBuf::from("/project/public"));
        assert_eq!(
            config.site_resolved.project_dir,
            PathBuf::from("/project/.mkdrawio")
        );
        assert!(!config.site_resolved.use_directory_urls);
    }

    #[test]
    fn test_resolve_paths_defaults() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.site_resolved.docs_dir, PathBuf::from("/project/docs"));
        assert_eq!(config.site_resolved.site_dir, PathBuf::from("/project/site"));
        assert!(config.site_resolved.use_directory_urls);
    }

    #[test]
    fn test_validate_empty_file_extension() {
        let toml = r#"
[drawio]
file_extension = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();

        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("drawio.file_extension"));
    }

    #[test]
    fn test_apply_cli_settings_dirs() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            docs_dir: Some(PathBuf::from("/custom/docs")),
            site_dir: Some(PathBuf::from("/custom/site")),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.site_resolved.docs_dir, PathBuf::from("/custom/docs"));
        assert_eq!(config.site_resolved.site_dir, PathBuf::from("/custom/site"));
        assert_eq!(
            config.site_resolved.project_dir,
            PathBuf::from("/test/.mkdrawio")
        ); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_file_extension() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            file_extension: Some(".dio".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.drawio.file_extension, ".dio");
        assert_eq!(config.site_resolved.docs_dir, PathBuf::from("/test/docs")); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));

        config.apply_cli_settings(&CliSettings::default());

        assert_eq!(config.site_resolved.docs_dir, PathBuf::from("/test/docs"));
        assert_eq!(config.site_resolved.site_dir, PathBuf::from("/test/site"));
        assert_eq!(config.drawio.file_extension, ".drawio");
    }

    #[test]
    fn test_expand_env_vars_site_dirs() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MKDRAWIO_TEST_SITE_OUT", "build/html");
        }

        let toml = r#"
[site]
site_dir = "${MKDRAWIO_TEST_SITE_OUT}"
docs_dir = "${MKDRAWIO_TEST_DOCS_UNSET:-content}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(config.site.site_dir.as_deref(), Some("build/html"));
        assert_eq!(config.site.docs_dir.as_deref(), Some("content"));

        unsafe {
            std::env::remove_var("MKDRAWIO_TEST_SITE_OUT");
        }
    }

    #[test]
    fn test_expand_env_vars_missing_required_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MKDRAWIO_TEST_EXT_MISSING");
        }

        let toml = r#"
[drawio]
file_extension = "${MKDRAWIO_TEST_EXT_MISSING}"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        let err = config.expand_env_vars().unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MKDRAWIO_TEST_EXT_MISSING"));
        assert!(err.to_string().contains("drawio.file_extension"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mkdrawio.toml");
        std::fs::write(
            &path,
            r#"
[site]
docs_dir = "src"

[drawio]
file_extension = ".dio"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.site_resolved.docs_dir, tmp.path().join("src"));
        assert_eq!(config.site_resolved.site_dir, tmp.path().join("site"));
        assert_eq!(config.site_resolved.project_dir, tmp.path().join(".mkdrawio"));
        assert_eq!(config.drawio.file_extension, ".dio");
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_applies_cli_settings_last() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mkdrawio.toml");
        std::fs::write(&path, "[site]\nsite_dir = \"public\"\n").unwrap();
        let settings = CliSettings {
            site_dir: Some(PathBuf::from("/override")),
            ..Default::default()
        };

        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.site_resolved.site_dir, PathBuf::from("/override"));
    }

    #[test]
    fn test_load_rejects_empty_cli_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mkdrawio.toml");
        std::fs::write(&path, "").unwrap();
        let settings = CliSettings {
            file_extension: Some(String::new()),
            ..Default::default()
        };

        let err = Config::load(Some(&path), Some(&settings)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mkdrawio.toml");
        std::fs::write(&path, "[site\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
