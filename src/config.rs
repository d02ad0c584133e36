use crate::error::Result;
use crate::fileutil::{PermissionPolicy, ScanOptions};
use crate::manifest::ManifestFormat;
use crate::serdeutil::deserialize_string_or_seq;
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "pynq-utils.toml";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    /// Default prefix for installed package names.
    #[serde(default)]
    pub package_name: String,

    #[serde(default, deserialize_with = "deserialize_string_or_seq")]
    pub roots: Vec<String>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub skip_hidden: bool,

    #[serde(default)]
    pub follow_links: bool,

    /// Fail on unreadable entries instead of skipping them.
    #[serde(default)]
    pub strict: bool,

    #[serde(default, deserialize_with = "deserialize_string_or_seq")]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn from_toml_str(toml_str: &str) -> Result<Config> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn from_file(file_path: impl AsRef<Path>) -> Result<Config> {
        let content = std::fs::read_to_string(file_path)?;
        Self::from_toml_str(&content)
    }

    /// Load `file_path` if given; otherwise the default file if present,
    /// else built-in defaults.
    pub fn load(file_path: Option<&str>) -> Result<Config> {
        match file_path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn manifest_format(&self) -> std::result::Result<ManifestFormat, String> {
        self.format
            .as_deref()
            .map(str::parse)
            .unwrap_or(Ok(ManifestFormat::Json))
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            follow_links: self.follow_links,
            skip_hidden: self.skip_hidden,
            exclude: self.exclude.clone(),
            permissions: if self.strict {
                PermissionPolicy::Fail
            } else {
                PermissionPolicy::Skip
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
package_name = "pynq_helloworld"
roots = ["notebooks", "data"]
format = "python"
skip_hidden = true
strict = true
exclude = "*.pyc"
log_level = "debug"
"#,
        )
        .unwrap();

        assert_eq!(config.package_name, "pynq_helloworld");
        assert_eq!(config.roots, vec!["notebooks", "data"]);
        assert_eq!(config.manifest_format(), Ok(ManifestFormat::Python));
        assert_eq!(config.exclude, vec!["*.pyc"]);

        let options = config.scan_options();
        assert!(options.skip_hidden);
        assert!(!options.follow_links);
        assert_eq!(options.permissions, PermissionPolicy::Fail);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.package_name.is_empty());
        assert!(config.roots.is_empty());
        assert_eq!(config.manifest_format(), Ok(ManifestFormat::Json));
        assert_eq!(config.scan_options().permissions, PermissionPolicy::Skip);
    }

    #[test]
    fn test_single_root_string() {
        let config = Config::from_toml_str(r#"roots = "notebooks""#).unwrap();
        assert_eq!(config.roots, vec!["notebooks"]);
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(Config::load(Some("/nonexistent/pynq-utils.toml")).is_err());
    }
}
