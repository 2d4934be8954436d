//! @ai:module:intent Project configuration consumed by the annotation builders and the compiler
//! @ai:module:layer infrastructure
//! @ai:module:public_api Config, ReleaseConfig, RepresentationConfig, ErrorRepresentationConfig, RepresentationLookup
//! @ai:module:depends_on version, error
//! @ai:module:stateless true

use crate::error::{AnnotationError, Error, Result};
use crate::version::VersionNumber;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// @ai:intent Main configuration for a documented API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    #[serde(default)]
    pub default_version: Option<VersionNumber>,
    pub versions: Vec<ReleaseConfig>,
    #[serde(default)]
    pub controllers: Vec<String>,
    #[serde(default)]
    pub vendor_tags: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub representations: Vec<RepresentationConfig>,
    #[serde(default)]
    pub error_representations: Vec<ErrorRepresentationConfig>,
    #[serde(default)]
    pub excluded_representations: Vec<String>,
    #[serde(default)]
    pub path_param_translations: BTreeMap<String, String>,
}

/// @ai:intent One released API version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    pub version: VersionNumber,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// @ai:intent A documented data shape and the method carrying its field docblocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepresentationConfig {
    pub class: String,
    pub method: String,
}

/// @ai:intent A representation used as an error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRepresentationConfig {
    pub class: String,
    pub method: String,
    #[serde(default)]
    pub needs_error_code: bool,
}

/// @ai:intent Outcome of looking a representation class up in the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepresentationLookup<'a> {
    Configured { class: &'a str, method: &'a str },
    Excluded,
}

fn default_name() -> String {
    "API".to_string()
}

fn default_tag_prefix() -> String {
    "api".to_string()
}

/// @ai:intent Compare class names, ignoring a leading namespace separator
fn same_class(a: &str, b: &str) -> bool {
    a.trim_start_matches('\\') == b.trim_start_matches('\\')
}

impl Config {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:post relative source_dir is resolved against the config file's directory
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let (Some(dir), Some(parent)) = (&config.source_dir, path.parent()) {
            if dir.is_relative() {
                config.source_dir = Some(parent.join(dir));
            }
        }

        Ok(config)
    }

    /// @ai:intent Parse and validate configuration from TOML text
    /// @ai:post versions are sorted ascending and the default version is configured
    /// @ai:effects pure
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&mut self) -> Result<()> {
        if self.versions.is_empty() {
            return Err(Error::Config("at least one version must be configured".to_string()));
        }
        if self.tag_prefix.is_empty() || self.tag_prefix.ends_with('-') {
            return Err(Error::Config(format!(
                "tag prefix `{}` must be non-empty and must not end with `-`",
                self.tag_prefix
            )));
        }

        self.versions.sort_by(|a, b| a.version.cmp(&b.version));
        if let Some(pair) = self
            .versions
            .windows(2)
            .find(|pair| pair[0].version == pair[1].version)
        {
            return Err(Error::Config(format!(
                "version {} is configured twice",
                pair[0].version
            )));
        }

        if let Some(default) = &self.default_version {
            if self.release(default).is_none() {
                return Err(Error::Config(format!(
                    "default version {} is not a configured version",
                    default
                )));
            }
        }

        Ok(())
    }

    /// @ai:intent Configured versions in ascending order
    pub fn versions(&self) -> impl Iterator<Item = &VersionNumber> {
        self.versions.iter().map(|r| &r.version)
    }

    pub fn first_version(&self) -> Option<&VersionNumber> {
        self.versions.first().map(|r| &r.version)
    }

    pub fn latest_version(&self) -> Option<&VersionNumber> {
        self.versions.last().map(|r| &r.version)
    }

    /// @ai:intent The configured default, falling back to the latest version
    pub fn default_version(&self) -> Option<&VersionNumber> {
        self.default_version.as_ref().or_else(|| self.latest_version())
    }

    pub fn release(&self, version: &VersionNumber) -> Option<&ReleaseConfig> {
        self.versions.iter().find(|r| &r.version == version)
    }

    pub fn has_vendor_tag(&self, tag: &str) -> bool {
        self.vendor_tags.iter().any(|t| t == tag)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    pub fn is_excluded(&self, class: &str) -> bool {
        self.excluded_representations
            .iter()
            .any(|excluded| same_class(excluded, class))
    }

    /// @ai:intent Resolve a representation class, distinguishing excluded from unconfigured
    /// @ai:post Excluded wins over a registry entry for the same class
    /// @ai:effects pure
    pub fn representation(
        &self,
        class: &str,
    ) -> std::result::Result<RepresentationLookup<'_>, AnnotationError> {
        if self.is_excluded(class) {
            return Ok(RepresentationLookup::Excluded);
        }

        let regular = self
            .representations
            .iter()
            .find(|r| same_class(&r.class, class))
            .map(|r| (r.class.as_str(), r.method.as_str()));
        let error = self
            .error_representations
            .iter()
            .find(|r| same_class(&r.class, class))
            .map(|r| (r.class.as_str(), r.method.as_str()));

        regular
            .or(error)
            .map(|(class, method)| RepresentationLookup::Configured { class, method })
            .ok_or_else(|| AnnotationError::UnconfiguredRepresentation(class.to_string()))
    }

    pub fn error_representation(&self, class: &str) -> Option<&ErrorRepresentationConfig> {
        self.error_representations
            .iter()
            .find(|r| same_class(&r.class, class))
    }

    /// @ai:intent Canonical registry name for a class reference, if it is known
    pub fn canonical_class(&self, class: &str) -> Option<&str> {
        self.representations
            .iter()
            .map(|r| r.class.as_str())
            .chain(self.error_representations.iter().map(|r| r.class.as_str()))
            .chain(self.excluded_representations.iter().map(String::as_str))
            .find(|known| same_class(known, class))
    }

    /// @ai:example ("id") -> "movie_id" when translated, otherwise "id"
    pub fn translate_path_param<'a>(&'a self, name: &'a str) -> &'a str {
        self.path_param_translations
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
name = "Showtimes"

controllers = ["MovieController"]
vendor_tags = ["tag:BUY_TICKETS"]
scopes = ["public", "edit"]
capabilities = ["NONE"]
excluded_representations = ["Internal"]

[[versions]]
version = "1.1"
release_date = "2017-05-27"

[[versions]]
version = "1.0"
release_date = "2017-04-01"
description = "Initial release"

[[representations]]
class = "Movie"
method = "create"

[[error_representations]]
class = "\\App\\Error"
method = "create"
needs_error_code = true

[path_param_translations]
id = "movie_id"
"#;

    #[test]
    fn test_versions_sorted_ascending() {
        let config = Config::from_toml_str(CONFIG).unwrap();
        let versions: Vec<_> = config.versions().map(|v| v.to_string()).collect();

        assert_eq!(versions, vec!["1.0", "1.1"]);
        assert_eq!(config.first_version().unwrap().as_str(), "1.0");
        assert_eq!(config.default_version().unwrap().as_str(), "1.1");
        assert_eq!(config.tag_prefix, "api");
    }

    #[test]
    fn test_representation_lookup() {
        let config = Config::from_toml_str(CONFIG).unwrap();

        assert_eq!(
            config.representation("Movie"),
            Ok(RepresentationLookup::Configured {
                class: "Movie",
                method: "create"
            })
        );
        assert_eq!(
            config.representation("Internal"),
            Ok(RepresentationLookup::Excluded)
        );
        assert_eq!(
            config.representation("Person"),
            Err(AnnotationError::UnconfiguredRepresentation("Person".to_string()))
        );
        assert!(config.error_representation("App\\Error").unwrap().needs_error_code);
    }

    #[test]
    fn test_bad_version_schema_rejected() {
        let result = Config::from_toml_str("[[versions]]\nversion = \"one\"\n");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_unknown_default_version_rejected() {
        let result = Config::from_toml_str(
            "default_version = \"2.0\"\n[[versions]]\nversion = \"1.0\"\n",
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_path_param_translation() {
        let config = Config::from_toml_str(CONFIG).unwrap();
        assert_eq!(config.translate_path_param("id"), "movie_id");
        assert_eq!(config.translate_path_param("slug"), "slug");
    }
}
