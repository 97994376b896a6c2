//! File-based dog configuration (YAML or JSON)
//!
//! A single file holds named dogs:
//!
//! ```yaml
//! dogs:
//!   fetch:
//!     enter: "fetching {url}"
//!     error: [40, "fetch of {url} failed: {@err.message}"]
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::dog_config::DogConfig;
use crate::attributes::ProviderRegistry;
use crate::error::DogResult;
use crate::guard::Dog;

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DogsFile {
    #[serde(default)]
    pub dogs: BTreeMap<String, DogConfig>,
}

impl DogsFile {
    pub fn from_yaml_str(content: &str) -> DogResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> DogResult<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl DogConfig {
    /// Load a single dog configuration; `.json` files are parsed as JSON,
    /// anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> DogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if is_json(path) {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }
}

/// A configuration file of named dogs, loaded once and cached
///
/// # Example
///
/// ```no_run
/// use dogging_core::config::DogConfigFile;
/// use dogging_core::global_providers;
///
/// let file = DogConfigFile::new("dogs.yaml");
/// let dog = file.dog("fetch", global_providers()).unwrap();
/// ```
pub struct DogConfigFile {
    path: PathBuf,
    cache: RwLock<Option<DogsFile>>,
}

impl DogConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    /// User-level file, `dogging/dogs.yaml` under the platform config directory
    pub fn user() -> Self {
        let config_dir = dirs::config_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config")
        });
        Self::new(config_dir.join("dogging").join("dogs.yaml"))
    }

    /// Workspace-level file, `.config/dogging/dogs.yaml` under `root`
    pub fn workspace(root: impl AsRef<Path>) -> Self {
        Self::new(root.as_ref().join(".config").join("dogging").join("dogs.yaml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// A missing file holds no dogs
    fn load(&self) -> DogResult<DogsFile> {
        if !self.path.exists() {
            return Ok(DogsFile::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if is_json(&self.path) {
            DogsFile::from_json_str(&content)
        } else {
            DogsFile::from_yaml_str(&content)
        }
    }

    fn get_file(&self) -> DogResult<DogsFile> {
        if let Some(file) = self.cache.read().as_ref() {
            return Ok(file.clone());
        }
        let file = self.load()?;
        *self.cache.write() = Some(file.clone());
        Ok(file)
    }

    /// Drop the cached contents so the next lookup reads the file again
    pub fn reload(&self) {
        *self.cache.write() = None;
    }

    /// Names of the configured dogs, sorted
    pub fn names(&self) -> DogResult<Vec<String>> {
        Ok(self.get_file()?.dogs.into_keys().collect())
    }

    pub fn config(&self, name: &str) -> DogResult<Option<DogConfig>> {
        Ok(self.get_file()?.dogs.remove(name))
    }

    /// Build the dog configured under `name`
    ///
    /// Returns `Ok(None)` when no such dog is configured.
    pub fn dog(&self, name: &str, registry: &ProviderRegistry) -> DogResult<Option<Dog>> {
        match self.config(name)? {
            Some(config) => config.build_with(registry).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DogError, ErrorClass};
    use crate::logging::Level;
    use tempfile::TempDir;

    const DOGS: &str = r#"
dogs:
  fetch:
    enter: "fetching {url}"
    error: [40, "fetch of {url} failed: {@err.message}"]
  quiet:
    exit: ~
"#;

    #[test]
    fn test_standard_locations() {
        let file = DogConfigFile::workspace("/work");
        assert_eq!(file.path(), Path::new("/work/.config/dogging/dogs.yaml"));
        assert!(DogConfigFile::user().path().ends_with("dogging/dogs.yaml"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let file = DogConfigFile::new(dir.path().join("dogs.yaml"));
        assert!(!file.exists());
        assert!(file.names().unwrap().is_empty());
        assert!(file.dog("fetch", &ProviderRegistry::new()).unwrap().is_none());
    }

    #[test]
    fn test_load_and_build() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dogs.yaml");
        fs::write(&path, DOGS).unwrap();

        let file = DogConfigFile::new(&path);
        assert_eq!(file.names().unwrap(), ["fetch", "quiet"]);

        let dog = file.dog("fetch", &ProviderRegistry::new()).unwrap().unwrap();
        assert_eq!(dog.enter().level(), Level::Info);
        assert_eq!(dog.error().level(), Level::Error);
        assert!(!dog.exit().is_enabled());
    }

    #[test]
    fn test_cache_until_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dogs.yaml");
        fs::write(&path, DOGS).unwrap();

        let file = DogConfigFile::new(&path);
        assert_eq!(file.names().unwrap().len(), 2);

        fs::write(&path, "dogs: {}\n").unwrap();
        assert_eq!(file.names().unwrap().len(), 2);

        file.reload();
        assert!(file.names().unwrap().is_empty());
    }

    #[test]
    fn test_json_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dog.json");
        fs::write(&path, r#"{"enter": "hi", "propagate_errors": false}"#).unwrap();

        let config = DogConfig::from_file(&path).unwrap();
        assert_eq!(config.enter, Some(serde_json::json!("hi")));
        assert!(!config.propagate_errors);
    }

    #[test]
    fn test_parse_errors_are_config_class() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "dogs: [unclosed").unwrap();

        let err = DogConfigFile::new(&path).names().unwrap_err();
        assert!(matches!(err, DogError::Yaml(_)));
        assert_eq!(err.class(), ErrorClass::Config);

        let err = DogConfig::from_file(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, DogError::Io(_)));
    }
}
