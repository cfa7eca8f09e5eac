//! Renderer options, optionally loaded from a YAML file
//!
//! ```yaml
//! domain_package: internal/domain
//! db_package: gorm.io/gorm
//! cache_package: github.com/redis/go-redis/v9
//! use_logger: true
//! ```

use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Named options consumed by the layer templates
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Package holding the domain repo interfaces and entities
    pub domain_package: String,
    /// Generated protobuf package; empty means use the schema's `go_package`
    pub proto_package: String,
    /// Database client package (e.g., "gorm.io/gorm"); empty disables it
    pub db_package: String,
    /// Cache client package (e.g., "github.com/redis/go-redis/v9"); empty disables it
    pub cache_package: String,
    /// Whether generated code wires a kratos logger
    pub use_logger: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            domain_package: "internal/domain".to_string(),
            proto_package: String::new(),
            db_package: "gorm.io/gorm".to_string(),
            cache_package: String::new(),
            use_logger: true,
        }
    }
}

impl RenderOptions {
    /// Load options from a YAML file; absent keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            GeneratorError::Config(msg) => {
                GeneratorError::Config(format!("{} (in {:?})", msg, path))
            }
            other => other,
        })
    }

    /// Parse options from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| GeneratorError::Config(format!("Invalid config YAML: {}", e)))
    }

    /// Effective protobuf package, falling back to the schema's `go_package`
    pub fn proto_package_or<'a>(&'a self, go_package: &'a str) -> &'a str {
        if self.proto_package.is_empty() {
            go_package
        } else {
            &self.proto_package
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.domain_package, "internal/domain");
        assert_eq!(options.db_package, "gorm.io/gorm");
        assert!(options.cache_package.is_empty());
        assert!(options.use_logger);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let options = RenderOptions::from_yaml("cache_package: github.com/redis/go-redis/v9\n")
            .unwrap();
        assert_eq!(options.cache_package, "github.com/redis/go-redis/v9");
        assert_eq!(options.domain_package, "internal/domain");
        assert!(options.use_logger);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            RenderOptions::from_yaml("  \n").unwrap(),
            RenderOptions::default()
        );
    }

    #[test]
    fn test_invalid_yaml() {
        let result = RenderOptions::from_yaml("use_logger: [not, a, bool]");
        assert!(matches!(result, Err(GeneratorError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "domain_package: app/domain").unwrap();
        writeln!(file, "use_logger: false").unwrap();

        let options = RenderOptions::load(file.path()).unwrap();
        assert_eq!(options.domain_package, "app/domain");
        assert!(!options.use_logger);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RenderOptions::load(Path::new("/nonexistent/protoscaffold.yaml"));
        assert!(matches!(result, Err(GeneratorError::Config(_))));
    }

    #[test]
    fn test_proto_package_fallback() {
        let mut options = RenderOptions::default();
        assert_eq!(options.proto_package_or("acme/api/v1"), "acme/api/v1");
        options.proto_package = "acme/pb".to_string();
        assert_eq!(options.proto_package_or("acme/api/v1"), "acme/pb");
    }
}
