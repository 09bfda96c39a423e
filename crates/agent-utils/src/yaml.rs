//! YAML loading helpers

use crate::config::ConfigError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Parse a YAML string into a typed structure
///
/// A leading `---` document separator is accepted.
pub fn parse_yaml<T: DeserializeOwned>(yaml: &str) -> Result<T, ConfigError> {
    let cleaned = yaml.trim_start().trim_start_matches("---");
    serde_yaml::from_str(cleaned).map_err(|e| ConfigError::Parse {
        path: None,
        detail: e.to_string(),
    })
}

/// Read and parse a YAML file into a typed structure
pub fn load_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_yaml(&content).map_err(|e| match e {
        ConfigError::Parse { detail, .. } => ConfigError::Parse {
            path: Some(path.display().to_string()),
            detail,
        },
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        name: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    #[test]
    fn test_parse_yaml() {
        let sample: Sample = parse_yaml("---\nname: demo\ntags: [a, b]\n").unwrap();
        assert_eq!(sample.name, "demo");
        assert_eq!(sample.tags, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_error() {
        let result: Result<Sample, _> = parse_yaml("name: [unterminated");
        let err = result.unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse YAML:"));
    }

    #[test]
    fn test_missing_file() {
        let result: Result<Sample, _> = load_yaml_file("/nonexistent/workflows.yaml");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
