//! Step configuration.
//!
//! One typed configuration struct covers every pipeline step; each step
//! validates the fields it needs before composing commands. Configuration
//! can come from builder calls, CLI flags, or a `.xcodecirc.yaml` /
//! `.xcodecirc.json` project file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file names probed in the project directory, in order.
pub const CONFIG_BASENAMES: [&str; 3] = [".xcodecirc.yaml", ".xcodecirc.yml", ".xcodecirc.json"];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

/// Per-binary option adjustments.
///
/// `extra_options` is appended to the option string the step composes for
/// that binary; `override_options` discards the composed string and
/// replaces it entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolOptions {
    pub extra_options: Option<String>,
    pub override_options: Option<String>,
}

/// Configuration for a pipeline step or a whole `build` run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    /// Workspace to build. Build-backed steps need this or `project`.
    pub workspace: Option<String>,

    /// Project to build.
    pub project: Option<String>,

    /// Scheme to build. Required by build-backed steps.
    pub scheme: Option<String>,

    /// Build configuration; lint falls back to `Release` when unset.
    pub configuration: Option<String>,

    /// Minimum duplicated-token run for the duplicate detector.
    pub minimum_tokens: Option<u32>,

    /// Per-binary option adjustments, keyed by binary name.
    pub tools: HashMap<String, ToolOptions>,
}

impl StepConfig {
    /// Load from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("none").to_string(),
            )),
        }
    }

    /// Look for a config file in `dir` and load the first match.
    pub fn discover(dir: &Path) -> Result<Option<Self>, ConfigError> {
        for basename in CONFIG_BASENAMES {
            let path = dir.join(basename);
            if path.exists() {
                return Ok(Some(Self::from_file(&path)?));
            }
        }
        Ok(None)
    }

    /// Set the workspace
    pub fn workspace<S: Into<String>>(mut self, workspace: S) -> Self {
        self.workspace = Some(workspace.into());
        self
    }

    /// Set the project
    pub fn project<S: Into<String>>(mut self, project: S) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the scheme
    pub fn scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Set the build configuration
    pub fn configuration<S: Into<String>>(mut self, configuration: S) -> Self {
        self.configuration = Some(configuration.into());
        self
    }

    /// Set the duplicate-detection token threshold
    pub fn minimum_tokens(mut self, tokens: u32) -> Self {
        self.minimum_tokens = Some(tokens);
        self
    }

    /// Append extra options to a binary's composed command
    pub fn tool_extra<B, S>(mut self, binary: B, options: S) -> Self
    where
        B: Into<String>,
        S: Into<String>,
    {
        self.tools.entry(binary.into()).or_default().extra_options = Some(options.into());
        self
    }

    /// Replace a binary's composed options entirely
    pub fn tool_override<B, S>(mut self, binary: B, options: S) -> Self
    where
        B: Into<String>,
        S: Into<String>,
    {
        self.tools.entry(binary.into()).or_default().override_options = Some(options.into());
        self
    }

    /// Adjustments configured for `binary`, if any.
    pub fn tool(&self, binary: &str) -> Option<&ToolOptions> {
        self.tools.get(binary)
    }

    /// True when `binary` has replacement options configured.
    pub fn has_override(&self, binary: &str) -> bool {
        self.tool(binary)
            .map(|tool| tool.override_options.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_sets_fields() {
        let config = StepConfig::default()
            .workspace("MyApp.xcworkspace")
            .scheme("MyApp")
            .minimum_tokens(50);

        assert_eq!(config.workspace.as_deref(), Some("MyApp.xcworkspace"));
        assert_eq!(config.scheme.as_deref(), Some("MyApp"));
        assert_eq!(config.minimum_tokens, Some(50));
        assert_eq!(config.project, None);
    }

    #[test]
    fn tool_adjustments() {
        let config = StepConfig::default()
            .tool_extra("oclint-xcodebuild", "-foo")
            .tool_override("xcodebuild", "-bar");

        let oclint = config.tool("oclint-xcodebuild").unwrap();
        assert_eq!(oclint.extra_options.as_deref(), Some("-foo"));
        assert_eq!(oclint.override_options, None);

        assert!(config.has_override("xcodebuild"));
        assert!(!config.has_override("oclint-xcodebuild"));
        assert!(!config.has_override("sloccount"));
    }

    #[test]
    fn yaml_round_trip() {
        let config = StepConfig::default()
            .workspace("MyApp.xcworkspace")
            .scheme("MyApp")
            .tool_extra("sloccount", "--follow");

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: StepConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn from_file_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ci.json");
        std::fs::write(
            &path,
            r#"{"scheme": "MyApp", "tools": {"xcodebuild": {"override_options": "-bar"}}}"#,
        )
        .unwrap();

        let config = StepConfig::from_file(&path).unwrap();
        assert_eq!(config.scheme.as_deref(), Some("MyApp"));
        assert!(config.has_override("xcodebuild"));
    }

    #[test]
    fn from_file_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ci.toml");
        std::fs::write(&path, "scheme = \"MyApp\"").unwrap();

        assert!(matches!(
            StepConfig::from_file(&path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn discover_prefers_yaml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".xcodecirc.yaml"), "scheme: FromYaml").unwrap();
        std::fs::write(dir.path().join(".xcodecirc.json"), r#"{"scheme": "FromJson"}"#).unwrap();

        let config = StepConfig::discover(dir.path()).unwrap().unwrap();
        assert_eq!(config.scheme.as_deref(), Some("FromYaml"));
    }

    #[test]
    fn discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(StepConfig::discover(dir.path()).unwrap().is_none());
    }
}
