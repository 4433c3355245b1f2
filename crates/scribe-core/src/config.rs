//! Run configuration
//!
//! Loaded from a TOML file where every field is optional:
//!
//! ```toml
//! [model]
//! flavor = "azure"
//! api_base = "https://example.openai.azure.com"
//! engine = "GPT4"
//!
//! [generation]
//! unit_test_package = "pytest"
//! retry_budget = 3
//! ```
//!
//! The API key itself never lives in the file; [`ModelConfig::api_key_env`]
//! names the environment variable it is read from.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    pub model: ModelConfig,
    pub generation: GenerationConfig,
}

impl ScribeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid for the schema
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns the first out-of-range field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "model.max_tokens",
                reason: "must be positive".into(),
            });
        }
        for (field, value) in [
            ("model.doc_temperature", self.model.doc_temperature),
            ("model.test_temperature", self.model.test_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is outside 0.0..=2.0"),
                });
            }
        }
        Ok(())
    }

    /// With retry budget
    #[inline]
    #[must_use]
    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.generation.retry_budget = budget;
        self
    }

    /// With per-object test root
    #[inline]
    #[must_use]
    pub fn with_test_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.generation.test_root = root.into();
        self
    }

    /// With repository explanation
    #[inline]
    #[must_use]
    pub fn with_repo_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.generation.repo_explanation = explanation.into();
        self
    }

    /// Parameters for documentation requests
    #[inline]
    #[must_use]
    pub fn doc_params(&self) -> ModelParams {
        ModelParams {
            max_tokens: self.model.max_tokens,
            temperature: self.model.doc_temperature,
        }
    }

    /// Parameters for test requests
    #[inline]
    #[must_use]
    pub fn test_params(&self) -> ModelParams {
        ModelParams {
            max_tokens: self.model.max_tokens,
            temperature: self.model.test_temperature,
        }
    }
}

/// Which chat-completions dialect to speak
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    #[default]
    OpenAi,
    Azure,
}

/// Model service settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub flavor: ApiFlavor,
    pub api_base: String,
    /// Azure only
    pub api_version: String,
    /// Azure deployment name
    pub engine: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub max_tokens: u32,
    pub doc_temperature: f32,
    pub test_temperature: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            flavor: ApiFlavor::OpenAi,
            api_base: "https://api.openai.com/v1".to_string(),
            api_version: "2023-03-15-preview".to_string(),
            engine: "GPT4".to_string(),
            model: "gpt-4".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 1000,
            doc_temperature: 0.2,
            test_temperature: 0.4,
        }
    }
}

/// Prompt and output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Documentation tool named in prompts
    pub doc_package: String,
    /// Unit-test framework named in prompts
    pub unit_test_package: String,
    pub platform: String,
    /// Free-form description of the repository
    pub repo_explanation: String,
    pub retry_budget: u32,
    /// Directory for per-object test files
    pub test_root: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            doc_package: "sphinx".to_string(),
            unit_test_package: "pytest".to_string(),
            platform: "Python 3.9".to_string(),
            repo_explanation: String::new(),
            retry_budget: 2,
            test_root: PathBuf::from("test_code/unit_test"),
        }
    }
}

/// Per-request sampling parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ScribeConfig::from_toml_str("").unwrap();
        assert_eq!(config, ScribeConfig::default());
        assert_eq!(config.generation.retry_budget, 2);
        assert_eq!(config.model.flavor, ApiFlavor::OpenAi);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ScribeConfig::from_toml_str(
            r#"
            [model]
            flavor = "azure"
            api_base = "https://example.openai.azure.com"

            [generation]
            unit_test_package = "unittest"
            retry_budget = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.model.flavor, ApiFlavor::Azure);
        assert_eq!(config.model.engine, "GPT4");
        assert_eq!(config.generation.unit_test_package, "unittest");
        assert_eq!(config.generation.retry_budget, 0);
        assert_eq!(config.generation.doc_package, "sphinx");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = ScribeConfig::from_toml_str("[model]\nmax_tokens = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "model.max_tokens", .. }));

        let err = ScribeConfig::from_toml_str("[model]\ntest_temperature = 3.5\n").unwrap_err();
        assert!(err.to_string().contains("model.test_temperature"));
    }

    #[test]
    fn unknown_flavor_is_a_parse_error() {
        let err = ScribeConfig::from_toml_str("[model]\nflavor = \"bard\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builders_and_params() {
        let config = ScribeConfig::new()
            .with_retry_budget(5)
            .with_test_root("out/tests")
            .with_repo_explanation("a billing service");

        assert_eq!(config.generation.retry_budget, 5);
        assert_eq!(config.generation.test_root, PathBuf::from("out/tests"));
        assert_eq!(config.doc_params().temperature, 0.2);
        assert_eq!(config.test_params().max_tokens, 1000);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scribe.toml");
        std::fs::write(&path, "[generation]\nplatform = \"Python 3.12\"\n").unwrap();

        let config = ScribeConfig::load(&path).unwrap();
        assert_eq!(config.generation.platform, "Python 3.12");

        let missing = ScribeConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
