use crate::utils::error::{AuditError, Result};
use crate::utils::validation::{validate_header_name, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Optional settings file. Every field may be left out; command line flags
/// take precedence over whatever is set here.
///
/// ```toml
/// [registry]
/// url = "https://registry.example.com/"
/// timeout_seconds = 30
///
/// [registry.headers]
/// Authorization = "Bearer ${NPM_TOKEN}"
///
/// [fanout]
/// concurrency = 20
/// retries = 2
/// retry_delay_ms = 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub registry: RegistrySection,
    #[serde(default)]
    pub fanout: FanOutSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrySection {
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FanOutSection {
    pub concurrency: Option<usize>,
    pub retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AuditError::ConfigError {
            message: format!("Cannot read {}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| AuditError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

impl Validate for FileConfig {
    fn validate(&self) -> Result<()> {
        for name in self.registry.headers.keys() {
            validate_header_name("registry.headers", name)?;
        }
        Ok(())
    }
}

/// Replaces `${VAR}` with the value of the environment variable. Unset
/// variables are left as written.
fn substitute_env_vars(content: &str) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let re = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    });

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_file() {
        let config = FileConfig::from_toml_str(
            r#"
            [registry]
            url = "http://localhost:4873/"
            timeout_seconds = 10

            [registry.headers]
            Authorization = "Bearer abc"

            [fanout]
            concurrency = 8
            retries = 4
            retry_delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.url.as_deref(), Some("http://localhost:4873/"));
        assert_eq!(config.registry.headers["Authorization"], "Bearer abc");
        assert_eq!(config.fanout.concurrency, Some(8));
        assert_eq!(config.fanout.retries, Some(4));
        assert_eq!(config.fanout.retry_delay_ms, Some(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config = FileConfig::from_toml_str("").unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = FileConfig::from_toml_str("[fanout]\nparallelism = 3\n").unwrap_err();
        assert!(matches!(err, AuditError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SPLIT_AUDIT_TEST_TOKEN", "t0k3n");
        let config = FileConfig::from_toml_str(
            "[registry.headers]\nAuthorization = \"Bearer ${SPLIT_AUDIT_TEST_TOKEN}\"\n",
        )
        .unwrap();
        assert_eq!(config.registry.headers["Authorization"], "Bearer t0k3n");

        let untouched = substitute_env_vars("${SPLIT_AUDIT_SURELY_UNSET_VAR}");
        assert_eq!(untouched, "${SPLIT_AUDIT_SURELY_UNSET_VAR}");
    }

    #[test]
    fn test_bad_header_name_fails_validation() {
        let config =
            FileConfig::from_toml_str("[registry.headers]\n\"bad header\" = \"x\"\n").unwrap();
        assert!(config.validate().is_err());
    }
}
