use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("No package.json found in {path}: Cannot audit a project without a package.json")]
    NoManifest { path: String },

    #[error("Neither npm-shrinkwrap.json nor package-lock.json found in {path}: Cannot audit a project without a lockfile")]
    NoLockfile { path: String },

    #[error("Errors were found in your {lockfile}, run  npm install  to fix them.\n    {}", .errors.join("\n    "))]
    LockVerificationFailed {
        lockfile: String,
        errors: Vec<String>,
    },

    #[error("Failed to parse {file}: {source}")]
    JsonParse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Registry responded with status {status}: {body}")]
    RegistryStatus { status: u16, body: String },

    #[error("Registry response is not an audit report: {message}")]
    InvalidResponse { message: String },

    #[error("Cannot read {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Project,
    Network,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl AuditError {
    /// Stable, machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            AuditError::NoManifest { .. } => "EAUDITNOPJSON",
            AuditError::NoLockfile { .. } => "EAUDITNOLOCK",
            AuditError::LockVerificationFailed { .. } => "ELOCKVERIFY",
            AuditError::JsonParse { .. } => "EJSONPARSE",
            AuditError::ApiError(_) => "EAUDITREQUEST",
            AuditError::RegistryStatus { .. } => "EAUDITSTATUS",
            AuditError::InvalidResponse { .. } => "EAUDITRESPONSE",
            AuditError::ReadError { .. } => "EIO",
            AuditError::SerializationError(_) => "ESERIALIZE",
            AuditError::ConfigError { .. }
            | AuditError::ConfigValidationError { .. }
            | AuditError::InvalidConfigValueError { .. } => "ECONFIG",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AuditError::NoManifest { .. }
            | AuditError::NoLockfile { .. }
            | AuditError::LockVerificationFailed { .. }
            | AuditError::JsonParse { .. } => ErrorCategory::Project,
            AuditError::ApiError(_)
            | AuditError::RegistryStatus { .. }
            | AuditError::InvalidResponse { .. } => ErrorCategory::Network,
            AuditError::ConfigError { .. }
            | AuditError::ConfigValidationError { .. }
            | AuditError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            AuditError::ReadError { .. } | AuditError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Project | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            AuditError::NoManifest { .. } => {
                "Run the audit from the project root or pass --prefix <dir>"
            }
            AuditError::NoLockfile { .. } => {
                "Run `npm install` to generate a package-lock.json"
            }
            AuditError::LockVerificationFailed { .. } => {
                "Run `npm install` so the lockfile matches package.json"
            }
            AuditError::JsonParse { .. } => "Fix the JSON syntax of the file named above",
            AuditError::ApiError(_) | AuditError::RegistryStatus { .. } => {
                "Check network access to the registry and retry later"
            }
            AuditError::InvalidResponse { .. } => {
                "Make sure --registry points at a registry that implements the audit endpoint"
            }
            AuditError::ReadError { .. } => "Check file permissions for the project directory",
            AuditError::SerializationError(_) => "Report this as a bug",
            AuditError::ConfigError { .. }
            | AuditError::ConfigValidationError { .. }
            | AuditError::InvalidConfigValueError { .. } => {
                "Check the command line flags and the settings file"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_verification_message_lists_every_error() {
        let err = AuditError::LockVerificationFailed {
            lockfile: "package-lock.json".to_string(),
            errors: vec![
                "Missing: lodash@^4.17.0".to_string(),
                "Missing: chalk@^2.0.0".to_string(),
            ],
        };

        let message = err.to_string();
        assert!(message.starts_with("Errors were found in your package-lock.json"));
        assert!(message.contains("\n    Missing: lodash@^4.17.0\n    Missing: chalk@^2.0.0"));
        assert_eq!(err.code(), "ELOCKVERIFY");
    }

    #[test]
    fn test_error_categories() {
        let err = AuditError::NoLockfile {
            path: "/tmp/app".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Project);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().starts_with("[EAUDITNOLOCK]"));

        let err = AuditError::RegistryStatus {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_read_error_names_the_file() {
        let err = AuditError::ReadError {
            path: "/srv/app/package.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.code(), "EIO");
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.to_string().contains("/srv/app/package.json"));
    }
}
