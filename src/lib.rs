pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{LocalProject, LockfileVerifier, RegistryClient};
pub use config::AuditSettings;
pub use core::{
    audit::AuditEngine,
    executor::{BoundedRetryExecutor, RetryPolicy, UnitOfWork},
    fanout::AuditFanOut,
    progress::{SilentProgress, TracingProgress},
    split::split,
    unify::unify,
};
pub use domain::model::{AuditReport, AuditRequest, DepResult, Severity, UnifiedReport};
pub use utils::error::{AuditError, Result};
