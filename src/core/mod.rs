pub mod audit;
pub mod executor;
pub mod fanout;
pub mod progress;
pub mod request;
pub mod split;
pub mod unify;

pub use crate::domain::model::{
    Advisory, AuditReport, AuditRequest, DepResult, DepResults, Finding, LockVerification,
    LockfileKind, PackageFinding, ProjectFiles, Severity, SeverityBuckets, UnifiedReport,
};
pub use crate::domain::ports::{
    AuditSubmitter, ConfigProvider, LockVerifier, ProgressObserver, ProjectReader,
};
pub use crate::utils::error::Result;
