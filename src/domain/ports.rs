use crate::domain::model::{AuditReport, AuditRequest, LockVerification, ProjectFiles};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Locates and parses the manifest and lockfile of one project.
pub trait ProjectReader: Send + Sync {
    fn read_project(&self) -> impl std::future::Future<Output = Result<ProjectFiles>> + Send;
}

/// Checks that the lockfile satisfies what the manifest declares.
pub trait LockVerifier: Send + Sync {
    fn verify(&self, project: &ProjectFiles) -> LockVerification;
}

/// The external advisory oracle: submits one audit request, returns its report.
#[async_trait]
pub trait AuditSubmitter: Send + Sync {
    async fn submit(&self, request: &AuditRequest) -> Result<AuditReport>;
}

/// Receives progress signals from the fan-out. Never affects results.
pub trait ProgressObserver: Send + Sync {
    fn started(&self, _total: usize) {}

    fn attempt_failed(&self, _key: &str, _attempt: u32, _error: &str) {}

    fn unit_finished(&self, completed: usize, total: usize);
}

pub trait ConfigProvider: Send + Sync {
    fn registry_url(&self) -> &str;
    fn concurrency(&self) -> usize;
    fn retries(&self) -> u32;
    fn retry_delay(&self) -> Duration;
    fn request_timeout(&self) -> Duration;
}
