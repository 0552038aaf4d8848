use crate::core::fanout::AuditFanOut;
use crate::core::request::{generate, RequestMetadata};
use crate::core::unify::unify;
use crate::core::{AuditRequest, AuditSubmitter, LockVerifier, ProjectReader, UnifiedReport};
use crate::utils::error::{AuditError, Result};
use crate::utils::monitor::SystemMonitor;

/// Drives one audit run: pre-flight checks, fan-out, aggregation.
pub struct AuditEngine<R: ProjectReader, V: LockVerifier, S: AuditSubmitter + 'static> {
    reader: R,
    verifier: V,
    fanout: AuditFanOut<S>,
    metadata: RequestMetadata,
    monitor: SystemMonitor,
}

impl<R: ProjectReader, V: LockVerifier, S: AuditSubmitter + 'static> AuditEngine<R, V, S> {
    pub fn new(reader: R, verifier: V, fanout: AuditFanOut<S>) -> Self {
        Self::new_with_monitoring(reader, verifier, fanout, false)
    }

    pub fn new_with_monitoring(
        reader: R,
        verifier: V,
        fanout: AuditFanOut<S>,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            reader,
            verifier,
            fanout,
            metadata: RequestMetadata::default(),
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn with_metadata(mut self, metadata: RequestMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Reads and verifies the project and builds the full audit request.
    /// Every fatal error surfaces here, before anything is submitted.
    pub async fn prepare(&self) -> Result<AuditRequest> {
        let project = self.reader.read_project().await?;
        tracing::debug!("Using lockfile {}", project.lockfile_kind.file_name());

        let verification = self.verifier.verify(&project);
        if !verification.status {
            return Err(AuditError::LockVerificationFailed {
                lockfile: project.lockfile_kind.file_name().to_string(),
                errors: verification.errors,
            });
        }

        let requires = project.requires();
        tracing::debug!("{} top-level dependencies declared", requires.len());
        Ok(generate(&project.lockfile, requires, &self.metadata))
    }

    pub async fn run(&self) -> Result<UnifiedReport> {
        tracing::info!("Starting audit...");
        self.monitor.log_stats("Start");

        let request = self.prepare().await?;
        self.monitor.log_stats("Prepared");

        let results = self.fanout.audit_each_dep(&request).await;
        self.monitor.log_stats("Fan-out");

        let report = unify(&results);
        tracing::info!(
            "Audit finished: {} vulnerable packages, {} dependencies could not be audited",
            report.finding_count(),
            report.errors.len()
        );
        self.monitor.log_final_stats();

        Ok(report)
    }
}
