use crate::core::executor::{BoundedRetryExecutor, UnitOfWork};
use crate::core::split::narrow;
use crate::domain::model::{AuditReport, AuditRequest, DepResult, DepResults};
use crate::domain::ports::AuditSubmitter;
use std::sync::Arc;

/// Submits one audit per top-level dependency and collects a terminal
/// result for each of them.
pub struct AuditFanOut<S: AuditSubmitter + 'static> {
    submitter: Arc<S>,
    executor: BoundedRetryExecutor,
}

impl<S: AuditSubmitter + 'static> AuditFanOut<S> {
    pub fn new(submitter: S, executor: BoundedRetryExecutor) -> Self {
        Self {
            submitter: Arc::new(submitter),
            executor,
        }
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Each unit narrows its own copy of `request` once it is admitted, so
    /// at most `concurrency` copies are alive at a time.
    pub async fn audit_each_dep(&self, request: &AuditRequest) -> DepResults {
        let shared = Arc::new(request.clone());
        let units: Vec<UnitOfWork<AuditReport>> = request
            .requires
            .keys()
            .map(|dep| {
                let submitter = Arc::clone(&self.submitter);
                let shared = Arc::clone(&shared);
                let name = dep.clone();
                UnitOfWork::new(dep.clone(), move || {
                    let submitter = Arc::clone(&submitter);
                    let shared = Arc::clone(&shared);
                    let name = name.clone();
                    async move {
                        let single = narrow(&shared, &name);
                        submitter.submit(&single).await
                    }
                })
            })
            .collect();

        tracing::debug!(
            "fanning out {} audits (concurrency {}, retries {})",
            units.len(),
            self.executor.concurrency(),
            self.executor.policy().retries
        );

        self.executor
            .run(units)
            .await
            .into_iter()
            .map(|(dep, outcome)| (dep, DepResult::from(outcome)))
            .collect()
    }
}
