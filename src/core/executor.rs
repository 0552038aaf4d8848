use crate::core::progress::SilentProgress;
use crate::domain::ports::{ConfigProvider, ProgressObserver};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 20;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

pub type UnitFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A retryable piece of async work keyed by a top-level dependency name.
///
/// `work` is called once per attempt, only after the unit holds a
/// concurrency slot, and must build a fresh future each time.
pub struct UnitOfWork<T> {
    key: String,
    work: Box<dyn Fn() -> UnitFuture<T> + Send + Sync>,
}

impl<T: Send + 'static> UnitOfWork<T> {
    pub fn new<F, Fut, E>(key: impl Into<String>, work: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: Display,
    {
        Self {
            key: key.into(),
            work: Box::new(move || {
                let attempt = work();
                Box::pin(async move { attempt.await.map_err(|e| e.to_string()) })
            }),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub retries: u32,
    /// Fixed wait between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Runs units of work with at most `concurrency` in flight, retrying each
/// one independently. A unit that exhausts its retries is recorded as an
/// `Err` for its key and never disturbs the others.
pub struct BoundedRetryExecutor {
    concurrency: usize,
    policy: RetryPolicy,
    observer: Arc<dyn ProgressObserver>,
}

impl BoundedRetryExecutor {
    pub fn new(concurrency: usize, policy: RetryPolicy) -> Self {
        Self {
            concurrency: concurrency.max(1),
            policy,
            observer: Arc::new(SilentProgress),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(
            config.concurrency(),
            RetryPolicy {
                retries: config.retries(),
                delay: config.retry_delay(),
            },
        )
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns exactly one entry per input unit.
    pub async fn run<T: Send + 'static>(
        &self,
        units: Vec<UnitOfWork<T>>,
    ) -> BTreeMap<String, Result<T, String>> {
        let total = units.len();
        self.observer.started(total);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let completed = Arc::new(AtomicUsize::new(0));
        let keys: Vec<String> = units.iter().map(|unit| unit.key.clone()).collect();
        let mut join_set = JoinSet::new();

        for unit in units {
            let semaphore = Arc::clone(&semaphore);
            let observer = Arc::clone(&self.observer);
            let completed = Arc::clone(&completed);
            let policy = self.policy;

            join_set.spawn(async move {
                let outcome = match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let outcome = run_with_retry(&unit, policy, observer.as_ref()).await;
                        drop(permit);
                        outcome
                    }
                    Err(e) => Err(format!("Failed to acquire concurrency slot: {}", e)),
                };

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                observer.unit_finished(done, total);
                (unit.key, outcome)
            });
        }

        let mut results = BTreeMap::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((key, outcome)) => {
                    results.insert(key, outcome);
                }
                Err(e) => {
                    tracing::error!("audit task did not complete: {}", e);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    self.observer.unit_finished(done, total);
                }
            }
        }

        for key in keys {
            results
                .entry(key)
                .or_insert_with(|| Err("audit task aborted before completion".to_string()));
        }

        results
    }
}

impl Default for BoundedRetryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY, RetryPolicy::default())
    }
}

async fn run_with_retry<T: Send + 'static>(
    unit: &UnitOfWork<T>,
    policy: RetryPolicy,
    observer: &dyn ProgressObserver,
) -> Result<T, String> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match (unit.work)().await {
            Ok(value) => return Ok(value),
            Err(message) => {
                observer.attempt_failed(&unit.key, attempt, &message);
                if attempt > policy.retries {
                    return Err(message);
                }
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
