use crate::domain::ports::ProgressObserver;

/// Writes fan-out progress to the log (stderr).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn started(&self, total: usize) {
        tracing::info!("submitting audits for {} requests...", total);
    }

    fn attempt_failed(&self, key: &str, attempt: u32, error: &str) {
        tracing::warn!("{} audit failed...", key);
        tracing::debug!("{}: attempt {} failed: {}", key, attempt, error);
    }

    fn unit_finished(&self, completed: usize, total: usize) {
        tracing::info!(
            "completed {}/{} ({}%)",
            completed,
            total,
            percent(completed, total)
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressObserver for SilentProgress {
    fn unit_finished(&self, _completed: usize, _total: usize) {}
}

fn percent(completed: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as usize
}
