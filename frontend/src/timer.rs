// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use tokio::runtime::Handle;
use tokio::time::{self, Duration};
use tracing::warn;

/// Runs `job` once after `delay` on the current tokio runtime.
///
/// There is no way to cancel it; jobs must tolerate the page having changed
/// in the meantime. Without a runtime the job runs immediately.
pub fn after<F>(delay: Duration, job: F)
where
    F: FnOnce() + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                time::sleep(delay).await;
                job();
            });
        }
        Err(_) => {
            warn!("No runtime available for a delayed job, running it now.");
            job();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_job_runs_after_delay() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        after(Duration::from_millis(300), move || flag.store(true, Ordering::SeqCst));

        time::sleep(Duration::from_millis(299)).await;
        assert!(!fired.load(Ordering::SeqCst));
        time::sleep(Duration::from_millis(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[test]
    fn test_job_runs_inline_without_runtime() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        after(Duration::from_secs(60), move || flag.store(true, Ordering::SeqCst));

        assert!(fired.load(Ordering::SeqCst));
    }
}
