//! Asynchronous fetch boundary. Screen mounts go through a `Loader`,
//! which models the backend round-trip: an artificial latency followed
//! by the fetch itself, bounded by a timeout. A fetch that overruns the
//! timeout surfaces as `AdminError::LoadFailure` so screens can offer a
//! retry instead of hanging on a spinner.

use crate::services::{AdminError, ServiceResult};
use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct Loader {
    timeout: Duration,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl Loader {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn fetch<T, F>(&self, latency: Duration, op: F) -> ServiceResult<T>
    where
        F: FnOnce() -> ServiceResult<T>,
    {
        let work = async {
            tokio::time::sleep(latency).await;
            op()
        };
        match tokio::time::timeout(self.timeout, work).await {
            Ok(result) => result,
            Err(_) => Err(AdminError::LoadFailure(format!(
                "fetch timed out after {}ms",
                self.timeout.as_millis()
            ))),
        }
    }
}
