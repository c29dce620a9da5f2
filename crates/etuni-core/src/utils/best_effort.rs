use std::fmt::Display;
use std::future::Future;

use tracing::{debug, warn};

/// Run a step whose failure must not stop the caller.
///
/// The error is logged under `label` and swallowed; the caller always gets
/// control back, with `Some(value)` only when the step succeeded.
pub async fn best_effort<T, E, F>(label: &str, step: F) -> Option<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match step.await {
        Ok(value) => {
            debug!(step = label, "Best-effort step succeeded");
            Some(value)
        }
        Err(e) => {
            warn!(step = label, error = %e, "Best-effort step failed, continuing");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_is_returned() {
        let result = best_effort("ok", async { Ok::<_, String>(5) }).await;
        assert_eq!(result, Some(5));
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let result = best_effort("fails", async { Err::<i32, _>("boom") }).await;
        assert_eq!(result, None);
    }
}
