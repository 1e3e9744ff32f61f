pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod investments;
pub(crate) mod transactions;

use crate::errors::AppError;

/// Runs a service call on tokio's blocking pool. Store writes hold the store
/// lock across file I/O, and password hashing is CPU bound; neither may run
/// on a runtime worker.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("blocking task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocking_passes_results_through() {
        assert_eq!(blocking(|| Ok(7)).await.unwrap(), 7);

        let err = blocking::<(), _>(|| Err(AppError::Unauthorized)).await;
        assert!(matches!(err, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_blocking_turns_a_panic_into_an_internal_error() {
        let err = blocking::<(), _>(|| panic!("boom")).await;
        assert!(matches!(err, Err(AppError::Internal(_))));
    }
}
