pub mod backend;
pub mod booking_store;
pub mod directory;
pub mod memory;
pub mod rows;
pub mod seed;
pub mod snapshot;

use std::future::Future;

use tokio::time::{timeout, Duration};

use crate::error::AppError;
use crate::store::backend::BackendResult;

/// Runs one backend call under `limit`. Backend failures and timeouts both
/// come back as [`AppError`]; nothing is retried.
pub async fn guarded<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T, AppError>
where
    F: Future<Output = BackendResult<T>>,
{
    match timeout(limit, call).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Persistence(format!(
            "{operation} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}
