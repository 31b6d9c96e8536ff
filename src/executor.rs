use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::AppError;
use crate::models::{DeletionOutcome, PackageTarget, VersionId};

/// Deletes a single package version.
pub trait VersionDeleter: Clone + Send + Sync + 'static {
    fn delete_version(
        &self,
        target: &PackageTarget,
        id: &VersionId,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Delete every id, at most `concurrency` at a time.
///
/// Each delete is independent: a failure is recorded in its outcome and the
/// remaining deletes still run. Outcomes come back in the order of `ids`.
pub async fn delete_all<D: VersionDeleter>(
    deleter: &D,
    target: &PackageTarget,
    ids: &[VersionId],
    concurrency: usize,
) -> Vec<DeletionOutcome> {
    if ids.is_empty() {
        return Vec::new();
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut handles = Vec::with_capacity(ids.len());

    for id in ids {
        let semaphore = semaphore.clone();
        let deleter = deleter.clone();
        let target = target.clone();
        let id = id.clone();

        handles.push(tokio::spawn(async move {
            // The semaphore is never closed
            let _permit = semaphore.acquire_owned().await.ok();
            deleter.delete_version(&target, &id).await
        }));
    }

    let mut outcomes = Vec::with_capacity(ids.len());
    for (id, handle) in ids.iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => Err(AppError::Delete {
                id: id.to_string(),
                detail: format!("delete task failed: {}", e),
            }),
        };

        match result {
            Ok(()) => {
                tracing::debug!(package = %target.package_name, id = %id, "deleted version");
                outcomes.push(DeletionOutcome {
                    id: id.clone(),
                    succeeded: true,
                    error: None,
                });
            }
            Err(e) => {
                tracing::error!(package = %target.package_name, id = %id, error = %e, "version not deleted");
                outcomes.push(DeletionOutcome {
                    id: id.clone(),
                    succeeded: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    outcomes
}
