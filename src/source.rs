use std::future::Future;

use crate::error::AppError;
use crate::models::{PackageTarget, VersionRecord};
use crate::orchestrator::RunStats;
use crate::selector::RATE_LIMIT;

/// Upper bound on pages fetched for one package.
pub const MAX_PAGES: u32 = 1_000;

/// One page of versions.
#[derive(Debug)]
pub struct VersionPage {
    pub records: Vec<VersionRecord>,
    /// A full page may continue; a short page is the last one.
    pub has_more: bool,
}

/// Page-numbered listing of package versions.
pub trait VersionSource {
    fn fetch_page(
        &self,
        target: &PackageTarget,
        page_size: usize,
        page: u32,
    ) -> impl Future<Output = Result<VersionPage, AppError>> + Send;
}

/// Fetch every page of versions for a package.
///
/// Pages are requested one after another starting at 1 until a page comes
/// back short. Any failed page fails the whole collection, so callers never
/// decide deletions from a partial listing.
pub async fn collect_all<S: VersionSource>(
    source: &S,
    target: &PackageTarget,
    page_size: usize,
    stats: &mut RunStats,
) -> Result<Vec<VersionRecord>, AppError> {
    let page_size = page_size.clamp(1, RATE_LIMIT);
    let mut records = Vec::new();

    for page in 1..=MAX_PAGES {
        let result = source.fetch_page(target, page_size, page).await?;

        stats.pages_fetched += 1;
        stats.versions_fetched += result.records.len();
        tracing::debug!(
            package = %target.package_name,
            page,
            count = result.records.len(),
            has_more = result.has_more,
            "fetched version page"
        );

        records.extend(result.records);
        if !result.has_more {
            return Ok(records);
        }
    }

    Err(AppError::Fetch(format!(
        "get versions API failed. {} still has versions after {} pages; refusing to continue",
        target.package_name, MAX_PAGES
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OwnerKind, PackageType, VersionId};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    struct FakeSource {
        total: usize,
        fail_on_page: Option<u32>,
        requests: Mutex<Vec<(usize, u32)>>,
    }

    impl FakeSource {
        fn new(total: usize) -> Self {
            Self {
                total,
                fail_on_page: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(usize, u32)> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl VersionSource for FakeSource {
        async fn fetch_page(
            &self,
            _target: &PackageTarget,
            page_size: usize,
            page: u32,
        ) -> Result<VersionPage, AppError> {
            self.requests.lock().unwrap().push((page_size, page));
            if self.fail_on_page == Some(page) {
                return Err(AppError::Fetch("get versions API failed. boom".to_string()));
            }

            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let start = (page as usize - 1) * page_size;
            let end = (start + page_size).min(self.total.max(start));
            let records: Vec<VersionRecord> = (start..end)
                .map(|i| VersionRecord {
                    id: VersionId::Numeric(i as u64 + 1),
                    label: format!("{}.0.0", i + 1),
                    created_at: base + Duration::minutes(i as i64),
                    tagged: false,
                    tags: Vec::new(),
                })
                .collect();

            Ok(VersionPage {
                has_more: records.len() == page_size,
                records,
            })
        }
    }

    fn target() -> PackageTarget {
        PackageTarget {
            owner: "test-owner".to_string(),
            owner_kind: OwnerKind::User,
            package_type: PackageType::Npm,
            package_name: "test-package".to_string(),
        }
    }

    #[tokio::test]
    async fn test_collects_until_short_page() {
        let source = FakeSource::new(250);
        let mut stats = RunStats::default();

        let records = collect_all(&source, &target(), RATE_LIMIT, &mut stats)
            .await
            .unwrap();

        assert_eq!(records.len(), 250);
        assert_eq!(source.requests(), vec![(100, 1), (100, 2), (100, 3)]);
        assert_eq!(stats.pages_fetched, 3);
        assert_eq!(stats.versions_fetched, 250);
    }

    #[tokio::test]
    async fn test_full_pages_need_an_empty_terminating_page() {
        let source = FakeSource::new(200);
        let mut stats = RunStats::default();

        let records = collect_all(&source, &target(), RATE_LIMIT, &mut stats)
            .await
            .unwrap();

        assert_eq!(records.len(), 200);
        assert_eq!(source.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_page_size_clamped_to_rate_limit() {
        let source = FakeSource::new(10);
        let mut stats = RunStats::default();

        collect_all(&source, &target(), 500, &mut stats).await.unwrap();

        assert_eq!(source.requests(), vec![(RATE_LIMIT, 1)]);
    }

    #[tokio::test]
    async fn test_failed_page_fails_everything() {
        let mut source = FakeSource::new(300);
        source.fail_on_page = Some(2);
        let mut stats = RunStats::default();

        let err = collect_all(&source, &target(), RATE_LIMIT, &mut stats)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch(_)));
        assert_eq!(source.requests().len(), 2);
        assert_eq!(stats.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_stops_at_page_cap() {
        let source = FakeSource::new(usize::MAX / 2);
        let mut stats = RunStats::default();

        let err = collect_all(&source, &target(), 1, &mut stats)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Fetch(_)));
        assert_eq!(stats.pages_fetched, MAX_PAGES as usize);
    }
}
