use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::config::{PackageSelection, RunConfig};
use crate::error::AppError;
use crate::executor::delete_all;
use crate::manifest::{exclude_protected, ManifestClient};
use crate::models::{DeletionOutcome, PackageTarget, VersionId};
use crate::output::print_plan;
use crate::registry::RegistryClient;
use crate::selector::{select, RATE_LIMIT};
use crate::source::collect_all;

/// Counters for one run. Never shared between runs.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub pages_fetched: usize,
    pub versions_fetched: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// A version chosen for deletion. Explicit ids carry no metadata.
#[derive(Debug, Clone)]
pub struct PlannedDeletion {
    pub id: VersionId,
    pub label: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Versions to delete from one package
#[derive(Debug)]
pub struct PackagePlan {
    pub target: PackageTarget,
    pub to_delete: Vec<PlannedDeletion>,
}

#[derive(Debug)]
pub struct PackageReport {
    pub plan: PackagePlan,
    pub outcomes: Vec<DeletionOutcome>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub packages: Vec<PackageReport>,
    pub stats: RunStats,
    pub dry_run: bool,
}

impl RunReport {
    /// False if any delete failed.
    pub fn is_success(&self) -> bool {
        self.stats.failed == 0
    }

    pub fn planned(&self) -> usize {
        self.packages.iter().map(|p| p.plan.to_delete.len()).sum()
    }
}

/// Validates, selects and deletes.
pub struct Orchestrator<'a> {
    config: &'a RunConfig,
    client: &'a RegistryClient,
    manifests: Option<&'a ManifestClient>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a RunConfig,
        client: &'a RegistryClient,
        manifests: Option<&'a ManifestClient>,
    ) -> Self {
        Self {
            config,
            client,
            manifests,
        }
    }

    /// Run the retention job.
    ///
    /// Every package is planned before the first delete is issued, so a
    /// failed listing anywhere leaves the registry untouched.
    pub async fn run(&self) -> Result<RunReport, AppError> {
        self.config.validate()?;

        let mut report = RunReport {
            dry_run: self.config.dry_run,
            ..Default::default()
        };

        if self.config.policy.is_noop() {
            tracing::info!("number of old versions to delete is 0 or less; no versions will be deleted");
            return Ok(report);
        }

        let plans = self.plan(&mut report.stats).await?;

        for plan in plans {
            print_plan(&plan, self.config.dry_run);

            let outcomes = if self.config.dry_run {
                Vec::new()
            } else {
                let ids: Vec<VersionId> = plan.to_delete.iter().map(|p| p.id.clone()).collect();
                delete_all(self.client, &plan.target, &ids, self.config.concurrency).await
            };

            for outcome in &outcomes {
                if outcome.succeeded {
                    report.stats.deleted += 1;
                } else {
                    report.stats.failed += 1;
                }
            }

            report.packages.push(PackageReport { plan, outcomes });
        }

        Ok(report)
    }

    async fn plan(&self, stats: &mut RunStats) -> Result<Vec<PackagePlan>, AppError> {
        let names = self.package_names().await?;
        let mut plans = Vec::with_capacity(names.len());
        for name in names {
            plans.push(self.plan_package(self.config.target(&name), stats).await?);
        }
        Ok(plans)
    }

    async fn package_names(&self) -> Result<Vec<String>, AppError> {
        match &self.config.packages {
            PackageSelection::Single(name) => Ok(vec![name.clone()]),
            PackageSelection::Matching(filter) => {
                let all = self
                    .client
                    .list_packages(
                        self.config.owner_kind,
                        &self.config.owner,
                        self.config.package_type,
                    )
                    .await?;
                let matched: Vec<String> = all.into_iter().filter(|n| filter.matches(n)).collect();
                if matched.is_empty() {
                    tracing::warn!(owner = %self.config.owner, "no packages matched --package-names");
                }
                Ok(matched)
            }
        }
    }

    async fn plan_package(
        &self,
        target: PackageTarget,
        stats: &mut RunStats,
    ) -> Result<PackagePlan, AppError> {
        let policy = &self.config.policy;

        if !policy.explicit_ids.is_empty() {
            let to_delete = select(Vec::new(), policy)
                .into_iter()
                .map(|id| PlannedDeletion {
                    id,
                    label: None,
                    created_at: None,
                })
                .collect();
            return Ok(PackagePlan { target, to_delete });
        }

        let mut records = collect_all(self.client, &target, RATE_LIMIT, stats).await?;

        if self.config.protect_platform_images {
            if let Some(manifests) = self.manifests {
                let protected = manifests.protected_digests(&target, &records).await?;
                records = exclude_protected(records, &protected);
            }
        }

        let known: HashMap<VersionId, (String, DateTime<Utc>)> = records
            .iter()
            .map(|r| (r.id.clone(), (r.label.clone(), r.created_at)))
            .collect();

        let fetched = records.len();
        let to_delete: Vec<PlannedDeletion> = select(records, policy)
            .into_iter()
            .map(|id| {
                let (label, created_at) = match known.get(&id) {
                    Some((label, created)) => (Some(label.clone()), Some(*created)),
                    None => (None, None),
                };
                PlannedDeletion {
                    id,
                    label,
                    created_at,
                }
            })
            .collect();

        tracing::info!(
            package = %target.package_name,
            fetched,
            selected = to_delete.len(),
            "selected versions for deletion"
        );

        Ok(PackagePlan { target, to_delete })
    }
}
