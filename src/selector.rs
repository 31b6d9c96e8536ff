use crate::models::{VersionId, VersionRecord};
use crate::policy::{RetentionMode, RetentionPolicy};

/// Maximum page size and maximum number of deletions per run.
pub const RATE_LIMIT: usize = 100;

/// Decide which versions to delete, oldest first.
///
/// Explicit ids bypass every other rule. Otherwise the records are sorted by
/// creation time (ties by id), ignored and tagged records are dropped as the
/// policy requires, and the count comes from the retention mode. The keep
/// count of [`RetentionMode::KeepNewest`] applies to the remaining
/// candidates only. Never returns more than [`RATE_LIMIT`] ids.
pub fn select(records: Vec<VersionRecord>, policy: &RetentionPolicy) -> Vec<VersionId> {
    if !policy.explicit_ids.is_empty() {
        return policy
            .explicit_ids
            .iter()
            .take(RATE_LIMIT)
            .cloned()
            .collect();
    }

    let mut candidates = records;
    candidates.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });

    candidates.retain(|record| !is_ignored(record, policy));

    if policy.delete_only_untagged {
        candidates.retain(|record| !record.tagged);
    }

    let to_delete = match policy.mode {
        RetentionMode::KeepNewest(keep) => candidates.len().saturating_sub(keep),
        RetentionMode::DeleteOldest(count) => candidates.len().min(count),
    }
    .min(RATE_LIMIT);

    candidates
        .into_iter()
        .take(to_delete)
        .map(|record| record.id)
        .collect()
}

fn is_ignored(record: &VersionRecord, policy: &RetentionPolicy) -> bool {
    let Some(re) = &policy.ignore else {
        return false;
    };
    re.is_match(&record.label) || (policy.match_tags && record.tags.iter().any(|t| re.is_match(t)))
}
