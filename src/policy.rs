use regex::Regex;

use crate::cli::PolicyArgs;
use crate::error::AppError;
use crate::models::{PackageType, VersionId};

/// Matches plain numeric releases such as `1`, `1.2` or `10.0.3`.
/// Pre-release-only mode ignores everything this matches.
pub const RELEASE_PATTERN: &str = r"^(0|[1-9]\d*)((\.(0|[1-9]\d*))*)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionMode {
    /// Delete up to N of the oldest candidates
    DeleteOldest(usize),
    /// Keep the N newest candidates, delete the rest
    KeepNewest(usize),
}

/// Validated retention rules for one run.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    pub explicit_ids: Vec<VersionId>,
    pub mode: RetentionMode,
    pub ignore: Option<Regex>,
    pub delete_only_untagged: bool,
    pub match_tags: bool,
}

impl RetentionPolicy {
    /// Normalize raw flags into a policy.
    ///
    /// Pre-release-only and untagged-only are expressed through the generic
    /// keep-count and ignore-pattern rules here, so selection never has to
    /// know about them.
    pub fn from_args(args: &PolicyArgs, package_type: PackageType) -> Result<Self, AppError> {
        let mut untagged_only = args.delete_only_untagged_versions;
        if untagged_only && !package_type.is_container() {
            tracing::warn!(
                package_type = %package_type,
                "--delete-only-untagged-versions only applies to container packages; ignoring it"
            );
            untagged_only = false;
        }

        let num_old = args.num_old_versions_to_delete;
        let mut min_keep = args.min_versions_to_keep;

        if num_old > 1
            && (min_keep >= 0 || args.delete_only_pre_release_versions || untagged_only)
        {
            return Err(AppError::invalid(
                "--num-old-versions-to-delete cannot be combined with --min-versions-to-keep, \
                 --delete-only-pre-release-versions or --delete-only-untagged-versions",
            ));
        }

        let mut ignore = compile_ignore(&args.ignore_versions)?;

        if args.delete_only_pre_release_versions {
            if ignore.is_some() {
                tracing::warn!(
                    pattern = %args.ignore_versions,
                    "--ignore-versions is replaced by the release pattern in pre-release-only mode"
                );
            }
            ignore = Some(Regex::new(RELEASE_PATTERN)?);
            min_keep = min_keep.max(0);
        }

        if untagged_only {
            min_keep = min_keep.max(0);
        }

        let mode = if min_keep >= 0 {
            RetentionMode::KeepNewest(min_keep as usize)
        } else {
            RetentionMode::DeleteOldest(num_old.max(0) as usize)
        };

        Ok(Self {
            explicit_ids: parse_ids(&args.package_version_ids),
            mode,
            ignore,
            delete_only_untagged: untagged_only,
            match_tags: args.match_tags,
        })
    }

    /// True when the policy can only ever delete nothing.
    pub fn is_noop(&self) -> bool {
        self.explicit_ids.is_empty() && self.mode == RetentionMode::DeleteOldest(0)
    }
}

fn compile_ignore(pattern: &str) -> Result<Option<Regex>, AppError> {
    if pattern.is_empty() {
        return Ok(None);
    }
    Ok(Some(Regex::new(pattern)?))
}

/// Parse a comma-separated id list, dropping blank entries.
pub fn parse_ids(raw: &str) -> Vec<VersionId> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(VersionId::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> PolicyArgs {
        PolicyArgs {
            package_version_ids: String::new(),
            num_old_versions_to_delete: 1,
            min_versions_to_keep: -1,
            ignore_versions: String::new(),
            delete_only_pre_release_versions: false,
            delete_only_untagged_versions: false,
            match_tags: false,
        }
    }

    #[test]
    fn test_defaults_delete_one_oldest() {
        let policy = RetentionPolicy::from_args(&args(), PackageType::Npm).unwrap();
        assert_eq!(policy.mode, RetentionMode::DeleteOldest(1));
        assert!(policy.ignore.is_none());
        assert!(!policy.is_noop());
    }

    #[test]
    fn test_zero_or_negative_count_is_noop() {
        for n in [0, -5] {
            let mut a = args();
            a.num_old_versions_to_delete = n;
            let policy = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap();
            assert!(policy.is_noop(), "count {} should be a no-op", n);
        }
    }

    #[test]
    fn test_explicit_ids_are_never_noop() {
        let mut a = args();
        a.num_old_versions_to_delete = 0;
        a.package_version_ids = "123, 456,,789 ".to_string();
        let policy = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap();

        assert!(!policy.is_noop());
        assert_eq!(
            policy.explicit_ids,
            vec![
                VersionId::Numeric(123),
                VersionId::Numeric(456),
                VersionId::Numeric(789)
            ]
        );
    }

    #[test]
    fn test_keep_count_switches_mode() {
        let mut a = args();
        a.min_versions_to_keep = 10;
        let policy = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap();
        assert_eq!(policy.mode, RetentionMode::KeepNewest(10));
    }

    #[test]
    fn test_count_above_one_conflicts_with_keep_modes() {
        let mut with_keep = args();
        with_keep.num_old_versions_to_delete = 5;
        with_keep.min_versions_to_keep = 2;

        let mut with_pre_release = args();
        with_pre_release.num_old_versions_to_delete = 5;
        with_pre_release.delete_only_pre_release_versions = true;

        let mut with_untagged = args();
        with_untagged.num_old_versions_to_delete = 5;
        with_untagged.delete_only_untagged_versions = true;

        for a in [with_keep, with_pre_release, with_untagged] {
            let err = RetentionPolicy::from_args(&a, PackageType::Container).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_pre_release_sets_release_pattern_and_keep_floor() {
        let mut a = args();
        a.delete_only_pre_release_versions = true;
        a.ignore_versions = "^keep-me$".to_string();
        let policy = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap();

        assert_eq!(policy.mode, RetentionMode::KeepNewest(0));
        let ignore = policy.ignore.unwrap();
        assert!(ignore.is_match("1.2.3"));
        assert!(!ignore.is_match("1.2.3-alpha"));
        assert!(!ignore.is_match("keep-me"));
    }

    #[test]
    fn test_pre_release_keeps_explicit_keep_count() {
        let mut a = args();
        a.delete_only_pre_release_versions = true;
        a.min_versions_to_keep = 10;
        let policy = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap();
        assert_eq!(policy.mode, RetentionMode::KeepNewest(10));
    }

    #[test]
    fn test_untagged_only_is_container_specific() {
        let mut a = args();
        a.delete_only_untagged_versions = true;

        let container = RetentionPolicy::from_args(&a, PackageType::Container).unwrap();
        assert!(container.delete_only_untagged);
        assert_eq!(container.mode, RetentionMode::KeepNewest(0));

        let npm = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap();
        assert!(!npm.delete_only_untagged);
        assert_eq!(npm.mode, RetentionMode::DeleteOldest(1));
    }

    #[test]
    fn test_untagged_only_on_npm_does_not_conflict() {
        let mut a = args();
        a.delete_only_untagged_versions = true;
        a.num_old_versions_to_delete = 5;
        let policy = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap();
        assert_eq!(policy.mode, RetentionMode::DeleteOldest(5));
    }

    #[test]
    fn test_invalid_ignore_pattern() {
        let mut a = args();
        a.ignore_versions = "(".to_string();
        let err = RetentionPolicy::from_args(&a, PackageType::Npm).unwrap_err();
        assert!(matches!(err, AppError::InvalidPattern(_)));
    }
}
