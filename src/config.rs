use crate::cli::Cli;
use crate::error::AppError;
use crate::filter::PackageNameFilter;
use crate::models::{OwnerKind, PackageTarget, PackageType};
use crate::policy::RetentionPolicy;

/// Which packages a run operates on
#[derive(Debug)]
pub enum PackageSelection {
    Single(String),
    Matching(PackageNameFilter),
}

/// Everything a run needs, validated
#[derive(Debug)]
pub struct RunConfig {
    pub token: String,
    pub owner: String,
    pub owner_kind: OwnerKind,
    pub package_type: PackageType,
    pub packages: PackageSelection,
    pub policy: RetentionPolicy,
    pub protect_platform_images: bool,
    pub concurrency: usize,
    pub dry_run: bool,
}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        let package_type = cli
            .package_type
            .ok_or_else(|| AppError::invalid("--package-type is required"))?;

        let packages = match (non_empty(&cli.package_name), non_empty(&cli.package_names)) {
            (Some(name), None) => PackageSelection::Single(name.to_string()),
            (None, Some(names)) => {
                let filter = PackageNameFilter::parse(names)?;
                if filter.is_empty() {
                    return Err(AppError::invalid("--package-names contains no names"));
                }
                PackageSelection::Matching(filter)
            }
            (Some(_), Some(_)) => {
                return Err(AppError::invalid(
                    "--package-name and --package-names cannot be used together",
                ))
            }
            (None, None) => {
                return Err(AppError::invalid(
                    "--package-name or --package-names is required",
                ))
            }
        };

        let policy = RetentionPolicy::from_args(&cli.policy, package_type)?;
        if !policy.explicit_ids.is_empty() && matches!(packages, PackageSelection::Matching(_)) {
            return Err(AppError::invalid(
                "--package-version-ids requires a single --package-name",
            ));
        }

        let mut protect_platform_images = cli.protect_platform_images;
        if protect_platform_images && !package_type.is_container() {
            tracing::warn!(
                package_type = %package_type,
                "--protect-platform-images only applies to container packages; ignoring it"
            );
            protect_platform_images = false;
        }

        let config = Self {
            token: cli.token.trim().to_string(),
            owner: cli.owner.trim().to_string(),
            owner_kind: cli.owner_kind,
            package_type,
            packages,
            policy,
            protect_platform_images,
            concurrency: usize::from(cli.concurrency),
            dry_run: cli.dry_run,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that lack credentials or package identity.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.token.is_empty() {
            return Err(AppError::invalid("no token found; pass --token or set GITHUB_TOKEN"));
        }
        if self.owner.is_empty() {
            return Err(AppError::invalid("--owner is required"));
        }
        if let PackageSelection::Single(name) = &self.packages {
            if name.trim().is_empty() {
                return Err(AppError::invalid("--package-name is required"));
            }
        }
        Ok(())
    }

    pub fn target(&self, package_name: &str) -> PackageTarget {
        PackageTarget {
            owner: self.owner.clone(),
            owner_kind: self.owner_kind,
            package_type: self.package_type,
            package_name: package_name.to_string(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RetentionMode;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Result<RunConfig, AppError> {
        let mut argv = vec!["pkgprune", "--token", "test-token", "--owner", "test-owner"];
        argv.extend_from_slice(extra);
        RunConfig::from_cli(&Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_single_package() {
        let config = parse(&["--package-name", "pkg", "--package-type", "npm"]).unwrap();

        assert!(matches!(config.packages, PackageSelection::Single(ref n) if n == "pkg"));
        assert_eq!(config.policy.mode, RetentionMode::DeleteOldest(1));
        assert_eq!(config.concurrency, 10);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_missing_package_type() {
        let err = parse(&["--package-name", "pkg"]).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_missing_package_name() {
        for extra in [
            vec!["--package-type", "npm"],
            vec!["--package-type", "npm", "--package-name", "  "],
        ] {
            let err = parse(&extra).unwrap_err();
            assert!(matches!(err, AppError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_name_and_names_conflict() {
        let err = parse(&[
            "--package-type",
            "npm",
            "--package-name",
            "a",
            "--package-names",
            "b*",
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_explicit_ids_need_single_package() {
        let err = parse(&[
            "--package-type",
            "npm",
            "--package-names",
            "b*",
            "--package-version-ids",
            "1,2",
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_conflicting_policy_is_rejected() {
        let err = parse(&[
            "--package-type",
            "npm",
            "--package-name",
            "pkg",
            "--num-old-versions-to-delete",
            "3",
            "--min-versions-to-keep",
            "2",
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_negative_counts_parse() {
        let config = parse(&[
            "--package-type",
            "npm",
            "--package-name",
            "pkg",
            "--num-old-versions-to-delete",
            "-1",
        ])
        .unwrap();
        assert!(config.policy.is_noop());
    }

    #[test]
    fn test_platform_protection_only_for_containers() {
        let npm = parse(&[
            "--package-type",
            "npm",
            "--package-name",
            "pkg",
            "--protect-platform-images",
        ])
        .unwrap();
        assert!(!npm.protect_platform_images);

        let container = parse(&[
            "--package-type",
            "container",
            "--package-name",
            "app",
            "--protect-platform-images",
        ])
        .unwrap();
        assert!(container.protect_platform_images);
    }

    #[test]
    fn test_missing_token_and_owner() {
        let mut config = parse(&["--package-type", "npm", "--package-name", "pkg"]).unwrap();
        config.token.clear();
        assert!(matches!(config.validate(), Err(AppError::InvalidInput(_))));

        let mut config = parse(&["--package-type", "npm", "--package-name", "pkg"]).unwrap();
        config.owner.clear();
        assert!(matches!(config.validate(), Err(AppError::InvalidInput(_))));
    }
}
