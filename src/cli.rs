use clap::{Args, Parser};

use crate::models::{OwnerKind, PackageType};

/// pkgprune: retire old package versions from GitHub Packages
#[derive(Parser, Debug)]
#[command(name = "pkgprune", version, about)]
pub struct Cli {
    /// Token used to authenticate against the registry API
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, default_value = "")]
    pub token: String,

    /// REST API base URL (GitHub Enterprise Server: https://<host>/api/v3)
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Container registry used to inspect multi-platform image indexes
    #[arg(long, env = "PKGPRUNE_CONTAINER_REGISTRY", default_value = "https://ghcr.io")]
    pub container_registry_url: String,

    /// Owner of the package (user or organization login)
    #[arg(long, env = "GITHUB_REPOSITORY_OWNER", default_value = "")]
    pub owner: String,

    /// Whether the owner is a user or an organization
    #[arg(long, value_enum, default_value_t = OwnerKind::User)]
    pub owner_kind: OwnerKind,

    /// Name of the package to prune
    #[arg(long)]
    pub package_name: Option<String>,

    /// Comma-separated package names to prune; supports `*` wildcards and /regex/
    #[arg(long)]
    pub package_names: Option<String>,

    /// Type of the package
    #[arg(long, value_enum)]
    pub package_type: Option<PackageType>,

    #[command(flatten)]
    pub policy: PolicyArgs,

    /// Never delete per-platform images of a tagged multi-platform image (container only)
    #[arg(long, default_value_t = false)]
    pub protect_platform_images: bool,

    /// Maximum number of delete requests in flight
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: u16,

    /// Preview changes without deleting
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Retention rules, before normalization
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Comma-separated version ids to delete; bypasses every other rule
    #[arg(long, default_value = "")]
    pub package_version_ids: String,

    /// Number of oldest versions to delete
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub num_old_versions_to_delete: i64,

    /// Keep this many newest versions and delete the rest (negative disables)
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub min_versions_to_keep: i64,

    /// Regex of version names (and tags with --match-tags) that are never deleted
    #[arg(long, default_value = "")]
    pub ignore_versions: String,

    /// Only delete versions whose name is not a plain numeric release
    #[arg(long, default_value_t = false)]
    pub delete_only_pre_release_versions: bool,

    /// Only delete untagged versions (container only)
    #[arg(long, default_value_t = false)]
    pub delete_only_untagged_versions: bool,

    /// Also test --ignore-versions against each container tag
    #[arg(long, default_value_t = false)]
    pub match_tags: bool,
}
