use colored::Colorize;

use crate::orchestrator::{PackagePlan, PlannedDeletion, RunReport};

/// Print the versions selected for deletion in one package
pub fn print_plan(plan: &PackagePlan, dry_run: bool) {
    let header = if dry_run {
        format!(" {} ", "DRY RUN".yellow().bold())
    } else {
        String::new()
    };

    println!(
        "\n{}Package: {} ({}){}",
        header,
        plan.target.package_name.bold(),
        plan.target.package_type,
        if dry_run { " (no changes will be made)" } else { "" }
    );
    println!("{}", "─".repeat(60));

    if plan.to_delete.is_empty() {
        println!("  {}", "Nothing to delete.".green());
        return;
    }

    println!("  {} ({}):", "TO DELETE".red().bold(), plan.to_delete.len());
    for version in &plan.to_delete {
        print_version_line(version);
    }
}

fn print_version_line(version: &PlannedDeletion) {
    let label = version.label.as_deref().map(truncate_digest).unwrap_or("-");
    let created = match &version.created_at {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "unknown".to_string(),
    };

    println!(
        "    [{}] {:<12} {:<30} {}",
        "DELETE".red().bold(),
        version.id.to_string(),
        label,
        created.dimmed(),
    );
}

fn truncate_digest(label: &str) -> &str {
    if label.starts_with("sha256:") && label.len() > 19 {
        &label[..19]
    } else {
        label
    }
}

/// Print final summary
pub fn print_summary(report: &RunReport) {
    let failed = report.stats.failed;
    let failed_str = if failed > 0 {
        failed.to_string().red().bold().to_string()
    } else {
        failed.to_string()
    };

    println!("\n{}", "═".repeat(60));
    if report.dry_run {
        println!(
            "{} Would delete {} versions across {} packages ({} versions fetched)",
            "DRY RUN SUMMARY:".yellow().bold(),
            report.planned().to_string().red().bold(),
            report.packages.len(),
            report.stats.versions_fetched,
        );
    } else {
        println!(
            "{} Deleted {} versions across {} packages, {} errors ({} versions fetched)",
            "SUMMARY:".bold(),
            report.stats.deleted.to_string().red().bold(),
            report.packages.len(),
            failed_str,
            report.stats.versions_fetched,
        );
    }

    for package in &report.packages {
        for outcome in package.outcomes.iter().filter(|o| !o.succeeded) {
            println!(
                "  {} {} version {}: {}",
                "FAILED".red().bold(),
                package.plan.target.package_name,
                outcome.id,
                outcome.error.as_deref().unwrap_or("unknown error"),
            );
        }
    }
}
