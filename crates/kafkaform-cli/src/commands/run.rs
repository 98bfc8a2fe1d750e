//! Manifest runs against the configured cluster.

use std::path::PathBuf;

use anyhow::{bail, Result};
use kafkaform_client::InMemoryCluster;
use kafkaform_provisioner::{Manifest, Phase, Provisioner, RunReport};

use crate::output::{self, StatusRow};
use crate::OutputFormat;

/// Create or update every resource in a manifest
#[derive(Debug, clap::Args)]
pub struct ApplyCommand {
    /// Path to the manifest YAML file
    manifest: PathBuf,

    /// Apply against an empty in-memory cluster and show what would happen
    #[arg(long)]
    dry_run: bool,
}

/// Compare a manifest with what the cluster holds
#[derive(Debug, clap::Args)]
pub struct RefreshCommand {
    /// Path to the manifest YAML file
    manifest: PathBuf,
}

/// Delete every resource in a manifest
#[derive(Debug, clap::Args)]
pub struct DestroyCommand {
    /// Path to the manifest YAML file
    manifest: PathBuf,

    /// Skip confirmation
    #[arg(short, long)]
    yes: bool,
}

impl ApplyCommand {
    pub async fn execute(&self, provisioner: &Provisioner, format: OutputFormat) -> Result<()> {
        let manifest = Manifest::load(&self.manifest).await?;
        for notice in self.notices(manifest.resources.len(), format) {
            output::print_info(&notice);
        }

        let report = if self.dry_run {
            Provisioner::in_memory(InMemoryCluster::new()).apply(&manifest).await
        } else {
            provisioner.apply(&manifest).await
        };
        finish(&report, format, "apply")
    }

    /// Progress lines shown before the report. Structured formats get none.
    fn notices(&self, resources: usize, format: OutputFormat) -> Vec<String> {
        if !matches!(format, OutputFormat::Table) {
            return Vec::new();
        }
        let mut notices = vec![format!(
            "Loaded {resources} resource(s) from {}",
            self.manifest.display()
        )];
        if self.dry_run {
            notices.push("DRY RUN - applying against an empty in-memory cluster".to_string());
        }
        notices
    }
}

impl RefreshCommand {
    pub async fn execute(&self, provisioner: &Provisioner, format: OutputFormat) -> Result<()> {
        let manifest = Manifest::load(&self.manifest).await?;
        let report = provisioner.refresh(&manifest).await;

        let drifted = report.count(Phase::Drifted) + report.count(Phase::Missing);
        if drifted > 0 && matches!(format, OutputFormat::Table) {
            output::print_warning(&format!("{drifted} resource(s) differ from the manifest"));
        }
        finish(&report, format, "refresh")
    }
}

impl DestroyCommand {
    pub async fn execute(&self, provisioner: &Provisioner, format: OutputFormat) -> Result<()> {
        let manifest = Manifest::load(&self.manifest).await?;

        if !self.yes {
            eprintln!(
                "Are you sure you want to delete {} resource(s) from {}? (y/N)",
                manifest.resources.len(),
                self.manifest.display()
            );
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            if !input.trim().eq_ignore_ascii_case("y") {
                output::print_info("Deletion cancelled");
                return Ok(());
            }
        }

        let report = provisioner.destroy(&manifest).await;
        finish(&report, format, "destroy")
    }
}

/// Print the report and turn failed resources into a non-zero exit.
fn finish(report: &RunReport, format: OutputFormat, run: &str) -> Result<()> {
    match format {
        OutputFormat::Table => {
            output::print_table(report.resources.iter().map(StatusRow::from).collect());
        }
        _ => println!("{}", output::format_output(report, format)?),
    }

    let failed = report.failures().count();
    if failed > 0 {
        for status in report.failures() {
            output::print_error(&format!(
                "{} {}: {}",
                status.kind,
                status.name,
                status.message.as_deref().unwrap_or("failed")
            ));
        }
        bail!("{run} finished with {failed} failed resource(s)");
    }

    if matches!(format, OutputFormat::Table) {
        output::print_success(&format!("{run} finished for {} resource(s)", report.resources.len()));
    }
    Ok(())
}
