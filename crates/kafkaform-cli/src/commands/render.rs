use std::path::PathBuf;

use anyhow::Result;
use kafkaform_provisioner::{Manifest, Provisioner};

use crate::output::{self, GrantRow};
use crate::OutputFormat;

/// Show the grants each ACL resource expands to, without contacting a cluster
#[derive(Debug, clap::Args)]
pub struct RenderCommand {
    /// Path to the manifest YAML file
    manifest: PathBuf,
}

impl RenderCommand {
    pub async fn execute(&self, format: OutputFormat) -> Result<()> {
        let manifest = Manifest::load(&self.manifest).await?;
        let rendered = Provisioner::render(&manifest);

        match format {
            OutputFormat::Table => {
                let rows = rendered
                    .iter()
                    .flat_map(|acl| acl.grants.iter().map(|g| GrantRow::new(&acl.name, g)))
                    .collect();
                output::print_table(rows);
            }
            _ => println!("{}", output::format_output(&rendered, format)?),
        }
        Ok(())
    }
}
