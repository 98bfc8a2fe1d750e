//! Read-only views of the live cluster.

use anyhow::Result;
use kafkaform_acl::Grant;
use kafkaform_provisioner::Provisioner;

use crate::output::{self, GrantRow, TopicRow};
use crate::OutputFormat;

/// List every ACL held by a principal
#[derive(Debug, clap::Args)]
pub struct GrantsCommand {
    /// Principal, e.g. User:alice
    principal: String,
}

/// List topics with their non-default configuration
#[derive(Debug, clap::Args)]
pub struct TopicsCommand {
    /// Only topics whose name starts with this prefix
    #[arg(short, long, default_value = "")]
    prefix: String,
}

impl GrantsCommand {
    pub async fn execute(&self, provisioner: &Provisioner, format: OutputFormat) -> Result<()> {
        let entities = provisioner.grants(&self.principal).await?;
        let grants: Vec<Grant> = entities.iter().flat_map(|e| e.grants()).collect();

        match format {
            OutputFormat::Table => {
                output::print_table(grants.iter().map(|g| GrantRow::new("-", g)).collect());
            }
            _ => println!("{}", output::format_output(&entities, format)?),
        }
        Ok(())
    }
}

impl TopicsCommand {
    pub async fn execute(&self, provisioner: &Provisioner, format: OutputFormat) -> Result<()> {
        let topics = provisioner.topics(&self.prefix).await?;

        match format {
            OutputFormat::Table => output::print_table(topics.iter().map(TopicRow::from).collect()),
            _ => println!("{}", output::format_output(&topics, format)?),
        }
        Ok(())
    }
}
