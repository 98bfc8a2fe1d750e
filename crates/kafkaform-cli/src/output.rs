//! Output formatting utilities.

use anyhow::Result;
use colored::Colorize;
use kafkaform_acl::Grant;
use kafkaform_client::TopicDescription;
use kafkaform_provisioner::{Phase, ResourceStatus};
use serde::Serialize;
use tabled::{Table, Tabled};

use crate::OutputFormat;

/// Serialize for the structured formats. Table output is rendered by the
/// caller from row types.
pub fn format_output<T: Serialize>(data: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        OutputFormat::Json | OutputFormat::Table => Ok(serde_json::to_string_pretty(data)?),
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print warning message to stderr
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print info message to stderr, keeping stdout for the report
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// Print table
pub fn print_table<T: Tabled>(items: Vec<T>) {
    if items.is_empty() {
        print_info("No items found");
        return;
    }

    let table = Table::new(items);
    println!("{}", table);
}

#[derive(Tabled)]
pub struct StatusRow {
    #[tabled(rename = "Kind")]
    pub kind: &'static str,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Phase")]
    pub phase: String,
    #[tabled(rename = "Grants")]
    pub grants: usize,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl From<&ResourceStatus> for StatusRow {
    fn from(status: &ResourceStatus) -> Self {
        let mut detail: Vec<String> = status
            .drift
            .iter()
            .map(|d| format!("{}: {} -> {}", d.field, d.declared, d.observed))
            .collect();
        if let Some(message) = &status.message {
            detail.push(message.clone());
        }
        Self {
            kind: status.kind,
            name: status.name.clone(),
            phase: colored_phase(status.phase),
            grants: status.grants,
            detail: detail.join("\n"),
        }
    }
}

fn colored_phase(phase: Phase) -> String {
    let text = phase.to_string();
    match phase {
        Phase::Created | Phase::Updated | Phase::Applied | Phase::Deleted => text.green().to_string(),
        Phase::Unchanged | Phase::InSync => text.normal().to_string(),
        Phase::Drifted | Phase::Missing => text.yellow().to_string(),
        Phase::Failed => text.red().bold().to_string(),
    }
}

#[derive(Tabled)]
pub struct GrantRow {
    #[tabled(rename = "Resource")]
    pub resource: String,
    #[tabled(rename = "Type")]
    pub resource_type: String,
    #[tabled(rename = "Pattern")]
    pub pattern_type: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Principal")]
    pub principal: String,
    #[tabled(rename = "Host")]
    pub host: String,
    #[tabled(rename = "Operation")]
    pub operation: String,
    #[tabled(rename = "Permission")]
    pub permission: String,
}

impl GrantRow {
    /// `resource` labels the manifest resource the grant came from, if any.
    pub fn new(resource: impl Into<String>, grant: &Grant) -> Self {
        Self {
            resource: resource.into(),
            resource_type: grant.pattern.resource_type.to_string(),
            pattern_type: grant.pattern.pattern_type.to_string(),
            name: grant.pattern.name.clone(),
            principal: grant.principal.clone(),
            host: grant.host.clone(),
            operation: grant.operation.to_string(),
            permission: grant.permission.to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct TopicRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Partitions")]
    pub partitions: i32,
    #[tabled(rename = "Replication")]
    pub replication_factor: i32,
    #[tabled(rename = "Config")]
    pub config: String,
}

impl From<&TopicDescription> for TopicRow {
    fn from(topic: &TopicDescription) -> Self {
        Self {
            name: topic.name.clone(),
            partitions: topic.partitions,
            replication_factor: topic.replication_factor,
            config: topic
                .config
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kafkaform_acl::{AclOperation, ResourcePattern};
    use kafkaform_provisioner::Drift;

    #[test]
    fn test_yaml_output_is_yaml() {
        let grant = Grant::allow(ResourcePattern::literal_topic("orders"), "User:a", AclOperation::Read);
        let yaml = format_output(&grant, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("principal: User:a"));
        assert!(!yaml.trim_start().starts_with('{'));

        let json = format_output(&grant, OutputFormat::Json).unwrap();
        assert!(json.contains("\"principal\": \"User:a\""));
    }

    #[test]
    fn test_status_row_detail() {
        let status = ResourceStatus::new("Topic", "orders", Phase::Drifted)
            .with_drift(vec![Drift::new("partitions", 6, 3)])
            .with_message("note");
        let row = StatusRow::from(&status);
        assert_eq!(row.detail, "partitions: 6 -> 3\nnote");
        assert!(row.phase.contains("Drifted"));
    }

    #[test]
    fn test_grant_row() {
        let grant = Grant::allow(ResourcePattern::prefixed_group("app"), "User:a", AclOperation::Read);
        let row = GrantRow::new("enricher", &grant);
        assert_eq!(row.resource_type, "GROUP");
        assert_eq!(row.pattern_type, "PREFIXED");
        assert_eq!(row.operation, "READ");
    }
}
