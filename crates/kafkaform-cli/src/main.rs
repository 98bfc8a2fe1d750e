//! kafkaform command-line tool.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kafkaform_client::{Credentials, KafkaConnectClient, RestAdminClient};
use kafkaform_config::{ConfigLoader, EnvironmentProvider, FileProvider, PartialConfig, ProviderConfig};
use kafkaform_provisioner::Provisioner;
use tracing::debug;

mod commands;
mod output;
mod telemetry;

use commands::*;

/// Declarative Kafka ACL, topic and connector provisioning
#[derive(Parser)]
#[command(name = "kafkaform")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (YAML, TOML or JSON)
    #[arg(short, long, env = "KAFKAFORM_CONFIG")]
    config: Option<PathBuf>,

    /// Kafka REST v3 endpoint
    #[arg(long)]
    rest_url: Option<String>,

    /// Kafka Connect REST endpoint
    #[arg(long)]
    connect_url: Option<String>,

    /// Kafka cluster id; discovered from the REST endpoint when omitted
    #[arg(long)]
    cluster_id: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Log level, overridden by RUST_LOG
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Create or update every resource in a manifest
    Apply(ApplyCommand),

    /// Compare a manifest with the cluster
    Refresh(RefreshCommand),

    /// Delete every resource in a manifest
    Destroy(DestroyCommand),

    /// Expand ACL resources into grants offline
    Render(RenderCommand),

    /// List the ACLs held by a principal
    Grants(GrantsCommand),

    /// List topics
    Topics(TopicsCommand),
}

/// Output format
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl Cli {
    /// Flags given on the command line, as the top configuration layer.
    fn overrides(&self) -> PartialConfig {
        PartialConfig {
            rest_url: self.rest_url.clone(),
            cluster_id: self.cluster_id.clone(),
            connect_url: self.connect_url.clone(),
            log_level: self.log_level.clone(),
            ..Default::default()
        }
    }

    async fn load_config(&self) -> Result<ProviderConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(path) = &self.config {
            loader = loader.with_provider(FileProvider::new(path)?);
        }
        let config = loader
            .with_provider(EnvironmentProvider::default())
            .load(self.overrides())
            .await
            .context("Failed to load configuration")?;
        Ok(config)
    }
}

/// Wire the REST and, when configured, Connect gateways into a provisioner.
fn build_provisioner(config: &ProviderConfig) -> Result<Provisioner> {
    let credentials = config
        .credentials()
        .map(|(username, password)| Credentials::new(username, password));

    let rest = RestAdminClient::new(&config.rest_url, config.request_timeout())?
        .with_credentials(credentials.clone())
        .with_cluster_id(config.cluster_id.clone());
    let rest = Arc::new(rest);
    let mut provisioner = Provisioner::new(rest.clone(), rest);

    if let Some(url) = &config.connect_url {
        let connect = KafkaConnectClient::new(url, config.request_timeout())?.with_credentials(credentials);
        provisioner = provisioner.with_connectors(Arc::new(connect));
    }
    Ok(provisioner)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = cli.load_config().await?;
    telemetry::init(&config.log_level);
    debug!(?config, "Resolved configuration");

    match &cli.command {
        Commands::Render(cmd) => cmd.execute(cli.output).await,
        Commands::Apply(cmd) => cmd.execute(&build_provisioner(&config)?, cli.output).await,
        Commands::Refresh(cmd) => cmd.execute(&build_provisioner(&config)?, cli.output).await,
        Commands::Destroy(cmd) => cmd.execute(&build_provisioner(&config)?, cli.output).await,
        Commands::Grants(cmd) => cmd.execute(&build_provisioner(&config)?, cli.output).await,
        Commands::Topics(cmd) => cmd.execute(&build_provisioner(&config)?, cli.output).await,
    }
}
