use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kube_cli::{Command, Connection, build_deployment, parse_label, parse_port, run};
use kube_client::Port;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "kube-cli", version, about = "Deployment service client")]
struct Cli {
    /// Override the service URL (default: http://localhost:3000)
    #[arg(long, env = "KUBE_CLIENT_URL")]
    url: Option<String>,

    /// Per-request timeout, e.g. `5s` or `250ms`
    #[arg(long, env = "KUBE_CLIENT_TIMEOUT", value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a deployment and print it
    Create {
        #[arg(long)]
        image: String,
        #[arg(long, default_value_t = 1)]
        replicas: u32,
        #[arg(long)]
        name: Option<String>,
        /// Defaults to a random UUID
        #[arg(long)]
        id: Option<Uuid>,
        /// NAME:PORT, repeatable
        #[arg(long = "port", value_parser = parse_port)]
        ports: Vec<Port>,
        /// KEY=VALUE, repeatable
        #[arg(long = "label", value_parser = parse_label)]
        labels: Vec<(String, String)>,
    },
    /// Print a deployment
    Get { id: String },
    /// Delete a deployment
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = match cli.command {
        Commands::Create {
            image,
            replicas,
            name,
            id,
            ports,
            labels,
        } => Command::Create(build_deployment(image, replicas, name, id, ports, labels)),
        Commands::Get { id } => Command::Get { id },
        Commands::Delete { id } => Command::Delete { id },
    };

    run(
        Connection {
            url: cli.url,
            timeout: cli.timeout,
        },
        command,
    )
    .await
}
