use std::time::Duration;

use anyhow::{Context as _, Result, anyhow, bail};
use kube_client::{Client, ClientError, Context, Deployment, Port};
use tracing::{debug, info};
use uuid::Uuid;

/// Connection settings shared by every command.
#[derive(Debug, Clone)]
pub struct Connection {
    pub url: Option<String>,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub enum Command {
    Create(Deployment),
    Get { id: String },
    Delete { id: String },
}

pub async fn run(connection: Connection, command: Command) -> Result<()> {
    let mut builder = Client::builder();
    if let Some(url) = connection.url {
        builder = builder.url(url);
    }
    if let Some(timeout) = connection.timeout {
        builder = builder.timeout(timeout);
    }
    let client = builder.build().context("failed to configure client")?;
    debug!("using {}", client.base_url());

    let (ctx, cancel) = Context::background().with_cancel();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl+C received, cancelling request...");
            cancel.cancel();
        }
    });

    let result = execute(&client, &ctx, command).await;
    interrupt.abort();
    result.map_err(describe)
}

async fn execute(client: &Client, ctx: &Context, command: Command) -> Result<(), ClientError> {
    let deployments = client.deployments();
    match command {
        Command::Create(deployment) => {
            let created = deployments.create(ctx, &deployment).await?;
            print_json(&created);
        }
        Command::Get { id } => {
            let found = deployments.get(ctx, &id).await?;
            print_json(&found);
        }
        Command::Delete { id } => {
            deployments.delete(ctx, &id).await?;
            info!("deleted deployment {id}");
        }
    }
    Ok(())
}

fn print_json(deployment: &Deployment) {
    match serde_json::to_string_pretty(deployment) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => println!("{deployment:?} ({err})"),
    }
}

/// Renders taxonomy errors from their fields rather than their display text.
pub fn describe(err: ClientError) -> anyhow::Error {
    if err.is_cancelled() {
        return anyhow!("request cancelled");
    }
    if err.is_deadline_exceeded() {
        return anyhow!("request timed out");
    }
    match err {
        ClientError::Validation(validation) => {
            let mut rendered = format!("deployment rejected (code {})", validation.code());
            if !validation.message().is_empty() {
                rendered.push_str(": ");
                rendered.push_str(validation.message());
            }
            if !validation.failed_fields.is_empty() {
                rendered.push_str("; invalid fields: ");
                rendered.push_str(&validation.failed_fields.join(", "));
            }
            anyhow!(rendered)
        }
        ClientError::NotFound(not_found) => {
            anyhow!("{} {} does not exist", not_found.resource, not_found.id)
        }
        ClientError::Api(api) => anyhow!(
            "service returned {} (code {}): {}",
            api.status,
            api.code,
            api.message
        ),
        other => anyhow::Error::new(other),
    }
}

/// Parses `name:number`, e.g. `http:80`.
pub fn parse_port(raw: &str) -> Result<Port> {
    let (name, number) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("expected NAME:PORT, got {raw:?}"))?;
    let number = number
        .parse()
        .with_context(|| format!("invalid port number in {raw:?}"))?;
    Ok(Port::new(name, number))
}

/// Parses `key=value`.
pub fn parse_label(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("expected KEY=VALUE, got {raw:?}"),
    }
}

/// Assembles a deployment from command-line values.
pub fn build_deployment(
    image: String,
    replicas: u32,
    name: Option<String>,
    id: Option<Uuid>,
    ports: Vec<Port>,
    labels: Vec<(String, String)>,
) -> Deployment {
    let mut deployment = Deployment::new(image).with_replicas(replicas);
    if let Some(id) = id {
        deployment.id = id;
    }
    if let Some(name) = name {
        deployment = deployment.with_name(name);
    }
    deployment.ports = ports;
    deployment.labels.extend(labels);
    deployment
}
