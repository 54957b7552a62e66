//! Async client for the deployment service.
//!
//! [`Client`] owns the connection settings and hands out a
//! [`DeploymentService`]; every operation takes a [`Context`] and fails with a
//! [`ClientError`] whose variants can be matched structurally.
//!
//! ```no_run
//! use kube_client::{Client, Context, Deployment, Port};
//!
//! # async fn run() -> Result<(), kube_client::ClientError> {
//! let client = Client::builder().url("http://localhost:3000").build()?;
//! let deployment = Deployment::new("nginx").with_port(Port::new("http", 80));
//!
//! let created = client
//!     .deployments()
//!     .create(&Context::background(), &deployment)
//!     .await?;
//! # let _ = created;
//! # Ok(())
//! # }
//! ```

mod context;
mod deployment;
mod error;
mod transport;

use std::{sync::Arc, time::Duration};

use tracing::debug;
use url::Url;

pub use context::{CancelHandle, Context, ContextError};
pub use deployment::DeploymentService;
pub use error::{
    ApiError, ClientError, ClientErrorKind, NotFoundError, TransportError, UNKNOWN_RESOURCE,
    ValidationError,
};
pub use kube_protocol::{Deployment, Port};
pub use reqwest::StatusCode;

use transport::Transport;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Entry point to the deployment service.
///
/// Cheap to clone; clones share one HTTP connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    transport: Arc<Transport>,
    deployments: DeploymentService,
}

impl Client {
    /// Client for [`DEFAULT_BASE_URL`] with no timeout.
    pub fn new() -> Result<Self, ClientError> {
        Self::builder().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn deployments(&self) -> &DeploymentService {
        &self.deployments
    }

    pub fn base_url(&self) -> &Url {
        self.transport.base()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.transport.timeout()
    }
}

/// Optional settings applied when the [`Client`] is built.
#[derive(Debug, Default)]
pub struct ClientBuilder {
    url: Option<String>,
    timeout: Option<Duration>,
    http_client: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Overall limit for each request, including reading the body.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reuses an existing `reqwest` client instead of building one.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Validates the configuration and builds the client.
    pub fn build(self) -> Result<Client, ClientError> {
        let base = parse_base_url(self.url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let http_client = match self.http_client {
            Some(client) => client,
            None => reqwest::Client::builder().no_proxy().build()?,
        };
        debug!(base = %base, timeout = ?self.timeout, "building deployment client");

        let transport = Arc::new(Transport::new(http_client, base, self.timeout));
        Ok(Client {
            deployments: DeploymentService::new(Arc::clone(&transport)),
            transport,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let parsed = Url::parse(raw)?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
        return Err(ClientError::UnsupportedUrl(raw.to_string()));
    }
    Ok(parsed)
}
