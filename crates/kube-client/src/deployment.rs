//! Create, get and delete operations for deployments.

use std::sync::Arc;

use kube_protocol::Deployment;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
    context::Context,
    error::{ClientError, NotFoundError},
    transport::{RawResponse, Transport},
};

const COLLECTION: &str = "deployments";
const RESOURCE: &str = "deployment";

/// Deployment operations bound to a shared transport.
#[derive(Clone, Debug)]
pub struct DeploymentService {
    transport: Arc<Transport>,
}

impl DeploymentService {
    pub(crate) fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// `POST /deployments`. Succeeds on 201 with the stored deployment.
    pub async fn create(
        &self,
        ctx: &Context,
        deployment: &Deployment,
    ) -> Result<Deployment, ClientError> {
        let response = self
            .transport
            .send(ctx, Method::POST, &[COLLECTION], Some(deployment))
            .await?;

        match response.status {
            StatusCode::CREATED => decode(&response),
            status => Err(ClientError::from_response(status, &response.body)),
        }
    }

    /// `GET /deployments/{id}`. Succeeds on 200.
    ///
    /// A 404 names the requested id when it is a UUID; otherwise the
    /// service's not-found body is used.
    pub async fn get(&self, ctx: &Context, id: &str) -> Result<Deployment, ClientError> {
        let response = self
            .transport
            .send::<()>(ctx, Method::GET, &[COLLECTION, id], None)
            .await?;

        match response.status {
            StatusCode::OK => decode(&response),
            StatusCode::NOT_FOUND => match Uuid::parse_str(id) {
                Ok(id) => Err(NotFoundError::new(id, RESOURCE).into()),
                Err(_) => Err(ClientError::from_response(
                    response.status,
                    &response.body,
                )),
            },
            status => Err(ClientError::from_response(status, &response.body)),
        }
    }

    /// `DELETE /deployments/{id}`. Succeeds on 204.
    pub async fn delete(&self, ctx: &Context, id: &str) -> Result<(), ClientError> {
        let response = self
            .transport
            .send::<()>(ctx, Method::DELETE, &[COLLECTION, id], None)
            .await?;

        match response.status {
            StatusCode::NO_CONTENT => Ok(()),
            status => Err(ClientError::from_response(status, &response.body)),
        }
    }
}

fn decode<T: DeserializeOwned>(response: &RawResponse) -> Result<T, ClientError> {
    serde_json::from_slice(&response.body).map_err(ClientError::Decode)
}
