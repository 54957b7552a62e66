//! Wire data contracts for the deployment service.
//!
//! These types mirror the JSON bodies exchanged with the service over HTTP and
//! are shared between the client library and its command-line front end.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Key under `extras` carrying the names of fields rejected by validation.
pub const FAILED_FIELDS_KEY: &str = "failed_fields";

/// A deployment resource as stored by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub id: Uuid,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub replicas: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ports: Vec<Port>,
    /// Assigned by the service; absent until the deployment is created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Deployment {
    /// Starts a deployment of `image` with a fresh identifier and one replica.
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            replicas: 1,
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_port(mut self, port: Port) -> Self {
        self.ports.push(port);
        self
    }

    /// Compares every client-controlled field, ignoring `created_at`.
    pub fn same_definition(&self, other: &Deployment) -> bool {
        self.id == other.id
            && self.labels == other.labels
            && self.replicas == other.replicas
            && self.image == other.image
            && self.name == other.name
            && self.ports == other.ports
    }
}

/// A named container port. The range is not checked locally.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "port", default)]
    pub number: u32,
}

impl Port {
    pub fn new(name: impl Into<String>, number: u32) -> Self {
        Self {
            name: name.into(),
            number,
        }
    }
}

/// Error body returned for failed requests.
///
/// Validation failures additionally carry `extras.failed_fields`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub extras: HashMap<String, Vec<String>>,
}

impl ErrorBody {
    /// Field names rejected by validation, in the order the service reported them.
    pub fn failed_fields(&self) -> &[String] {
        self.extras
            .get(FAILED_FIELDS_KEY)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Body returned when a resource does not exist.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotFoundBody {
    pub id: Uuid,
    pub resource: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
