//! Simulator REST API client.
//!
//! Only two calls are needed by the bridge: looking up the numeric id of a
//! named data reference or command, and reading the live value of a data
//! reference (used by toggle inputs).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{BridgeError, Result};
use crate::resolver::IdentifierKind;

/// Request/response access to the simulator.
#[async_trait]
pub trait SimulatorApi: Send + Sync {
    /// Look up the id of a named entity. `Ok(None)` means no such entity.
    async fn lookup_id(&self, kind: IdentifierKind, name: &str) -> Result<Option<u64>>;

    /// Read the current value of a data reference.
    async fn read_value(&self, id: u64) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    data: Vec<EntityRecord>,
}

#[derive(Debug, Deserialize)]
struct EntityRecord {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct ValueResponse {
    data: Value,
}

/// X-Plane web API client.
pub struct XPlaneClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl XPlaneClient {
    /// Create a client for `base_url` (e.g. `http://localhost:8086/api/v2`).
    ///
    /// No request timeout is set: a hung lookup stalls only the operation
    /// that issued it.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SimulatorApi for XPlaneClient {
    async fn lookup_id(&self, kind: IdentifierKind, name: &str) -> Result<Option<u64>> {
        let response = self
            .http_client
            .get(self.api_url(kind.path()))
            .query(&[("filter[name]", name)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BridgeError::InvalidResponse(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body: LookupResponse = response.json().await?;
        debug!(%kind, %name, matches = body.data.len(), "Lookup finished");
        Ok(body.data.first().map(|record| record.id))
    }

    async fn read_value(&self, id: u64) -> Result<Value> {
        let response = self
            .http_client
            .get(self.api_url(&format!("/datarefs/{}/value", id)))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(BridgeError::InvalidResponse(format!(
                "Status: {}",
                response.status()
            )));
        }

        let body: ValueResponse = response.json().await?;
        Ok(body.data)
    }
}
