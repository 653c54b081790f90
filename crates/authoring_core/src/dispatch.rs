use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    error::ApiError,
    protocol::{GatAction, GatResult},
};
use tracing::{debug, warn};
use url::Url;

/// Executes authoring actions against the course-editing backend.
#[async_trait]
pub trait DispatchService: Send + Sync {
    async fn execute(&self, action: GatAction) -> Result<GatResult>;
}

pub struct MissingDispatchService;

#[async_trait]
impl DispatchService for MissingDispatchService {
    async fn execute(&self, action: GatAction) -> Result<GatResult> {
        Err(anyhow!(
            "authoring dispatch service is unavailable for {}",
            action.name()
        ))
    }
}

/// JSON-over-HTTP dispatcher posting every action to `{server}/gat/dispatch`.
pub struct HttpDispatchService {
    http: Client,
    dispatch_url: Url,
}

impl HttpDispatchService {
    pub fn new(server_url: &str) -> Result<Self> {
        Ok(Self {
            http: Client::new(),
            dispatch_url: dispatch_url(server_url)?,
        })
    }

    pub fn dispatch_url(&self) -> &Url {
        &self.dispatch_url
    }
}

fn dispatch_url(server_url: &str) -> Result<Url> {
    let mut base = Url::parse(server_url.trim())
        .with_context(|| format!("invalid authoring server url '{server_url}'"))?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("gat/dispatch")
        .with_context(|| format!("failed to build dispatch url from '{server_url}'"))
}

#[async_trait]
impl DispatchService for HttpDispatchService {
    async fn execute(&self, action: GatAction) -> Result<GatResult> {
        let name = action.name();
        debug!(action = name, url = %self.dispatch_url, "dispatch: sending action");

        let response = self
            .http
            .post(self.dispatch_url.clone())
            .json(&action)
            .send()
            .await
            .with_context(|| format!("failed to send {name}"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            if let Ok(api_error) = serde_json::from_slice::<ApiError>(&body) {
                warn!(action = name, %status, message = %api_error.message, "dispatch: server rejected action");
                return Ok(GatResult::Failure(api_error));
            }
            return Err(anyhow!("{name} failed with status {status}"));
        }

        let result: GatResult = response
            .json()
            .await
            .with_context(|| format!("invalid {name} response payload"))?;
        Ok(result)
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
