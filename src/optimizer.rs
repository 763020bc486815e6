//! HTTP adapter for the route optimization service.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::FailureSignal;
use crate::request::OptimizationRequest;
use crate::traits::{ConnectivityProbe, Optimizer};

/// Extra network budget on top of the algorithm's own `timeLimit`.
const TIME_LIMIT_GRACE_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    pub base_url: String,
    pub optimize_path: String,
    pub health_path: String,
    pub timeout_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            optimize_path: "/optimize-route".to_string(),
            health_path: "/health".to_string(),
            timeout_secs: 120,
            probe_timeout_secs: 5,
        }
    }
}

impl OptimizerConfig {
    /// Defaults overlaid with `AQUAROUTE_OPTIMIZER_URL` and
    /// `AQUAROUTE_OPTIMIZER_TIMEOUT_SECS` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("AQUAROUTE_OPTIMIZER_URL") {
            config.base_url = url;
        }
        if let Some(secs) = std::env::var("AQUAROUTE_OPTIMIZER_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
        {
            config.timeout_secs = secs;
        }
        config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Client-side timeout for a request, always above its algorithm budget.
    pub fn request_timeout(&self, time_limit_secs: u32) -> Duration {
        let floor = u64::from(time_limit_secs) + TIME_LIMIT_GRACE_SECS;
        Duration::from_secs(self.timeout_secs.max(floor))
    }
}

#[derive(Debug, Clone)]
pub struct OptimizerClient {
    config: OptimizerConfig,
    client: reqwest::blocking::Client,
}

impl OptimizerClient {
    pub fn new(config: OptimizerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }
}

impl Optimizer for OptimizerClient {
    fn optimize(&self, request: &OptimizationRequest) -> Result<Value, FailureSignal> {
        let url = self.config.url(&self.config.optimize_path);
        let timeout = self.config.request_timeout(request.params().time_limit_secs);
        debug!(%url, candidates = request.candidates().len(), ?timeout, "requesting optimization");

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(&request.payload())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(status = status.as_u16(), "optimizer returned an error status");
            return Err(FailureSignal::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text()?;
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(body) => body,
            Err(err) => {
                warn!(error = %err, bytes = text.len(), "optimizer body is not valid json");
                Value::String(text)
            }
        };
        match soft_failure(&body) {
            Some(message) => Err(FailureSignal::Message(message)),
            None => Ok(body),
        }
    }
}

impl ConnectivityProbe for OptimizerClient {
    fn is_reachable(&self) -> bool {
        let url = self.config.url(&self.config.health_path);
        let probe = self
            .client
            .get(url)
            .timeout(Duration::from_secs(self.config.probe_timeout_secs))
            .send()
            .and_then(|resp| resp.error_for_status());

        match probe {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "optimizer health check failed");
                false
            }
        }
    }
}

/// A `200` body that reports `success: false` still counts as a failure.
fn soft_failure(body: &Value) -> Option<String> {
    let object = body.as_object()?;
    if object.get("success").and_then(Value::as_bool) != Some(false) {
        return None;
    }
    let message = ["message", "error", "detail"]
        .iter()
        .filter_map(|key| object.get(*key).and_then(Value::as_str))
        .next()
        .unwrap_or("optimizer reported failure");
    Some(message.to_string())
}
