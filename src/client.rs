//! Blocking HTTP client for the Sensibo v2 API (pods, acStates, smartmode).
//!
//! - Uses `ureq` with a global per-request timeout; no retries.
//! - The API key travels as the `apiKey` query parameter and never appears in logs.
//! - Responses are decoded with `serde_path_to_error` so a schema mismatch names the field.

use crate::models::sensibo::{AcState, AcStateUpdate, Pod, PodId, PodList, SmartMode};
use crate::snapshot::DeviceReading;
use crate::sync::{DeviceService, LoadError, ServiceError};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://home.sensibo.com/api/v2";
const POD_FIELDS: &str = "id,acState,measurements,smartMode";

#[derive(Debug)]
pub enum SensiboClientError {
    Transport(String),
    Http { status: u16, message: String },
    Json { path: String, message: String },
}

impl core::fmt::Display for SensiboClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SensiboClientError::Transport(s) => write!(f, "transport error: {}", s),
            SensiboClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            SensiboClientError::Json { path, message } => write!(f, "json error at {}: {}", path, message),
        }
    }
}

impl std::error::Error for SensiboClientError {}

impl From<SensiboClientError> for LoadError {
    fn from(value: SensiboClientError) -> Self {
        LoadError::Service(Box::new(value))
    }
}

impl From<serde_json::Error> for SensiboClientError {
    fn from(value: serde_json::Error) -> Self {
        SensiboClientError::Json {
            path: ".".to_string(),
            message: value.to_string(),
        }
    }
}

pub struct SensiboClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    pod_id: Option<PodId>,
}

impl SensiboClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
        pod_id: Option<PodId>,
    ) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        SensiboClient {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            pod_id,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, SensiboClientError> {
        let url = self.url(path);
        let mut req = self.agent.get(&url).header("Accept", "application/json");
        for (k, v) in query {
            req = req.query(*k, *v);
        }
        let req = req.query("apiKey", &self.api_key);

        let result = req.call();
        let body = Self::read_response("GET", &url, result)?;
        decode(&body).inspect_err(|e| {
            error!("Request: GET {} returned an unexpected body: {}", url, e);
            error!("Response:\n{}", body);
        })
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), SensiboClientError> {
        let url = self.url(path);
        let payload = serde_json::to_string(body)?;
        debug!("POST {} body: {}", url, payload);

        let result = self
            .agent
            .post(&url)
            .query("apiKey", &self.api_key)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .send(payload.as_str());
        if let Err(e) = Self::read_response("POST", &url, result) {
            error!("Request body:\n{}", payload);
            return Err(e);
        }
        Ok(())
    }

    fn read_response(
        method: &str,
        url: &str,
        result: Result<http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<String, SensiboClientError> {
        let mut resp = match result {
            Ok(r) => r,
            Err(e) => {
                error!("Request: {} {} failed: {}", method, url, e);
                return Err(SensiboClientError::Transport(e.to_string()));
            }
        };
        let status = resp.status();
        let body = resp.body_mut().read_to_string().map_err(|e| {
            error!("Request: {} {} ({}) body unreadable: {}", method, url, status, e);
            SensiboClientError::Transport(e.to_string())
        })?;

        if !status.is_success() {
            error!("Request: {} {} returned {}", method, url, status);
            error!("Response:\n{}", body);
            return Err(SensiboClientError::Http {
                status: status.as_u16(),
                message: body,
            });
        }
        debug!("{} {} -> {} ({} bytes)", method, url, status, body.len());
        Ok(body)
    }

    pub fn get_pods(&self) -> Result<PodList, SensiboClientError> {
        self.get_json("users/me/pods", &[("fields", POD_FIELDS)])
    }

    pub fn post_smart_mode(&self, pod_id: &PodId, smart_mode: &SmartMode) -> Result<(), SensiboClientError> {
        self.post_json(&format!("pods/{}/smartmode", pod_id.0), smart_mode)
    }

    pub fn post_ac_state(&self, pod_id: &PodId, ac_state: &AcState) -> Result<(), SensiboClientError> {
        self.post_json(&format!("pods/{}/acStates", pod_id.0), &AcStateUpdate { ac_state })
    }
}

impl DeviceService for SensiboClient {
    fn load(&self) -> Result<DeviceReading, LoadError> {
        let list = self.get_pods()?;
        if list.status != "success" {
            warn!("Pod list status was {:?}", list.status);
        }
        info!("Account reports {} pod(s)", list.pods.len());
        let pod = select_pod(list.pods, self.pod_id.as_ref())?;
        let pod_id = pod.id.clone();
        DeviceReading::from_pod(pod).ok_or(LoadError::MissingTemperature(pod_id))
    }

    fn push_smart_mode(&self, pod_id: &PodId, smart_mode: &SmartMode) -> Result<(), ServiceError> {
        Ok(self.post_smart_mode(pod_id, smart_mode)?)
    }

    fn push_ac_state(&self, pod_id: &PodId, ac_state: &AcState) -> Result<(), ServiceError> {
        Ok(self.post_ac_state(pod_id, ac_state)?)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, SensiboClientError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|e| SensiboClientError::Json {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

/// Pick the managed pod: the configured one, or the only one on the account.
pub fn select_pod(pods: Vec<Pod>, wanted: Option<&PodId>) -> Result<Pod, LoadError> {
    match wanted {
        Some(id) => pods
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| LoadError::PodNotFound(id.clone())),
        None => {
            let mut pods = pods;
            match pods.len() {
                0 => Err(LoadError::NoPods),
                1 => Ok(pods.remove(0)),
                _ => Err(LoadError::AmbiguousPods(pods.into_iter().map(|p| p.id).collect())),
            }
        }
    }
}
