use std::time::Duration;

use url::Url;

use crate::core::transport::TransportConfig;
use crate::core::{SdkError, ValidationError};

pub const ENV_BASE_URL: &str = "OPEN_RESPONSES_BASE_URL";
pub const ENV_API_KEY: &str = "OPEN_RESPONSES_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "OPEN_RESPONSES_TIMEOUT_SECS";

pub const DEFAULT_ENDPOINT_PATH: &str = "/v1/responses";

/// Where and how a client talks to an Open Responses server.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Sent as `Authorization: Bearer {api_key}` when set.
    pub api_key: Option<String>,
    /// Path after base_url (default: "/v1/responses").
    pub endpoint_path: String,
    /// Extra static headers for every request (lower-case keys preferred).
    pub headers: Vec<(String, String)>,
    /// Query params appended to the request URL.
    pub query_params: Vec<(String, String)>,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            headers: Vec::new(),
            query_params: Vec::new(),
            transport: TransportConfig::default(),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((name.into(), value.into()));
        self
    }

    pub fn with_transport_config(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Read `OPEN_RESPONSES_BASE_URL` (required), `OPEN_RESPONSES_API_KEY`
    /// and `OPEN_RESPONSES_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Result<Self, SdkError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SdkError> {
        let base_url = lookup(ENV_BASE_URL)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ValidationError::new(format!("{ENV_BASE_URL} is not set")))?;
        let mut cfg = Self::new(base_url);
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            cfg.api_key = Some(key.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                ValidationError::new(format!(
                    "{ENV_TIMEOUT_SECS} must be a whole number of seconds, got `{raw}`"
                ))
            })?;
            cfg.transport.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// The base URL must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let parsed = Url::parse(self.base_url.trim())
            .map_err(|err| ValidationError::new(format!("invalid base_url `{}`: {err}", self.base_url)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::new(format!(
                "base_url must use http or https, got `{other}`"
            ))),
        }
    }

    pub fn endpoint_url(&self) -> String {
        let base_trimmed = self.base_url.trim().trim_end_matches('/');
        let ep = self.endpoint_path.trim_start_matches('/');
        let mut url = format!("{}/{}", base_trimmed, ep);
        if !self.query_params.is_empty() {
            let qp = self
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            url.push('?');
            url.push_str(&qp);
        }
        url
    }

    /// Headers for one call. Caller headers never override content-type,
    /// accept or authorization.
    pub fn request_headers(&self, stream: bool) -> Vec<(String, String)> {
        let accept = if stream {
            "text/event-stream"
        } else {
            "application/json"
        };
        let mut headers = vec![
            ("content-type".to_string(), "application/json".to_string()),
            ("accept".to_string(), accept.to_string()),
            ("user-agent".to_string(), user_agent()),
        ];
        if let Some(key) = self.api_key.as_deref() {
            headers.push(("authorization".to_string(), format!("Bearer {key}")));
        }
        for (k, v) in &self.headers {
            let kl = k.to_ascii_lowercase();
            if kl == "content-type" || kl == "accept" || kl == "authorization" {
                continue;
            }
            if let Some(slot) = headers.iter_mut().find(|(name, _)| *name == kl) {
                slot.1 = v.clone();
            } else {
                headers.push((kl, v.clone()));
            }
        }
        headers
    }
}

fn user_agent() -> String {
    format!("open-responses/{}", env!("CARGO_PKG_VERSION"))
}
