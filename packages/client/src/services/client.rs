//! HTTP client for the private WorkFlowy API
//!
//! Thin plumbing around the four endpoints the document model needs:
//! login, initialization data, tree snapshots and `push_and_poll`.
//! Session state lives in reqwest's cookie store; authenticated calls
//! that come back non-OK are retried exactly once after a fresh login,
//! and a second failure is surfaced with status detail.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::Form;
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    InitializationData, InitializationPayload, Operation, OperationResult, PushEnvelope,
    PushPollResponse, TreeData,
};
use crate::services::error::ClientError;
use crate::services::transport::Transport;

const LOGIN_PATH: &str = "/ajax_login";
const INITIALIZATION_PATH: &str = "/get_initialization_data";
const TREE_PATH: &str = "/get_tree_data/";
const PUSH_PATH: &str = "/push_and_poll";

/// Client configuration.
///
/// Defaults target the production WorkFlowy endpoints; tests point
/// `base_url` at a local server.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the WorkFlowy service, without a trailing slash.
    pub base_url: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Client version string reported on every call.
    pub client_version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://workflowy.com".to_string(),
            timeout: Duration::from_secs(20),
            client_version: "21".to_string(),
        }
    }
}

/// Authenticated session against the WorkFlowy service.
pub struct Client {
    http: reqwest::Client,
    config: ClientConfig,
    username: String,
    password: String,
    /// Stable per-session client id, in the wall-clock format the web
    /// client uses.
    client_id: String,
    initialization: tokio::sync::Mutex<Option<InitializationData>>,
}

impl Client {
    /// Creates a client with the default configuration.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ClientError> {
        Self::with_config(username, password, ClientConfig::default())
    }

    /// Creates a client with an explicit configuration.
    pub fn with_config(
        username: impl Into<String>,
        password: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            config,
            username: username.into(),
            password: password.into(),
            client_id: Utc::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            initialization: tokio::sync::Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Logs in and stores the session cookie.
    ///
    /// A rejected login surfaces the server-reported reasons and is never
    /// retried.
    pub async fn login(&self) -> Result<(), ClientError> {
        info!("logging in to WorkFlowy");

        let form = Form::new()
            .text("username", self.username.clone())
            .text("password", self.password.clone());

        let response = self
            .http
            .post(self.url(LOGIN_PATH))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(request_error(status, "login request rejected"));
        }

        let body = response.text().await?;
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            if value.get("success").and_then(Value::as_bool) == Some(false) {
                return Err(ClientError::login_failed(login_reasons(&value)));
            }
        }

        Ok(())
    }

    /// Sends a request, re-authenticating and retrying exactly once if the
    /// first attempt comes back non-OK.
    async fn authenticated_json(
        &self,
        build: impl Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    ) -> Result<Value, ClientError> {
        let response = build(&self.http).send().await?;
        let response = if response.status().is_success() {
            response
        } else {
            drain(response).await;
            self.login().await?;
            build(&self.http).send().await?
        };

        let status = response.status();
        if !status.is_success() {
            return Err(request_error(status, "authenticated request failed"));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Fetches and caches the account initialization data.
    pub async fn get_initialization_data(&self) -> Result<InitializationData, ClientError> {
        let mut cached = self.initialization.lock().await;
        if let Some(data) = cached.as_ref() {
            return Ok(data.clone());
        }

        info!("fetching WorkFlowy initialization data");
        let json = self
            .authenticated_json(|http| {
                http.get(self.url(INITIALIZATION_PATH)).query(&[
                    ("client_version", self.config.client_version.as_str()),
                    ("client_version_v2", "28"),
                    ("no_root_children", "1"),
                ])
            })
            .await?;

        let payload: InitializationPayload = serde_json::from_value(json)?;
        let data = InitializationData::from(payload);
        *cached = Some(data.clone());
        Ok(data)
    }

    /// Fetches one tree snapshot, the user's own or a shared one.
    pub async fn get_tree_data(&self, share_id: Option<&str>) -> Result<TreeData, ClientError> {
        info!(share_id, "fetching WorkFlowy tree data");
        let json = self
            .authenticated_json(|http| {
                let request = http.get(self.url(TREE_PATH));
                match share_id {
                    Some(id) => request.query(&[("share_id", id)]),
                    None => request,
                }
            })
            .await?;

        Ok(serde_json::from_value(json)?)
    }
}

/// Reads the whole body of a failed response so the connection can be
/// reused for the retry.
async fn drain(response: Response) {
    let _ = response.bytes().await;
}

fn request_error(status: StatusCode, detail: &str) -> ClientError {
    ClientError::request_failed(
        status.as_u16(),
        format!(
            "{detail}: {}",
            status.canonical_reason().unwrap_or("unknown status")
        ),
    )
}

/// Extracts human-readable reasons from an `ajax_login` error body.
fn login_reasons(value: &Value) -> Vec<String> {
    let mut reasons = Vec::new();
    if let Some(errors) = value.get("errors") {
        match errors {
            Value::Object(map) => {
                for entry in map.values() {
                    collect_strings(entry, &mut reasons);
                }
            }
            other => collect_strings(other, &mut reasons),
        }
    }
    if reasons.is_empty() {
        reasons.push("invalid credentials".to_string());
    }
    reasons
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(text) => out.push(text.clone()),
        Value::Array(entries) => {
            for entry in entries {
                collect_strings(entry, out);
            }
        }
        _ => {}
    }
}

#[async_trait]
impl Transport for Client {
    async fn fetch_initialization_data(&self) -> Result<InitializationData, ClientError> {
        self.get_initialization_data().await
    }

    async fn fetch_tree_data(&self, share_id: Option<&str>) -> Result<TreeData, ClientError> {
        self.get_tree_data(share_id).await
    }

    async fn push_operations(
        &self,
        cursor: &str,
        share_id: Option<&str>,
        operations: Vec<Operation>,
    ) -> Result<OperationResult, ClientError> {
        let initialization = self.get_initialization_data().await?;

        let envelope = PushEnvelope {
            most_recent_operation_transaction_id: cursor.to_string(),
            operations,
            share_id: share_id.map(str::to_string),
        };
        let push_poll_data = serde_json::to_string(&vec![envelope])?;
        let push_poll_id = Uuid::new_v4().simple().to_string()[..8].to_string();

        info!(share_id, %push_poll_id, "pushing WorkFlowy operations");
        debug!(%push_poll_data, "push payload");

        let json = self
            .authenticated_json(|http| {
                let form = Form::new()
                    .text("client_id", self.client_id.clone())
                    .text("client_version", self.config.client_version.clone())
                    .text("push_poll_id", push_poll_id.clone())
                    .text("push_poll_data", push_poll_data.clone())
                    .text("crosscheck_user_id", initialization.owner_id.to_string());
                http.post(self.url(PUSH_PATH)).multipart(form)
            })
            .await?;

        let response: PushPollResponse = serde_json::from_value(json)?;
        response.into_result().ok_or_else(|| {
            ClientError::Schema(serde::de::Error::custom("push_and_poll returned no results"))
        })
    }
}
