use super::SnapshotApi;
use super::auth::{Credentials, Session, open_session, refresh_session};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{SnapshotPayload, TaskId, TaskStatus, ZonePage};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;

const TASK_ID_HEADER: &str = "x-task-id";

/// [`SnapshotApi`] over HTTPS with bearer-token authentication
///
/// The client owns the session. A 401 answer triggers one token refresh
/// (when a refresh token is held) and one replay of the request.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    session: RwLock<Session>,
}

impl HttpClient {
    /// Authenticate and build a client for the configured API
    pub async fn connect(config: &Config, credentials: &Credentials) -> Result<Self> {
        let http = build_http_client(config)?;
        let base_url = normalize_base_url(&config.api_url)?;
        let session = open_session(&http, &base_url, credentials).await?;
        tracing::info!(api_url = %base_url, "authenticated against DNS API");
        Ok(Self {
            http,
            base_url,
            session: RwLock::new(session),
        })
    }

    /// Build a client around an existing session, without contacting the API
    pub fn with_session(config: &Config, session: Session) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config)?,
            base_url: normalize_base_url(&config.api_url)?,
            session: RwLock::new(session),
        })
    }

    /// Snapshot of the tokens currently in use
    pub async fn session(&self) -> Session {
        self.session.read().await.clone()
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let response = self.send_once(method.clone(), path, query, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.try_refresh().await? {
            let retried = self.send_once(method.clone(), path, query, body).await?;
            return check_status(&method, path, retried).await;
        }

        check_status(&method, path, response).await
    }

    async fn send_once(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);
        let token = self.session.read().await.access_token.clone();

        tracing::debug!(%method, path, "sending API request");
        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(token)
            .query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Replace the session using the refresh token, if there is one
    async fn try_refresh(&self) -> Result<bool> {
        let refresh_token = match self.session.read().await.refresh_token.clone() {
            Some(token) => token,
            None => return Ok(false),
        };

        let refreshed = refresh_session(&self.http, &self.base_url, &refresh_token).await?;
        *self.session.write().await = refreshed;
        tracing::info!("access token refreshed");
        Ok(true)
    }

    async fn start_task(&self, path: &str, body: Value) -> Result<TaskId> {
        let response = self.request(Method::POST, path, &[], Some(&body)).await?;

        let header_id = response
            .headers()
            .get(TASK_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = response.text().await?;

        task_id_from_body(&text)
            .or(header_id)
            .map(TaskId)
            .ok_or_else(|| {
                Error::InvalidResponse(format!("POST {} returned no task id: {}", path, text))
            })
    }
}

#[async_trait]
impl SnapshotApi for HttpClient {
    async fn list_zones(&self, cursor: Option<&str>, limit: u32) -> Result<ZonePage> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let response = self.request(Method::GET, "/v3/zones", &query, None).await?;
        let listing: ZoneListResponse = response.json().await.map_err(|e| {
            Error::InvalidResponse(format!("malformed zone listing: {}", e))
        })?;
        Ok(listing.into())
    }

    async fn create_snapshot(&self, zone: &str, description: &str) -> Result<TaskId> {
        self.start_task(
            &zone_path(zone, "snapshot"),
            json!({ "description": description }),
        )
        .await
    }

    async fn restore_snapshot(&self, zone: &str) -> Result<TaskId> {
        self.start_task(&zone_path(zone, "restore"), json!({})).await
    }

    async fn get_snapshot(&self, zone: &str) -> Result<SnapshotPayload> {
        let response = self
            .request(Method::GET, &zone_path(zone, "snapshot"), &[], None)
            .await?;
        response.json().await.map_err(|e| {
            Error::InvalidResponse(format!("malformed snapshot for {}: {}", zone, e))
        })
    }

    async fn task_status(&self, task_id: &TaskId) -> Result<TaskStatus> {
        let path = format!("/tasks/{}", urlencoding::encode(task_id.as_str()));
        let response = self.request(Method::GET, &path, &[], None).await?;
        response.json().await.map_err(|e| {
            Error::InvalidResponse(format!("malformed status for task {}: {}", task_id, e))
        })
    }

    async fn task_result(&self, task_id: &TaskId) -> Result<Value> {
        let path = format!("/tasks/{}/result", urlencoding::encode(task_id.as_str()));
        let response = self.request(Method::GET, &path, &[], None).await?;
        response.json().await.map_err(|e| {
            Error::InvalidResponse(format!("malformed result for task {}: {}", task_id, e))
        })
    }
}

fn build_http_client(config: &Config) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(config.request_timeout)
        .user_agent(concat!("zone-snapshot/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

fn normalize_base_url(api_url: &str) -> Result<String> {
    url::Url::parse(api_url).map_err(|e| {
        Error::config("api_url", format!("'{}' is not a valid URL: {}", api_url, e))
    })?;
    Ok(api_url.trim_end_matches('/').to_string())
}

fn zone_path(zone: &str, action: &str) -> String {
    format!("/v1/zones/{}/{}", urlencoding::encode(zone), action)
}

fn task_id_from_body(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["task_id", "taskId"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

async fn check_status(
    method: &Method,
    path: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        method: method.to_string(),
        path: path.to_string(),
        body,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ZoneListResponse {
    #[serde(default)]
    zones: Vec<ZoneRecord>,
    #[serde(default)]
    cursor_info: Option<CursorInfo>,
}

#[derive(Deserialize)]
struct ZoneRecord {
    properties: ZoneProperties,
}

#[derive(Deserialize)]
struct ZoneProperties {
    name: String,
}

#[derive(Deserialize)]
struct CursorInfo {
    #[serde(default)]
    next: Option<String>,
}

impl From<ZoneListResponse> for ZonePage {
    fn from(listing: ZoneListResponse) -> Self {
        ZonePage {
            zones: listing
                .zones
                .into_iter()
                .map(|z| z.properties.name)
                .collect(),
            next_cursor: listing
                .cursor_info
                .and_then(|c| c.next)
                .filter(|next| !next.is_empty()),
        }
    }
}
