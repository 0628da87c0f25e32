//! Mock DNS API fixtures built on wiremock

use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zone_snapshot::client::{Credentials, HttpClient};
use zone_snapshot::Config;

/// Access token handed out by [`mount_token`]
pub const ACCESS_TOKEN: &str = "access-1";

/// Config pointing at the mock server, writing into `output`
pub fn mock_config(server: &MockServer, output: &TempDir) -> Config {
    Config {
        api_url: server.uri(),
        output_dir: output.path().to_path_buf(),
        poll_interval: std::time::Duration::from_millis(10),
        ..Default::default()
    }
}

/// Password credentials accepted by [`mount_token`]
pub fn password_credentials() -> Credentials {
    Credentials::Password {
        username: "operator".to_string(),
        password: "secret".to_string(),
    }
}

/// Answer password grants with [`ACCESS_TOKEN`]
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v2/authorization/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ACCESS_TOKEN,
            "refresh_token": "refresh-1",
            "expires_in": "3600",
        })))
        .mount(server)
        .await;
}

/// Mount the token endpoint and connect a client to the mock server
pub async fn connect(server: &MockServer, output: &TempDir) -> (HttpClient, Config) {
    mount_token(server).await;
    let config = mock_config(server, output);
    let client = HttpClient::connect(&config, &password_credentials())
        .await
        .expect("connect to mock API");
    (client, config)
}

/// Answer a zone listing page
pub fn zone_page(names: &[&str], next: Option<&str>) -> Value {
    let zones: Vec<Value> = names
        .iter()
        .map(|name| json!({ "properties": { "name": name } }))
        .collect();
    match next {
        Some(next) => json!({ "zones": zones, "cursorInfo": { "next": next } }),
        None => json!({ "zones": zones, "cursorInfo": {} }),
    }
}

/// Accept a create or restore for `zone`, returning `task`
pub async fn mount_task_start(server: &MockServer, zone: &str, action: &str, task: &str) {
    Mock::given(method("POST"))
        .and(path(format!("/v1/zones/{}/{}", zone, action)))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "task_id": task })))
        .expect(1)
        .mount(server)
        .await;
}

/// Reject any request on `zone`'s `action` path with `status`
pub async fn mount_zone_status(
    server: &MockServer,
    http_method: &str,
    zone: &str,
    action: &str,
    status: u16,
) {
    Mock::given(method(http_method))
        .and(path(format!("/v1/zones/{}/{}", zone, action)))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!([{
            "errorCode": 1801,
            "errorMessage": "Zone does not exist in the system.",
        }])))
        .mount(server)
        .await;
}

/// Report `task` as finished with `code`
pub async fn mount_task_status(server: &MockServer, task: &str, code: &str, message: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/tasks/{}", task)))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "code": code, "message": message })),
        )
        .mount(server)
        .await;
}
