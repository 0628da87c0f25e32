//! End-to-end batch runs against a mock DNS API
//!
//! Each test starts a wiremock server, authenticates with password
//! credentials and drives `run_batch` or a full `Invocation` through the
//! real HTTP client.

mod common;

use common::{
    connect, mock_config, mount_task_start, mount_task_status, mount_token, mount_zone_status,
    password_credentials, zone_page,
};
use serde_json::json;
use std::fs::File;
use std::io::{Cursor, Read};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zone_snapshot::batch::TokioSleeper;
use zone_snapshot::{Error, HttpConnector, Invocation, Mode, Outcome, ZoneSource, run_batch};

fn list(names: &[&str]) -> ZoneSource {
    ZoneSource::List(names.iter().map(|n| n.to_string()).collect())
}

#[tokio::test]
async fn create_batch_completes_first_zone_and_skips_missing_one() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let (client, config) = connect(&server, &output).await;

    mount_task_start(&server, "a.com", "snapshot", "T1").await;
    mount_task_status(&server, "T1", "COMPLETE", "Snapshot created").await;
    mount_zone_status(&server, "POST", "b.com", "snapshot", 404).await;

    let report = run_batch(&client, &config, Mode::Create, &list(&["a.com", "b.com"]))
        .await
        .unwrap();

    assert_eq!(report.outcome_for("a.com"), Some(&Outcome::Success));
    assert!(matches!(
        report.outcome_for("b.com"),
        Some(Outcome::Skipped {
            status: Some(404),
            ..
        })
    ));
}

#[tokio::test]
async fn download_batch_archives_only_fetched_snapshots() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let (client, config) = connect(&server, &output).await;

    let snapshot = json!({
        "zoneName": "a.com.",
        "rrSets": [{ "ownerName": "www", "rrtype": "A (1)", "rdata": ["192.0.2.1"] }],
    });
    Mock::given(method("GET"))
        .and(path("/v1/zones/a.com/snapshot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(snapshot.clone()))
        .mount(&server)
        .await;
    mount_zone_status(&server, "GET", "b.com", "snapshot", 400).await;

    let report = run_batch(&client, &config, Mode::Download, &list(&["a.com", "b.com"]))
        .await
        .unwrap();

    let archive_path = report.archive.clone().expect("archive written");
    let name = archive_path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("snapshot-backup_") && name.ends_with(".zip"));

    let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
    assert_eq!(archive.len(), 1);
    let mut entry = archive.by_name("a.com.json").unwrap();
    let mut contents = String::new();
    entry.read_to_string(&mut contents).unwrap();
    assert_eq!(serde_json::from_str::<serde_json::Value>(&contents).unwrap(), snapshot);

    assert!(!config.scratch_dir().exists());
    assert_eq!(report.counts().skipped, 1);
}

#[tokio::test]
async fn restore_over_all_zones_follows_listing_cursor() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let (client, config) = connect(&server, &output).await;

    Mock::given(method("GET"))
        .and(path("/v3/zones"))
        .and(query_param("cursor", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zone_page(&["b.com"], None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v3/zones"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(zone_page(&["a.com"], Some("page-2"))),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    mount_task_start(&server, "a.com", "restore", "R1").await;
    mount_task_status(&server, "R1", "COMPLETE", "").await;
    mount_task_start(&server, "b.com", "restore", "R2").await;
    mount_task_status(&server, "R2", "ERROR", "Restore failed").await;

    let report = run_batch(&client, &config, Mode::Restore, &ZoneSource::Account)
        .await
        .unwrap();

    let zones: Vec<&str> = report.outcomes.iter().map(|o| o.zone.as_str()).collect();
    assert_eq!(zones, vec!["a.com", "b.com"]);
    assert_eq!(report.outcome_for("a.com"), Some(&Outcome::Success));
    assert_eq!(
        report.outcome_for("b.com"),
        Some(&Outcome::Failed {
            code: "ERROR".into(),
            message: "Restore failed".into(),
        })
    );
}

#[tokio::test]
async fn server_error_on_create_stops_remaining_zones() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let (client, config) = connect(&server, &output).await;

    mount_zone_status(&server, "POST", "a.com", "snapshot", 500).await;
    Mock::given(method("POST"))
        .and(path("/v1/zones/b.com/snapshot"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({ "task_id": "T2" })))
        .expect(0)
        .mount(&server)
        .await;

    let err = run_batch(&client, &config, Mode::Create, &list(&["a.com", "b.com"]))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BatchAborted { ref zone, .. } if zone == "a.com"));
    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn declined_confirmation_issues_no_requests() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let config = mock_config(&server, &output);
    let connector = HttpConnector::new(password_credentials());
    let invocation = Invocation {
        mode: Mode::Restore,
        source: list(&["a.com"]),
        config: &config,
        log_file: None,
    };

    let mut input = Cursor::new(b"understood\n".to_vec());
    let mut prompt = Vec::new();
    let err = invocation
        .execute(&connector, &TokioSleeper, &mut input, &mut prompt, |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Aborted(_)));
    let received = server.received_requests().await.expect("request recording enabled");
    assert!(received.is_empty());
}

#[tokio::test]
async fn confirmed_restore_connects_and_runs() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    mount_token(&server).await;
    mount_task_start(&server, "a.com", "restore", "R1").await;
    mount_task_status(&server, "R1", "COMPLETE", "").await;
    let config = mock_config(&server, &output);
    let connector = HttpConnector::new(password_credentials());
    let invocation = Invocation {
        mode: Mode::Restore,
        source: list(&["a.com"]),
        config: &config,
        log_file: None,
    };

    let mut input = Cursor::new(b"UNDERSTOOD\n".to_vec());
    let mut prompt = Vec::new();
    let report = invocation
        .execute(&connector, &TokioSleeper, &mut input, &mut prompt, |_| {})
        .await
        .unwrap();

    assert_eq!(report.outcome_for("a.com"), Some(&Outcome::Success));
    assert!(String::from_utf8(prompt).unwrap().contains("UNDERSTOOD"));
}
