use anyhow::Result;
use predicates::str::contains;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::prospector_command;
use super::write_session;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn prospects_lists_saved_lists() -> Result<()> {
    let home = TempDir::new()?;
    write_session(home.path())?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prospects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "_id": "list-1", "summary": "Fintech CTOs", "created_at": "2025-01-02" },
                { "prospect_list_id": "list-2" }
            ]
        })))
        .mount(&server)
        .await;

    prospector_command(home.path(), &server)?
        .arg("prospects")
        .assert()
        .success()
        .stdout(contains("list-1"))
        .stdout(contains("Fintech CTOs"))
        .stdout(contains("list-2"))
        .stdout(contains("Prospect list"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn prospect_detail_prints_its_records() -> Result<()> {
    let home = TempDir::new()?;
    write_session(home.path())?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prospects/list-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "companies": [{ "company_name": "Globex", "country": "India" }],
            "people": []
        })))
        .mount(&server)
        .await;

    prospector_command(home.path(), &server)?
        .args(["prospects", "list-1"])
        .assert()
        .success()
        .stdout(contains("Globex"))
        .stdout(contains("India"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_prospect_list_reports_detail() -> Result<()> {
    let home = TempDir::new()?;
    write_session(home.path())?;
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/prospects/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found" })))
        .mount(&server)
        .await;

    prospector_command(home.path(), &server)?
        .args(["prospects", "nope"])
        .assert()
        .failure()
        .stderr(contains("Not found"));
    Ok(())
}
