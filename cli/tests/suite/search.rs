use anyhow::Result;
use predicates::str::contains;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

use super::prospector_command;
use super::read_session;
use super::write_session;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_sends_the_canonical_filter_and_prints_tables() -> Result<()> {
    let home = TempDir::new()?;
    write_session(home.path())?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .and(body_json(json!({
            "industry": ["SaaS", "Fintech"],
            "roles": ["CTO"],
            "limit": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": {
                "companies": [{ "name": "Acme", "industry": "SaaS" }],
                "people": [{ "full_name": "Ada", "Designation": "CTO", "email": "ada@acme.io" }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    prospector_command(home.path(), &server)?
        .args([
            "search",
            "--industry",
            "SaaS, Fintech",
            "--roles",
            " CTO ",
            "--limit",
            "10",
        ])
        .assert()
        .success()
        .stdout(contains("Companies (1)"))
        .stdout(contains("Acme"))
        .stdout(contains("People (1)"))
        .stdout(contains("ada@acme.io"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn search_without_a_session_fails_before_any_request() -> Result<()> {
    let home = TempDir::new()?;
    let server = MockServer::start().await;

    prospector_command(home.path(), &server)?
        .arg("search")
        .assert()
        .failure()
        .stderr(contains("Not logged in"));

    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_session_is_cleared_and_reported() -> Result<()> {
    let home = TempDir::new()?;
    write_session(home.path())?;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    prospector_command(home.path(), &server)?
        .args(["search", "--industry", "SaaS"])
        .assert()
        .failure()
        .stderr(contains("Session expired"))
        .stderr(contains("Search failed"));

    assert_eq!(read_session(home.path())?, None);
    Ok(())
}
