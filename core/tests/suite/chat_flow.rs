use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use core_test_support::logged_in_client;
use core_test_support::mount_chat;
use core_test_support::mount_search;
use core_test_support::request_bodies;
use core_test_support::results;
use core_test_support::wait_for_requests;
use pretty_assertions::assert_eq;
use prospector_core::FilterModel;
use prospector_core::ProspectingSession;
use prospector_core::ProspectorApi;
use prospector_core::SendOutcome;
use prospector_core::chat::CHAT_FAILED;
use prospector_core::chat::Sender;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::method;
use wiremock::matchers::path;

const DEBOUNCE: Duration = Duration::from_millis(100);

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn assistant_criteria_drive_filters_and_searches() -> Result<()> {
    let server = MockServer::start().await;
    mount_search(&server, results(json!([{ "name": "Acme" }]), json!([]))).await;
    mount_chat(
        &server,
        json!({
            "conversation_id": "conv-1",
            "reply": "Got it.\n<icp_json>\n{\"industry\": [\"SaaS\"], \"geography\": \"USA\"}\n</icp_json>",
            "results": null
        }),
    )
    .await;

    let (client, _tokens) = logged_in_client(&server);
    let api: Arc<dyn ProspectorApi> = Arc::new(client);
    let session = ProspectingSession::with_filters(api, FilterModel::with_blank_row(50), DEBOUNCE);
    wait_for_requests(&server, "/search/", 1).await;

    assert_eq!(
        session.chat().send("SaaS companies in the USA").await,
        SendOutcome::Sent
    );

    let canonical = session.filters().canonical();
    assert_eq!(canonical.industry, Some(vec!["SaaS".to_string()]));
    assert_eq!(canonical.geography, Some(vec!["USA".to_string()]));

    let searches = wait_for_requests(&server, "/search/", 3).await;
    assert_eq!(
        searches[1],
        json!({ "industry": ["SaaS"], "geography": "USA", "limit": 50 })
    );
    assert_eq!(
        searches[2],
        json!({ "industry": ["SaaS"], "geography": ["USA"], "limit": 50 })
    );

    let chats = request_bodies(&server, "/chat/").await;
    assert_eq!(chats, vec![json!({ "prompt": "SaaS companies in the USA" })]);
    assert_eq!(session.chat().conversation().id(), Some("conv-1"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn expired_session_during_chat_is_reported_inline() -> Result<()> {
    let server = MockServer::start().await;
    mount_search(&server, results(json!([]), json!([]))).await;
    Mock::given(method("POST"))
        .and(path("/chat/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, tokens) = logged_in_client(&server);
    let api: Arc<dyn ProspectorApi> = Arc::new(client);
    let session = ProspectingSession::with_filters(api, FilterModel::with_blank_row(50), DEBOUNCE);
    wait_for_requests(&server, "/search/", 1).await;

    assert_eq!(session.chat().send("hello").await, SendOutcome::Failed);

    let conversation = session.chat().conversation();
    let last = conversation.last().map(|message| (message.sender, message.text.clone()));
    assert_eq!(last, Some((Sender::Bot, CHAT_FAILED.to_string())));
    assert!(tokens.get().is_empty());
    Ok(())
}
