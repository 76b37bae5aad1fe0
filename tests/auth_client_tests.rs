//! Integration tests for bearer attachment and token refresh

use blogsite_client::{
    ApiRequest, AuthClient, AuthClientConfig, ClientError, MemoryStorage, RefreshCoalescer, Storage,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PREFIX: &str = "/api/v1.0/blogsite";

type Redirects = Arc<Mutex<Vec<String>>>;

fn client_for(server: &MockServer) -> (AuthClient, Redirects) {
    client_with_storage(server, Arc::new(MemoryStorage::new()), Arc::new(RefreshCoalescer::new()))
}

fn client_with_storage(
    server: &MockServer,
    storage: Arc<dyn Storage>,
    refresh: Arc<RefreshCoalescer>,
) -> (AuthClient, Redirects) {
    let redirects: Redirects = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&redirects);

    let config = AuthClientConfig::new(&server.uri()).unwrap();
    let client = AuthClient::builder(config)
        .storage(storage)
        .refresh_coalescer(refresh)
        .navigator(Arc::new(move |path: &str| {
            sink.lock().unwrap().push(path.to_string());
        }))
        .build()
        .unwrap();

    (client, redirects)
}

fn endpoint(rest: &str) -> String {
    format!("{PREFIX}{rest}")
}

async fn mount_refresh(server: &MockServer, token: &str, delay: Duration, expected: u64) {
    Mock::given(method("POST"))
        .and(path(endpoint("/user/refresh")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": token, "username": "alice" }))
                .set_delay(delay),
        )
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_get(server: &MockServer, route: &str, token: &str, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path(endpoint(route)))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_stored_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    mount_get(&server, "/blogs/all", "T1", ResponseTemplate::new(200).set_body_json(json!([])), 1).await;

    let (client, _) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let blogs = client.all_blogs().await.unwrap();
    assert!(blogs.is_empty());
}

#[tokio::test]
async fn test_no_authorization_header_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint("/categories")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (client, _) = client_for(&server);
    client.categories().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_401_refreshes_and_retries_with_new_token() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 1).await;
    mount_refresh(&server, "T2", Duration::ZERO, 1).await;
    mount_get(
        &server,
        "/categories",
        "T2",
        ResponseTemplate::new(200).set_body_json(json!([{ "id": 1, "name": "Tech" }])),
        1,
    )
    .await;

    let (client, redirects) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let categories = client.categories().await.unwrap();

    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].name, "Tech");
    assert_eq!(client.token_store().access_token().as_deref(), Some("T2"));
    assert!(redirects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_two_failing_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_get(&server, "/blogs/all", "T1", ResponseTemplate::new(401), 1).await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 1).await;
    mount_refresh(&server, "T2", Duration::from_millis(300), 1).await;
    mount_get(&server, "/blogs/all", "T2", ResponseTemplate::new(200).set_body_json(json!([])), 1).await;
    mount_get(
        &server,
        "/categories",
        "T2",
        ResponseTemplate::new(200).set_body_json(json!([{ "id": 3, "name": "Travel" }])),
        1,
    )
    .await;

    let (client, _) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let (blogs, categories) = tokio::join!(client.all_blogs(), client.categories());

    assert!(blogs.unwrap().is_empty());
    assert_eq!(categories.unwrap()[0].name, "Travel");

    let resubmitted = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| {
            r.headers
                .get("authorization")
                .is_some_and(|v| v.to_str().unwrap() == "Bearer T2")
        })
        .count();
    assert_eq!(resubmitted, 2);
}

#[tokio::test]
async fn test_many_concurrent_401s_trigger_exactly_one_refresh() {
    let server = MockServer::start().await;
    mount_get(&server, "/blogs/all", "T1", ResponseTemplate::new(401), 5).await;
    mount_refresh(&server, "T2", Duration::from_millis(300), 1).await;
    mount_get(&server, "/blogs/all", "T2", ResponseTemplate::new(200).set_body_json(json!([])), 5).await;

    let (client, _) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.all_blogs().await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
}

#[tokio::test]
async fn test_clients_sharing_a_coalescer_share_the_refresh() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 2).await;
    mount_refresh(&server, "T2", Duration::from_millis(300), 1).await;
    mount_get(&server, "/categories", "T2", ResponseTemplate::new(200).set_body_json(json!([])), 2).await;

    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    let refresh = Arc::new(RefreshCoalescer::new());
    let (first, _) = client_with_storage(&server, Arc::clone(&storage), Arc::clone(&refresh));
    let (second, _) = client_with_storage(&server, Arc::clone(&storage), refresh);
    first.token_store().set_access_token("T1").unwrap();

    let (a, b) = tokio::join!(first.categories(), second.categories());

    assert!(a.is_ok());
    assert!(b.is_ok());
    assert_eq!(second.token_store().access_token().as_deref(), Some("T2"));
}

#[tokio::test]
async fn test_second_401_is_passed_through() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 1).await;
    mount_refresh(&server, "T2", Duration::ZERO, 1).await;
    mount_get(&server, "/categories", "T2", ResponseTemplate::new(401).set_body_string("still no"), 1).await;

    let (client, redirects) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let result = client.categories().await;

    assert!(matches!(result, Err(ClientError::Authentication(ref msg)) if msg.contains("still no")));
    assert!(redirects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_send_returns_resubmitted_401_response() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 1).await;
    mount_refresh(&server, "T2", Duration::ZERO, 1).await;
    mount_get(&server, "/categories", "T2", ResponseTemplate::new(401), 1).await;

    let (client, _) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let response = client.send(ApiRequest::get(["categories"])).await.unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_already_retried_request_is_not_refreshed() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 1).await;
    mount_refresh(&server, "T2", Duration::ZERO, 0).await;

    let (client, _) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let request = ApiRequest::get(["categories"]).retried();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(client.token_store().access_token().as_deref(), Some("T1"));
}

#[tokio::test]
async fn test_failed_refresh_ends_session_and_redirects() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 1).await;
    Mock::given(method("POST"))
        .and(path(endpoint("/user/refresh")))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid or expired refresh token"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, redirects) = client_for(&server);
    client
        .token_store()
        .store_session("T1", "alice", &["USER".to_string()])
        .unwrap();

    let result = client.categories().await;

    match result {
        Err(ClientError::RefreshFailed(msg)) => assert!(msg.contains("Invalid or expired refresh token")),
        other => panic!("expected refresh failure, got {other:?}"),
    }
    assert!(client.token_store().access_token().is_none());
    assert!(client.token_store().username().is_none());
    assert!(client.token_store().roles().is_empty());
    assert!(client.session().is_none());
    assert_eq!(*redirects.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_other_error_statuses_skip_refresh() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(500).set_body_string("boom"), 1).await;
    mount_get(&server, "/blogs/all", "T1", ResponseTemplate::new(403), 1).await;
    mount_refresh(&server, "T2", Duration::ZERO, 0).await;

    let (client, redirects) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let categories = client.categories().await;
    assert!(matches!(categories, Err(ClientError::Status { status: 500, .. })));

    let blogs = client.all_blogs().await;
    assert!(matches!(blogs, Err(ClientError::Forbidden(_))));

    assert_eq!(client.token_store().access_token().as_deref(), Some("T1"));
    assert!(redirects.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transport_errors_propagate() {
    let config = AuthClientConfig::new("http://127.0.0.1:1")
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    let client = AuthClient::new(config).unwrap();
    client.token_store().set_access_token("T1").unwrap();

    let result = client.categories().await;

    assert!(matches!(result, Err(ClientError::HttpRequest(_))));
    assert_eq!(client.token_store().access_token().as_deref(), Some("T1"));
}

async fn mount_failed_refresh(server: &MockServer, delay: Duration, times: u64) {
    Mock::given(method("POST"))
        .and(path(endpoint("/user/refresh")))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string("Invalid or expired refresh token")
                .set_delay(delay),
        )
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_waiters_on_failed_refresh_get_the_error_and_one_redirect() {
    let server = MockServer::start().await;
    mount_get(&server, "/blogs/all", "T1", ResponseTemplate::new(401), 1).await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 1).await;
    mount_failed_refresh(&server, Duration::from_millis(300), 1).await;

    let (client, redirects) = client_for(&server);
    client
        .token_store()
        .store_session("T1", "alice", &["USER".to_string()])
        .unwrap();

    let (blogs, categories) = tokio::join!(client.all_blogs(), client.categories());

    for result in [blogs.map(|_| ()), categories.map(|_| ())] {
        match result {
            Err(ClientError::RefreshFailed(msg)) => assert!(msg.contains("Invalid or expired refresh token")),
            other => panic!("expected refresh failure, got {other:?}"),
        }
    }
    assert!(client.session().is_none());
    assert_eq!(*redirects.lock().unwrap(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_failed_refresh_does_not_block_the_next_one() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 2).await;
    mount_failed_refresh(&server, Duration::ZERO, 1).await;
    mount_refresh(&server, "T2", Duration::ZERO, 1).await;
    mount_get(&server, "/categories", "T2", ResponseTemplate::new(200).set_body_json(json!([])), 1).await;

    let (client, redirects) = client_for(&server);
    client.token_store().set_access_token("T1").unwrap();

    let first = client.categories().await;
    assert!(matches!(first, Err(ClientError::RefreshFailed(_))));
    assert!(client.token_store().access_token().is_none());

    client.token_store().set_access_token("T1").unwrap();
    let second = client.categories().await;

    assert!(second.is_ok());
    assert_eq!(client.token_store().access_token().as_deref(), Some("T2"));
    assert_eq!(redirects.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cancelled_leader_does_not_end_the_session() {
    let server = MockServer::start().await;
    mount_get(&server, "/categories", "T1", ResponseTemplate::new(401), 2).await;
    mount_refresh(&server, "T2", Duration::from_millis(500), 2).await;
    mount_get(&server, "/categories", "T2", ResponseTemplate::new(200).set_body_json(json!([])), 1).await;

    let (client, redirects) = client_for(&server);
    client
        .token_store()
        .store_session("T1", "alice", &["USER".to_string()])
        .unwrap();

    let leader = tokio::time::timeout(Duration::from_millis(150), client.categories());
    let follower = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.categories().await
    };
    let (leader, follower) = tokio::join!(leader, follower);

    assert!(leader.is_err(), "leader should have been cancelled");
    assert!(follower.unwrap().is_empty());
    assert_eq!(client.token_store().access_token().as_deref(), Some("T2"));
    assert_eq!(client.token_store().username().as_deref(), Some("alice"));
    assert!(redirects.lock().unwrap().is_empty());
}
