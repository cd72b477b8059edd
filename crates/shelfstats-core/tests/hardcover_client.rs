mod stub;

use serde_json::Value;
use shelfstats_core::api::{ApiError, HardcoverClient, ProgressApi};
use shelfstats_core::progress::{MatchPolicy, ProgressLookup};
use stub::StubServer;

const READING_LIST: &str = r#"{"data": {"user_books": [
    {"book": {"id": 11, "title": "Dune", "pages": 600,
              "image": {"url": "https://img.example/dune.jpg"},
              "contributions": [{"author": {"name": "Frank Herbert"}}]},
     "user_book_reads": [{"finished_at": null, "progress_pages": 103, "edition": {"pages": 412}}]},
    {"book": {"id": 12, "title": "Солярис", "pages": 256,
              "contributions": [{"author": {"name": "Станислав Лем"}}]},
     "user_book_reads": [{"finished_at": null, "progress_pages": 64, "edition": null}]}
]}}"#;

fn graphql_endpoint(server: &StubServer) -> String {
    format!("{}/api/proxy/v1/graphql", server.base_url)
}

#[tokio::test]
async fn posts_query_with_variables_and_keys() {
    let server = StubServer::spawn(|_| (200, READING_LIST.to_string()));
    let client = HardcoverClient::with_endpoint(&graphql_endpoint(&server)).unwrap();

    let books = client.currently_reading("secret", "4242").await.unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].title, "Dune");
    assert_eq!(books[0].author, "Frank Herbert");
    assert_eq!(books[0].cover_url.as_deref(), Some("https://img.example/dune.jpg"));
    assert_eq!(books[0].current_page, 103);
    assert_eq!(books[0].total_pages, 412);
    assert_eq!(books[1].total_pages, 256);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.url, "/api/proxy/v1/graphql");
    assert_eq!(request.header("Authorization"), Some("Bearer secret"));
    assert_eq!(request.header("X-API-Key"), Some("secret"));

    let body: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["variables"]["userId"], 4242);
    assert_eq!(body["variables"]["statusId"], 2);
    assert!(body["query"].as_str().unwrap().contains("user_books"));
}

#[tokio::test]
async fn graphql_errors_on_success_status() {
    let server = StubServer::spawn(|_| {
        (
            200,
            r#"{"errors": [{"message": "field 'user_books' not found"}]}"#.to_string(),
        )
    });
    let client = HardcoverClient::with_endpoint(&graphql_endpoint(&server)).unwrap();

    let err = client.currently_reading("secret", "1").await.unwrap_err();
    match err.downcast_ref::<ApiError>() {
        Some(ApiError::GraphQl(message)) => assert!(message.contains("user_books")),
        other => panic!("expected GraphQl error, got {:?}", other),
    }
}

#[tokio::test]
async fn unauthorized_status() {
    let server = StubServer::spawn(|_| (401, r#"{"error": "invalid token"}"#.to_string()));
    let client = HardcoverClient::with_endpoint(&graphql_endpoint(&server)).unwrap();

    let err = client.currently_reading("stale", "1").await.unwrap_err();
    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)));
}

#[tokio::test]
async fn lookup_returns_snapshot_of_first_book() {
    let server = StubServer::spawn(|_| (200, READING_LIST.to_string()));
    let client = HardcoverClient::with_endpoint(&graphql_endpoint(&server)).unwrap();
    let lookup = ProgressLookup::new(Box::new(client), Some("4242".to_string()));

    let snapshot = lookup
        .lookup("Солярис", "Станислав Лем", Some("secret"))
        .await
        .unwrap();
    // Default policy ignores the local title
    assert_eq!(snapshot.title, "Dune");
    assert_eq!(snapshot.percentage, 25);
}

#[tokio::test]
async fn lookup_by_title_picks_matching_book() {
    let server = StubServer::spawn(|_| (200, READING_LIST.to_string()));
    let client = HardcoverClient::with_endpoint(&graphql_endpoint(&server)).unwrap();
    let lookup = ProgressLookup::new(Box::new(client), Some("4242".to_string()))
        .with_policy(MatchPolicy::TitleOrAuthor);

    let snapshot = lookup
        .lookup("Солярис", "Станислав Лем", Some("secret"))
        .await
        .unwrap();
    assert_eq!(snapshot.title, "Солярис");
    assert_eq!(snapshot.percentage, 25);
}

#[tokio::test]
async fn lookup_swallows_server_errors() {
    let server = StubServer::spawn(|_| (500, "boom".to_string()));
    let client = HardcoverClient::with_endpoint(&graphql_endpoint(&server)).unwrap();
    let lookup = ProgressLookup::new(Box::new(client), Some("4242".to_string()));

    assert!(lookup.lookup("Dune", "Frank Herbert", Some("secret")).await.is_none());
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn lookup_without_key_makes_no_request() {
    let server = StubServer::spawn(|_| (200, READING_LIST.to_string()));
    let client = HardcoverClient::with_endpoint(&graphql_endpoint(&server)).unwrap();
    let lookup = ProgressLookup::new(Box::new(client), Some("4242".to_string()));

    assert!(lookup.lookup("Dune", "Frank Herbert", None).await.is_none());
    assert!(lookup.lookup("Dune", "Frank Herbert", Some("  ")).await.is_none());
    assert!(server.requests().is_empty());
}
