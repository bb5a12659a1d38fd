use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, Uri},
    routing::get,
};
use remote_pager::{
    FetchOutcome, JsonFieldMapper, LoaderError, LoaderOptions, RawResponse, RemoteLoader, Target,
    source_fn,
};
use serde_json::{Value, json};

type SeenQueries = Arc<Mutex<Vec<String>>>;

async fn spawn_backend() -> (SocketAddr, SeenQueries) {
    let seen: SeenQueries = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/items", get(items))
        .route("/slow", get(slow_items))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
        .route(
            "/broken",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "items": ["partial"], "page": 1, "totalPages": 1 })),
                )
            }),
        )
        .route("/garbage", get(|| async { "not json" }))
        .with_state(Arc::clone(&seen));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve backend");
    });
    (addr, seen)
}

fn page_from(uri: &Uri) -> u32 {
    uri.query()
        .and_then(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == "page")
                .and_then(|(_, value)| value.parse().ok())
        })
        .unwrap_or(1)
}

async fn items(State(seen): State<SeenQueries>, uri: Uri) -> Json<Value> {
    seen.lock()
        .expect("seen lock")
        .push(uri.query().unwrap_or_default().to_string());
    Json(json!({ "items": [uri.path()], "page": page_from(&uri), "totalPages": 3 }))
}

async fn slow_items(State(seen): State<SeenQueries>, uri: Uri) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(500)).await;
    items(State(seen), uri).await
}

fn loader_for(template: String, errors: Arc<Mutex<Vec<String>>>) -> RemoteLoader<Value> {
    RemoteLoader::new(
        LoaderOptions::new(Target::template(template), JsonFieldMapper::default())
            .with_debounce(Duration::ZERO)
            .with_on_error(move |err| errors.lock().expect("errors lock").push(err.to_string())),
    )
}

#[tokio::test]
async fn template_placeholders_are_encoded_and_substituted() {
    let (addr, seen) = spawn_backend().await;
    let loader = RemoteLoader::new(
        LoaderOptions::new(
            Target::template(format!(
                "http://{addr}/items?q={{query}}&page={{page}}&pageSize={{pageSize}}"
            )),
            JsonFieldMapper::default(),
        )
        .with_page_size(25),
    );

    let outcome = loader.fetch("my query", 2, true).await;
    let result = outcome.loaded().expect("page loaded").clone();

    assert_eq!(result.page, 2);
    assert_eq!(result.total_pages, 3);
    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec!["q=my%20query&page=2&pageSize=25".to_string()]
    );
}

#[tokio::test]
async fn reserved_characters_in_the_query_are_escaped() {
    let (addr, seen) = spawn_backend().await;
    let loader = loader_for(
        format!("http://{addr}/items?q={{query}}&page={{page}}"),
        Arc::default(),
    );

    loader
        .fetch("a&b=c/d+e", 1, true)
        .await
        .loaded()
        .expect("page loaded");

    assert_eq!(
        *seen.lock().expect("seen lock"),
        vec!["q=a%26b%3Dc%2Fd%2Be&page=1".to_string()]
    );
}

#[tokio::test]
async fn non_success_status_is_rejected_and_reported() {
    let (addr, _seen) = spawn_backend().await;
    let errors = Arc::new(Mutex::new(Vec::new()));
    let loader = loader_for(format!("http://{addr}/missing?q={{query}}"), Arc::clone(&errors));

    match loader.fetch("anything", 1, true).await {
        FetchOutcome::Failed(err) => {
            assert!(matches!(err, LoaderError::Status { status: 404 }));
            assert!(err.to_string().contains("404"));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    let errors = errors.lock().expect("errors lock");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("404"));
    assert!(!loader.has_cached_page("anything", 1));
}

#[tokio::test]
async fn undecodable_body_is_a_failure() {
    let (addr, _seen) = spawn_backend().await;
    let loader = loader_for(format!("http://{addr}/garbage?q={{query}}"), Arc::default());

    let outcome = loader.fetch("q", 1, true).await;
    assert!(matches!(
        outcome,
        FetchOutcome::Failed(LoaderError::Decode { .. })
    ));
}

#[tokio::test]
async fn relative_template_is_an_invalid_url() {
    let errors = Arc::new(Mutex::new(Vec::new()));
    let loader = loader_for("/items?q={query}".to_string(), Arc::clone(&errors));

    let outcome = loader.fetch("q", 1, true).await;
    assert!(matches!(
        outcome,
        FetchOutcome::Failed(LoaderError::InvalidUrl { .. })
    ));
    assert_eq!(errors.lock().expect("errors lock").len(), 1);
}

#[tokio::test]
async fn newer_request_aborts_a_slow_http_call() {
    let (addr, seen) = spawn_backend().await;
    let slow = loader_for(
        format!("http://{addr}/slow?q={{query}}&page={{page}}"),
        Arc::default(),
    );

    let first = slow.fetch("slow", 1, true);
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = slow.fetch("second", 1, true);

    assert!(first.await.is_cancelled());
    assert!(second.await.is_loaded());
    assert!(!slow.has_cached_page("slow", 1));
    assert_eq!(slow.current_query(), "second");
    assert!(
        seen.lock()
            .expect("seen lock")
            .iter()
            .any(|query| query == "q=second&page=1")
    );
}

#[tokio::test]
async fn source_http_responses_skip_the_status_check() {
    let (addr, _seen) = spawn_backend().await;
    let client = reqwest::Client::new();
    let source = source_fn(move |request| {
        let client = client.clone();
        let url = format!("http://{addr}/broken?q={}", request.query);
        async move {
            let response = client.get(url).send().await?;
            Ok::<_, LoaderError>(RawResponse::Http(response))
        }
    });
    let loader = RemoteLoader::new(
        LoaderOptions::new(Target::source(source), JsonFieldMapper::default())
            .with_debounce(Duration::ZERO),
    );

    let result = loader
        .fetch("q", 1, true)
        .await
        .loaded()
        .cloned()
        .expect("body parsed despite 500");
    assert_eq!(result.items, vec![json!("partial")]);
}
