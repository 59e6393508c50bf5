use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use console_client::{records::RecordsQuery, topics::OffsetSpec, Client, Error, ErrorKind};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

type Queries = Arc<Mutex<Vec<BTreeMap<String, String>>>>;

struct TestServer {
    base_url: url::Url,
    queries: Queries,
    _shutdown_tx: tokio::sync::oneshot::Sender<()>,
}

impl TestServer {
    async fn start() -> Self {
        let queries = Queries::default();
        let router = Router::new()
            .route("/api/kafkas/{kafka}/topics", get(list_topics))
            .route("/api/kafkas/{kafka}/topics/{topic}", get(describe_topic))
            .route("/api/kafkas/{kafka}/topics/{topic}/records", get(list_records))
            .route(
                "/api/kafkas/{kafka}/topics/{topic}/consumerGroups",
                get(list_consumer_groups),
            )
            .with_state(queries.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test server");
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        Self {
            base_url: url::Url::parse(&format!("http://{addr}/")).unwrap(),
            queries,
            _shutdown_tx: shutdown_tx,
        }
    }

    fn client(&self) -> Client {
        Client::new(&self.base_url, "console-client-tests")
    }

    fn last_query(&self) -> BTreeMap<String, String> {
        self.queries.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

fn topic_fixture(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "type": "topics",
        "attributes": {
            "name": name,
            "internal": false,
            "partitions": [
                {"partition": 0, "leaderId": 1, "replicas": [{"nodeId": 1, "inSync": true}], "recordCount": 3},
            ],
            "authorizedOperations": ["READ"],
            "configs": {
                "meta": {"type": "error"},
                "title": "Unable to describe configs",
            },
        },
    })
}

async fn list_topics(
    State(queries): State<Queries>,
    Path(kafka): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    queries.lock().unwrap().push(query);

    if kafka != "k1" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"errors": [{"status": "404", "code": "4041", "title": "Resource not found", "detail": "No such cluster"}]})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "data": [
                {"id": "t1", "type": "topics", "attributes": {"name": "orders", "internal": false, "partitions": []}},
                {"id": "t2", "type": "topics", "attributes": {"name": "__consumer_offsets", "internal": true, "partitions": []}},
            ],
        })),
    )
}

async fn describe_topic(
    State(queries): State<Queries>,
    Path((_kafka, topic)): Path<(String, String)>,
    Query(query): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    queries.lock().unwrap().push(query);

    match topic.as_str() {
        // Missing `internal`, which is required.
        "malformed" => Json(json!({"data": {"id": "m", "type": "topics", "attributes": {"name": "m"}}})),
        _ => Json(json!({"data": topic_fixture(&topic, "orders")})),
    }
}

async fn list_records(
    State(queries): State<Queries>,
    Query(query): Query<BTreeMap<String, String>>,
) -> impl IntoResponse {
    queries.lock().unwrap().push(query);

    Json(json!({
        "data": [
            {
                "type": "records",
                "attributes": {
                    "partition": 0,
                    "offset": 301,
                    "timestamp": "2024-01-02T03:04:06Z",
                    "headers": {},
                    "key": "k",
                    "value": "v",
                    "size": 2,
                },
            },
        ],
    }))
}

async fn list_consumer_groups() -> impl IntoResponse {
    Json(json!({
        "data": [
            {"id": "billing", "type": "consumerGroups", "attributes": {"state": "STABLE", "members": [{}, {}]}},
        ],
    }))
}

#[tokio::test]
async fn topics_are_listed_and_described() {
    let server = TestServer::start().await;
    let client = server.client();

    let topics = client.list_topics("k1").await.unwrap();
    let names: Vec<_> = topics.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["orders", "__consumer_offsets"]);
    assert_eq!(
        server.last_query().get("fields[topics]").map(String::as_str),
        Some(console_client::topics::LIST_FIELDS)
    );

    let topic = client
        .describe_topic("k1", "t1", Some(OffsetSpec::Latest))
        .await
        .unwrap();
    assert_eq!(topic.id, "t1");
    assert_eq!(topic.record_count(), Some(3));
    // A field-level error doesn't fail the document.
    assert_eq!(
        topic.attributes.configs.error().map(|e| e.title.as_str()),
        Some("Unable to describe configs")
    );
    assert_eq!(
        server.last_query().get("offsetSpec").map(String::as_str),
        Some("latest")
    );
}

#[tokio::test]
async fn records_query_is_sent_as_filters() {
    let server = TestServer::start().await;
    let client = server.client();

    let query = RecordsQuery {
        partition: Some(0),
        limit: 25,
        offset: Some(300),
        timestamp: None,
    };
    let messages = client.list_records("k1", "t1", &query).await.unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].offset, 301);

    let sent = server.last_query();
    assert_eq!(sent["page[size]"], "25");
    assert_eq!(sent["filter[partition]"], "0");
    assert_eq!(sent["filter[offset]"], "gte,300");
    assert!(!sent.contains_key("filter[timestamp]"));
}

#[tokio::test]
async fn consumer_groups_are_listed() {
    let server = TestServer::start().await;

    let groups = server
        .client()
        .list_topic_consumer_groups("k1", "t1")
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, "billing");
    assert_eq!(groups[0].member_count(), 2);
}

#[tokio::test]
async fn malformed_responses_fail_validation() {
    let server = TestServer::start().await;

    let err = server
        .client()
        .describe_topic("k1", "malformed", None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaValidation);
    assert!(matches!(&err, Error::Schema(e) if e.resource == "topic"));
}

#[tokio::test]
async fn error_documents_are_decoded() {
    let server = TestServer::start().await;

    let err = server.client().list_topics("nope").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(err.is_not_found());
    let Error::Status { errors, .. } = &err else {
        panic!("expected a status error, got {err:?}");
    };
    assert_eq!(errors[0].code.as_deref(), Some("4041"));
}

#[tokio::test]
async fn unreachable_servers_are_network_errors() {
    // Bind and immediately drop a listener, so that its port is closed.
    let addr = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap();
    let client = Client::new(
        &url::Url::parse(&format!("http://{addr}/")).unwrap(),
        "console-client-tests",
    );

    let err = client.list_topics("k1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
}
