//! Integration tests for REST API endpoints
//!
//! Each test builds a router over memory stores and drives it in-process.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use modelres_sdk::{
    Attributes, ExposedAttributes, FieldType, MemoryStore, Record, RecordStore, ResourceBuilder,
    ResourceConfig, Schema, SchemaField, Value,
};
use modelres_server::{
    create_router, AppState, InterceptorPipeline, ReadOnly, RequestLogger, ResourceRegistry,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn host_schema() -> Schema {
    Schema::new("Host")
        .add_field(SchemaField::new("id", FieldType::Number))
        .add_field(SchemaField::new("ip", FieldType::String).required().unique())
        .add_field(SchemaField::new("user", FieldType::String))
        .add_field(SchemaField::new("port", FieldType::Number).with_default(22.0))
}

async fn host_store() -> Arc<dyn RecordStore> {
    let rows = [
        ("10.0.0.1", "frank", 22.0),
        ("10.0.0.2", "anna", 80.0),
        ("10.0.0.3", "frank", 80.0),
        ("10.0.0.4", "zoe", 443.0),
        ("10.0.0.5", "anna", 22.0),
        ("10.0.0.6", "zoe", 80.0),
    ]
    .into_iter()
    .map(|(ip, user, port)| {
        Attributes::new()
            .with("ip", ip)
            .with("user", user)
            .with("port", port)
    })
    .collect();
    Arc::new(MemoryStore::with_rows(host_schema(), rows).await.unwrap())
}

fn users(records: &[Record]) -> Result<Value, String> {
    let mut names: Vec<String> = records
        .iter()
        .filter_map(|record| record.get("user").and_then(Value::as_str))
        .map(str::to_string)
        .collect();
    names.sort();
    names.dedup();
    Ok(Value::Array(names.into_iter().map(Value::from).collect()))
}

/// `hosts` is writable, `archive` is read-only, `broken` has a failing
/// exposed attribute
async fn create_test_app() -> Router {
    let hosts = ResourceBuilder::new("hosts", host_store().await)
        .with_config(ResourceConfig::default().with_max_objects(4))
        .endpoint("users", users)
        .build()
        .unwrap();
    let archive = ResourceBuilder::new("archive", host_store().await)
        .endpoint("users", users)
        .build()
        .unwrap();
    let broken = ResourceBuilder::new("broken", host_store().await)
        .with_config(ResourceConfig::default().expose("label"))
        .with_exposed_attributes(
            ExposedAttributes::new()
                .register("label", |_: &Record| Err::<Value, _>("no label".to_string())),
        )
        .build()
        .unwrap();

    let registry = ResourceRegistry::new()
        .with_resource(hosts)
        .with_resource(archive)
        .with_resource(broken);
    let interceptors = InterceptorPipeline::new()
        .with(RequestLogger)
        .with(ReadOnly::new(["archive"]));

    create_router(AppState::new(registry, interceptors))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, Option<serde_json::Value>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        None
    } else {
        Some(serde_json::from_slice(&bytes).unwrap())
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(app, Method::GET, uri, None).await;
    (status, body.unwrap_or(serde_json::Value::Null))
}

fn ids(body: &serde_json::Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_i64().unwrap())
        .collect()
}

// ============================================================================
// Read endpoints
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app().await;
    let (status, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["resources"], json!(["archive", "broken", "hosts"]));
}

#[tokio::test]
async fn test_length_is_a_bare_number() {
    let app = create_test_app().await;

    let (status, body) = get(&app, "/resources/hosts/length").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(6));

    let (_, body) = get(&app, "/resources/hosts/length?user=frank&format=json").await;
    assert_eq!(body, json!(2));
}

#[tokio::test]
async fn test_list_with_conditions() {
    let app = create_test_app().await;
    let (status, body) = get(
        &app,
        "/resources/hosts/list?conditions=user%3Dp1%20OR%20user%3Dp2&parameters=p1%3Dzoe%2Cp2%3Danna&ordering=-id",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![6, 5, 4, 2]);
}

#[tokio::test]
async fn test_list_pagination_and_cap() {
    let app = create_test_app().await;

    let (_, body) = get(&app, "/resources/hosts/list?limit=500").await;
    assert_eq!(ids(&body), vec![1, 2, 3, 4]);

    let (_, body) = get(&app, "/resources/hosts/list?ordering=-port&offset=1&limit=2").await;
    assert_eq!(ids(&body), vec![2, 3]);
    assert_eq!(body[0], json!({"id": 2, "ip": "10.0.0.2", "user": "anna", "port": 80}));
}

#[tokio::test]
async fn test_list_client_errors() {
    let app = create_test_app().await;

    let (status, body) = get(&app, "/resources/hosts/list?ordering=user,port").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "This model cannot be ordered by more than 1 parameter(s). You tried to order by 2 parameters."
    );

    let (status, body) = get(&app, "/resources/hosts/list?ghost=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot resolve keyword 'ghost' into field");

    let (status, _) = get(&app, "/resources/hosts/list?conditions=user%3Dp%20AND&parameters=p%3Dzoe").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_overlong_condition_is_bad_request() {
    let app = create_test_app().await;
    let conditions = vec!["user%3Dp"; 5_000].join("%20OR%20");
    let uri = format!("/resources/hosts/list?conditions={}&parameters=p%3Dzoe", conditions);

    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("may not contain more than 256 terms"));
}

#[tokio::test]
async fn test_show_multi_get() {
    let app = create_test_app().await;

    let (status, body) = get(&app, "/resources/hosts?pk=3&pk=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 3]);

    let (status, body) = get(&app, "/resources/hosts").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "The request must specify a pk argument");

    let (status, body) = get(&app, "/resources/hosts?pk=1&pk=2&pk=3&pk=4&pk=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Requests may not specify more than 4 records to return (asked for 5)."
    );
}

#[tokio::test]
async fn test_form_endpoint() {
    let app = create_test_app().await;
    let (status, body) = get(&app, "/resources/hosts/form").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Host");
    assert_eq!(body["primary_key"], "id");
    let names: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["ip", "user", "port"]);
    assert_eq!(body["fields"][0]["required"], true);
    assert_eq!(body["fields"][2]["default"], 22);
}

#[tokio::test]
async fn test_unknown_resource() {
    let app = create_test_app().await;
    let (status, body) = get(&app, "/resources/ghosts/list").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No resource named 'ghosts'");
}

#[tokio::test]
async fn test_projection_failure_is_fatal() {
    let app = create_test_app().await;
    let (status, body) = get(&app, "/resources/broken/list").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "Failed to expose attribute 'label': no label"
    );
}

// ============================================================================
// Write endpoints
// ============================================================================

#[tokio::test]
async fn test_create() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/resources/hosts",
        Some(json!({"ip": "10.0.0.7", "user": "max"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body.unwrap(),
        json!({"id": 7, "ip": "10.0.0.7", "user": "max", "port": 22})
    );

    let (_, body) = get(&app, "/resources/hosts/length").await;
    assert_eq!(body, json!(7));
}

#[tokio::test]
async fn test_create_validation_errors() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/resources/hosts",
        Some(json!({"port": "http"})),
    )
    .await;
    let body = body.unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "The submitted data contained 2 errors.");
    assert_eq!(body["errors"]["ip"], "This field is required.");
    assert_eq!(body["errors"]["port"], "'http' is not a valid number");

    let (status, body) = send(
        &app,
        Method::POST,
        "/resources/hosts",
        Some(json!(["not", "an", "object"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.unwrap()["message"],
        "The data sent in the request was malformed"
    );
}

#[tokio::test]
async fn test_create_rejects_invalid_json() {
    let app = create_test_app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/resources/hosts")
        .header("content-type", "application/json")
        .body(Body::from("{ip:"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_single_object() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/resources/hosts?pk=2",
        Some(json!({"user": "bea", "id": 99})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["id"], 2);
    assert_eq!(body["user"], "bea");
    assert_eq!(body["port"], 80);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/resources/hosts?pk=42",
        Some(json!({"user": "bea"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body.unwrap()["message"],
        "No object with the given pk exists (asked for pk 42)."
    );
}

#[tokio::test]
async fn test_bulk_update() {
    let app = create_test_app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/resources/hosts/bulk?pk=1&pk=3",
        Some(json!({"id": 50, "port": 2222})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(ids(&body), vec![1, 3]);
    assert_eq!(body[1]["port"], 2222);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/resources/hosts/bulk?pk=1",
        Some(json!({"colour": "red"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.unwrap()["message"],
        "Request specified a non-existent field to update: colour"
    );
}

#[tokio::test]
async fn test_destroy_returns_no_content() {
    let app = create_test_app().await;

    let (status, body) = send(&app, Method::DELETE, "/resources/hosts?pk=1&pk=2", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_none());

    let (_, body) = get(&app, "/resources/hosts/length").await;
    assert_eq!(body, json!(4));

    let (status, _) = send(&app, Method::DELETE, "/resources/hosts", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, body) = get(&app, "/resources/hosts/length").await;
    assert_eq!(body, json!(4));
}

#[tokio::test]
async fn test_destroy_one() {
    let app = create_test_app().await;

    let (status, _) = send(&app, Method::DELETE, "/resources/hosts/object?pk=4", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, "/resources/hosts/object?pk=4", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        send(&app, Method::DELETE, "/resources/hosts/object?pk=5&pk=6", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body.unwrap()["message"],
        "The request must specify a single pk argument"
    );
}

#[tokio::test]
async fn test_class_endpoints() {
    let app = create_test_app().await;

    let (status, body) = get(&app, "/resources/hosts/call/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["anna", "frank", "zoe"]));

    // read-only resources still serve endpoints
    let (status, _) = get(&app, "/resources/archive/call/users").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/resources/hosts/call/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No endpoint named 'ghost' on resource 'hosts'");

    let (status, _) = get(&app, "/resources/ghosts/call/users").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_read_only_resource() {
    let app = create_test_app().await;

    let (status, _) = get(&app, "/resources/archive/list").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/resources/archive",
        Some(json!({"ip": "10.0.0.9"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body.unwrap()["message"],
        "Resource 'archive' is read-only (create not allowed)"
    );

    let (_, body) = get(&app, "/resources/archive/length").await;
    assert_eq!(body, json!(6));
}
