use crate::{
    app::build_router, config::Config, openapi, repository::memory::InMemoryTodoRepository,
    state::AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create(app: &Router, description: &str) -> (StatusCode, Value) {
    send(
        app,
        post_json(
            "/api/v1/todo/create",
            json!({"description": description, "dueDate": "2025-08-07 10:11:12"}),
        ),
    )
    .await
}

#[tokio::test]
async fn handshake_returns_ok() {
    let app = build_router(AppState::for_tests());

    let (status, body) = send(&app, get("/handshake")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "OK");
    assert_eq!(body["message"], "connection established");
    assert_eq!(body["timestamp"].as_str().unwrap().len(), 19);
}

#[tokio::test]
async fn create_then_fetch() {
    let app = build_router(AppState::for_tests());

    let (status, body) = create(&app, "Buy milk").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], 201);
    assert_eq!(body["message"], "item created successfully");
    assert_eq!(body["data"]["description"], "Buy milk");
    assert_eq!(body["data"]["dueDate"], "2025-08-07T10:11:12Z");

    let id = body["data"]["uuid"].as_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let (status, body) = send(&app, get(&format!("/api/v1/todo/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["uuid"], id.as_str());
    assert_eq!(body["data"]["description"], "Buy milk");
}

#[tokio::test]
async fn create_rejects_invalid_body() {
    let app = build_router(AppState::for_tests());

    let (status, body) = send(
        &app,
        post_json("/api/v1/todo/create", json!({"description": "Buy milk"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "the request is not valid");
    assert_eq!(body["error"], "validation failed for the dueDate field.");

    let (status, body) = send(
        &app,
        post_json(
            "/api/v1/todo/create",
            json!({"description": "Buy milk", "dueDate": "tomorrow"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation failed for the dueDate field.");

    let malformed = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/todo/create")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, malformed).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn duplicate_description_conflicts() {
    let state = AppState::for_tests_with(
        Config::for_tests(),
        InMemoryTodoRepository::with_unique_description(),
    );
    let app = build_router(state);

    let (status, _) = create(&app, "Buy milk").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = create(&app, "Buy milk").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "item already exists");
    assert!(body.get("error").is_none());
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn detail_validates_and_reports_missing() {
    let app = build_router(AppState::for_tests());

    let (status, body) = send(&app, get("/api/v1/todo/not-a-uuid")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation failed for the uuid field.");

    let missing = uuid::Uuid::new_v4();
    let (status, body) = send(&app, get(&format!("/api/v1/todo/{missing}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
    assert_eq!(body["message"], "item not found");
    assert!(body.get("data").is_none());
}

#[tokio::test]
async fn list_clamps_limit() {
    let app = build_router(AppState::for_tests());
    for i in 0..55 {
        create(&app, &format!("todo {i}")).await;
    }

    let (status, body) = send(&app, get("/api/v1/todo/list?limit=1000")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["limit"], 50);
    assert_eq!(body["data"]["total"], 55);
    assert_eq!(body["data"]["pages"], 2);
    assert_eq!(body["data"]["todos"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn list_total_is_independent_of_paging() {
    let app = build_router(AppState::for_tests());
    for d in ["first", "second", "a description longer than twenty"] {
        create(&app, d).await;
    }

    let (status, body) = send(&app, get("/api/v1/todo/list?page=2&limit=2&order=asc")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["page"], 2);
    assert_eq!(data["total"], 3);
    assert_eq!(data["pages"], 2);
    let todos = data["todos"].as_array().unwrap();
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["name"], "a description longer...");
}

#[tokio::test]
async fn list_sorts_by_requested_column() {
    let app = build_router(AppState::for_tests());
    for d in ["banana", "cherry", "apple"] {
        create(&app, d).await;
    }

    let names = |body: &Value| -> Vec<String> {
        body["data"]["todos"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, body) = send(&app, get("/api/v1/todo/list?sort=description&order=asc")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), ["apple", "banana", "cherry"]);

    let (_, body) = send(&app, get("/api/v1/todo/list?sort=description&order=DESC")).await;
    assert_eq!(names(&body), ["cherry", "banana", "apple"]);
}

#[tokio::test]
async fn list_empty_is_success() {
    let app = build_router(AppState::for_tests());

    let (status, body) = send(&app, get("/api/v1/todo/list?search=nothing")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
    assert_eq!(body["data"]["todos"], json!([]));
}

#[tokio::test]
async fn list_rejects_bad_query() {
    let app = build_router(AppState::for_tests());

    let (status, body) = send(&app, get("/api/v1/todo/list?sort=password")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation failed for the sort field.");

    let (status, _) = send(&app, get("/api/v1/todo/list?page=abc")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, get("/api/v1/todo/list?order=sideways")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn malformed_jwt_is_unauthorized() {
    let app = build_router(AppState::for_tests());

    let req = Request::builder()
        .uri("/api/v1/todo/list")
        .header("jwt-token", "definitely-not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["message"], "unauthorized access");

    let req = Request::builder()
        .uri("/api/v1/todo/list")
        .header("jwt-token", "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.c2ln")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn swagger_absent_when_disabled() {
    let app = build_router(AppState::for_tests());

    let (status, _) = send(&app, get(openapi::SPEC_PATH)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get(openapi::UI_PATH)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn swagger_requires_basic_auth() {
    let mut cfg = Config::for_tests();
    cfg.swagger.enable = true;
    cfg.swagger.username = "docs".into();
    cfg.swagger.password = "s3cret".into();
    let app = build_router(AppState::for_tests_with(cfg, InMemoryTodoRepository::new()));

    let res = app.clone().oneshot(get(openapi::SPEC_PATH)).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        res.headers()[header::WWW_AUTHENTICATE],
        "Basic realm=\"swagger\""
    );

    let wrong = Request::builder()
        .uri(openapi::UI_PATH)
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", BASE64.encode("docs:wrong")),
        )
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let good = Request::builder()
        .uri(openapi::SPEC_PATH)
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", BASE64.encode("docs:s3cret")),
        )
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, good).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Todo Service");
    assert!(body["paths"]["/api/v1/todo/create"].is_object());
}

#[tokio::test]
async fn metrics_route_exposes_request_counters() {
    let app = build_router(AppState::for_tests());
    send(&app, get("/api/v1/todo/list")).await;

    let res = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("http_requests_received_total"));
    assert!(text.contains("/api/v1/todo/list"));
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = build_router(AppState::for_tests());

    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/todo/create")
        .header(header::ORIGIN, "https://app.example.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert!(res.status().is_success());
    assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.headers()[header::ACCESS_CONTROL_MAX_AGE], "21600");
}
