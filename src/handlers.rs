use crate::{
    dto::{CreateRequest, DetailRequest, TodoListQueryRequest, TodoListResponse, TodoResponse},
    request::{BodyToDomain, PathToDomain, QueryToDomain},
    response::{Envelope, Resp},
    state::AppState,
    status::StatusKind,
};
use axum::{extract::State, response::Response, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct Handshake {
    #[schema(example = "OK")]
    pub status: &'static str,
    #[schema(example = "connection established")]
    pub message: String,
    #[schema(example = "2025-08-07 10:11:12")]
    pub timestamp: String,
}

/// Liveness probe with the server's local time.
#[utoipa::path(
    get,
    path = "/handshake",
    tag = "General",
    responses((status = 200, body = Handshake, description = "service is up"))
)]
pub async fn handshake(State(st): State<AppState>) -> Json<Handshake> {
    Json(Handshake {
        status: "OK",
        message: st.locale.get("connection_established"),
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/todo/create",
    tag = "Todo",
    request_body = CreateRequest,
    responses(
        (status = 201, body = Envelope, description = "created; `data` is a TodoResponse"),
        (status = 400, body = Envelope, description = "process failure"),
        (status = 409, body = Envelope, description = "already exists"),
        (status = 422, body = Envelope, description = "unprocessable"),
    )
)]
pub async fn create(
    State(st): State<AppState>,
    BodyToDomain(todo): BodyToDomain<CreateRequest>,
) -> Resp {
    let resp = Resp::new(st.locale.clone());
    match st.todos.create(todo).await {
        Ok(created) => resp
            .status(StatusKind::Created)
            .data(TodoResponse::from(&created)),
        Err(e) => resp.service_err(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/todo/{uuid}",
    tag = "Todo",
    params(DetailRequest),
    responses(
        (status = 200, body = Envelope, description = "`data` is a TodoResponse"),
        (status = 400, body = Envelope, description = "process failure"),
        (status = 404, body = Envelope, description = "not found"),
        (status = 422, body = Envelope, description = "malformed uuid"),
    )
)]
pub async fn detail(
    State(st): State<AppState>,
    PathToDomain(todo): PathToDomain<DetailRequest>,
) -> Resp {
    let resp = Resp::new(st.locale.clone());
    match st.todos.detail(todo.uuid()).await {
        Ok(found) => resp.data(TodoResponse::from(&found)),
        Err(e) => resp.service_err(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/todo/list",
    tag = "Todo",
    params(TodoListQueryRequest),
    responses(
        (status = 200, body = Envelope, description = "`data` is a TodoListResponse"),
        (status = 400, body = Envelope, description = "process failure"),
        (status = 422, body = Envelope, description = "invalid query"),
    )
)]
pub async fn list(
    State(st): State<AppState>,
    QueryToDomain(query): QueryToDomain<TodoListQueryRequest>,
) -> Resp {
    let resp = Resp::new(st.locale.clone());
    match st.todos.get_list(&query).await {
        Ok(page) => {
            tracing::debug!(
                total = page.total(),
                summary = %st.locale.plural(
                    "todo_count",
                    &[("count", page.total().to_string())].into_iter().collect(),
                ),
                "todo.list"
            );
            resp.data(TodoListResponse::new(&query, &page))
        }
        Err(e) => resp.service_err(e),
    }
}

pub async fn metrics_endpoint(State(st): State<AppState>) -> Response {
    st.metrics.response()
}
