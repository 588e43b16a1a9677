//! API documentation: the OpenAPI document and its Scalar UI, both behind Basic auth.

use crate::{
    config::SwaggerConfig,
    dto::{CreateRequest, TodoListItem, TodoListResponse, TodoResponse},
    handlers::{self, Handshake},
    middleware::swagger_auth,
    response::Envelope,
};
use axum::{middleware, routing::get, Json, Router};
use std::sync::Arc;
use utoipa::{
    openapi::{Info, Server},
    OpenApi,
};
use utoipa_scalar::{Scalar, Servable};

pub const UI_PATH: &str = "/public/swagger/index.html";
pub const SPEC_PATH: &str = "/public/swagger/openapi.json";

#[derive(OpenApi)]
#[openapi(
    paths(handlers::handshake, handlers::create, handlers::detail, handlers::list),
    components(schemas(
        Envelope,
        Handshake,
        CreateRequest,
        TodoResponse,
        TodoListItem,
        TodoListResponse
    )),
    tags(
        (name = "General", description = "Service probes"),
        (name = "Todo", description = "Todo items")
    )
)]
pub struct ApiDoc;

/// The generated document with title, description, version and server taken from config.
pub fn document(cfg: &SwaggerConfig) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info = Info::builder()
        .title(cfg.title.clone())
        .version(cfg.version.clone())
        .description(Some(cfg.description.clone()))
        .build();
    doc.servers = Some(vec![Server::new(format!("{}://{}", cfg.scheme, cfg.host))]);
    doc
}

pub fn routes<S>(cfg: Arc<SwaggerConfig>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let doc = document(&cfg);
    let json = doc.clone();

    Router::new()
        .route(SPEC_PATH, get(move || async move { Json(json.clone()) }))
        .merge(Scalar::with_url(UI_PATH, doc))
        .route_layer(middleware::from_fn_with_state(cfg, swagger_auth))
}
