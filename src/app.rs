use crate::{
    handlers,
    metrics,
    middleware::{check_auth, cors, panic_response},
    openapi,
    state::AppState,
};
use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    timeout::{RequestBodyTimeoutLayer, TimeoutLayer},
    trace::TraceLayer,
};
use tracing::Level;

pub fn build_router(state: AppState) -> Router {
    let cfg = state.config.clone();
    let env = cfg.service.env.clone();

    let todo = Router::new()
        .route("/create", post(handlers::create))
        .route("/list", get(handlers::list))
        .route("/{uuid}", get(handlers::detail))
        .route_layer(middleware::from_fn_with_state(
            state.locale.clone(),
            check_auth,
        ));

    let mut router = Router::new()
        .route("/handshake", get(handlers::handshake))
        .route("/metrics", get(handlers::metrics_endpoint))
        .nest("/api/v1/todo", todo);

    if cfg.swagger.enable {
        router = router.merge(openapi::routes(Arc::new(cfg.swagger.clone())));
    }

    router
        // Metrics (uses MatchedPath to avoid cardinality explosion)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            metrics::metrics_middleware,
        ))
        // HTTP request logging
        .layer(
            TraceLayer::new_for_http().make_span_with(move |req: &axum::http::Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri(),
                    env = %env,
                )
            }),
        )
        // outermost first
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(panic_response(state.locale.clone())))
                .layer(cors())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    cfg.http.write_timeout,
                ))
                .layer(RequestBodyTimeoutLayer::new(cfg.http.read_timeout)),
        )
        .with_state(state)
}
