use crate::{config::SwaggerConfig, locale::Locale, response::Resp, status::StatusKind};
use axum::{
    extract::{Request, State},
    http::{
        header::{
            ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE,
            ORIGIN, WWW_AUTHENTICATE,
        },
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use regex::Regex;
use std::{any::Any, sync::Arc, sync::LazyLock, time::Duration};
use tower_http::cors::{Any as AnyOrigin, CorsLayer};

pub const JWT_HEADER: &str = "jwt-token";

const CORS_MAX_AGE: Duration = Duration::from_secs(21600);

static JWT_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$").expect("jwt pattern compiles")
});

pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_headers([
            CONTENT_TYPE,
            CONTENT_LENGTH,
            ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            AUTHORIZATION,
            ACCEPT,
            ORIGIN,
            CACHE_CONTROL,
            HeaderName::from_static("x-requested-with"),
        ])
        .allow_methods([
            Method::POST,
            Method::GET,
            Method::OPTIONS,
            Method::PUT,
            Method::DELETE,
        ])
        .max_age(CORS_MAX_AGE)
}

/// Rejects requests carrying a `jwt-token` header that is not shaped like a JWT.
/// Requests without the header pass; signatures are not checked.
pub async fn check_auth(State(locale): State<Arc<Locale>>, req: Request, next: Next) -> Response {
    if let Some(raw) = req.headers().get(JWT_HEADER) {
        let well_formed = raw
            .to_str()
            .map(|v| is_jwt(strip_bearer(v)))
            .unwrap_or(false);
        if !well_formed {
            tracing::warn!(uri = %req.uri(), "malformed jwt-token header");
            return Resp::new(locale)
                .status(StatusKind::Unauthorized)
                .into_response();
        }
    }
    next.run(req).await
}

fn strip_bearer(value: &str) -> &str {
    let value = value.trim();
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => &value[7..],
        _ => value,
    }
}

fn is_jwt(token: &str) -> bool {
    !token.is_empty() && JWT_SHAPE.is_match(token)
}

/// HTTP Basic auth in front of the API docs.
pub async fn swagger_auth(
    State(cfg): State<Arc<SwaggerConfig>>,
    req: Request,
    next: Next,
) -> Response {
    if basic_credentials_match(req.headers(), &cfg.username, &cfg.password) {
        return next.run(req).await;
    }
    tracing::warn!(uri = %req.uri(), "swagger authentication failed");
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, HeaderValue::from_static("Basic realm=\"swagger\""))],
    )
        .into_response()
}

fn basic_credentials_match(headers: &HeaderMap, username: &str, password: &str) -> bool {
    let Some(encoded) = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
    else {
        return false;
    };
    let Some(credentials) = BASE64
        .decode(encoded.trim())
        .ok()
        .and_then(|d| String::from_utf8(d).ok())
    else {
        return false;
    };
    let Some((user, pass)) = credentials.split_once(':') else {
        return false;
    };
    // evaluate both so timing does not reveal which one failed
    let user_ok = constant_time_eq(user.as_bytes(), username.as_bytes());
    let pass_ok = constant_time_eq(pass.as_bytes(), password.as_bytes());
    user_ok & pass_ok
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Panic recovery handler: logs the payload and answers with a 500 envelope.
pub fn panic_response(locale: Arc<Locale>) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone {
    move |err: Box<dyn Any + Send + 'static>| {
        let detail = if let Some(s) = err.downcast_ref::<String>() {
            s.clone()
        } else if let Some(s) = err.downcast_ref::<&str>() {
            (*s).to_string()
        } else {
            "unknown panic payload".to_string()
        };
        tracing::error!(panic = %detail, "handler panicked");

        let mut envelope = Resp::new(locale.clone())
            .status(StatusKind::Failed)
            .into_envelope();
        envelope.status = StatusCode::INTERNAL_SERVER_ERROR.as_u16();
        (StatusCode::INTERNAL_SERVER_ERROR, Json(envelope)).into_response()
    }
}
