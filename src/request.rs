use crate::{locale::Locale, response::Resp, status::StatusKind};
use axum::{
    extract::{FromRef, FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

/// A request DTO that can be turned into its domain value once validated.
pub trait IntoDomain: DeserializeOwned + Validate + Send {
    type Domain: Send;

    fn into_domain(self) -> Self::Domain;
}

/// Binds the JSON body as `R`, validates it and yields `R::Domain`.
pub struct BodyToDomain<R: IntoDomain>(pub R::Domain);

/// Same as [`BodyToDomain`] for the matched route params.
pub struct PathToDomain<R: IntoDomain>(pub R::Domain);

/// Same as [`BodyToDomain`] for the query string.
pub struct QueryToDomain<R: IntoDomain>(pub R::Domain);

impl<S, R> FromRequest<S> for BodyToDomain<R>
where
    R: IntoDomain,
    Arc<Locale>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Arc::<Locale>::from_ref(state);
        let Json(dto) = Json::<R>::from_request(req, state)
            .await
            .map_err(|rej| reject(locale.clone(), rej.body_text()))?;
        validated(dto, locale).map(Self)
    }
}

impl<S, R> FromRequestParts<S> for PathToDomain<R>
where
    R: IntoDomain,
    Arc<Locale>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Arc::<Locale>::from_ref(state);
        let Path(dto) = Path::<R>::from_request_parts(parts, state)
            .await
            .map_err(|rej| reject(locale.clone(), rej.body_text()))?;
        validated(dto, locale).map(Self)
    }
}

impl<S, R> FromRequestParts<S> for QueryToDomain<R>
where
    R: IntoDomain,
    Arc<Locale>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Arc::<Locale>::from_ref(state);
        let Query(dto) = Query::<R>::from_request_parts(parts, state)
            .await
            .map_err(|rej| reject(locale.clone(), rej.body_text()))?;
        validated(dto, locale).map(Self)
    }
}

fn validated<R: IntoDomain>(dto: R, locale: Arc<Locale>) -> Result<R::Domain, Response> {
    dto.validate()
        .map_err(|errs| reject(locale, validation_message(&errs)))?;
    Ok(dto.into_domain())
}

fn reject(locale: Arc<Locale>, reason: String) -> Response {
    Resp::new(locale)
        .status(StatusKind::Validate)
        .err(reason)
        .into_response()
}

/// Names the first offending field (by name) in its JSON spelling.
fn validation_message(errs: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errs
        .field_errors()
        .keys()
        .map(|k| camel_case(k))
        .collect();
    fields.sort();
    match fields.first() {
        Some(field) => format!("validation failed for the {field} field."),
        None => errs.to_string(),
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
