use crate::{error::ServiceError, locale::Locale, status::StatusKind};
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{fmt::Display, sync::Arc};
use utoipa::ToSchema;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// JSON body shared by every API response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    #[schema(example = 200)]
    pub status: u16,
    #[schema(example = "operation completed successfully")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Builder for an [`Envelope`]. Without an explicit status the response is `Success`.
pub struct Resp {
    locale: Arc<Locale>,
    kind: Option<StatusKind>,
    data: Option<Value>,
    error: Option<String>,
}

impl Resp {
    pub fn new(locale: Arc<Locale>) -> Self {
        Self {
            locale,
            kind: None,
            data: None,
            error: None,
        }
    }

    pub fn status(mut self, kind: StatusKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn data<T: Serialize>(mut self, data: T) -> Self {
        match serde_json::to_value(data) {
            Ok(value) => self.data = Some(value),
            Err(e) => {
                tracing::error!(error = %e, "response.data.serialize");
                self.kind = Some(StatusKind::Failed);
                self.error = Some(e.to_string());
            }
        }
        self
    }

    pub fn err(mut self, err: impl Display) -> Self {
        self.error = Some(err.to_string());
        self
    }

    /// Classifies a usecase failure. Anything other than a [`ServiceError`] is a plain `Failed`.
    /// Causes stay in the logs; only the kind reaches the client.
    pub fn service_err(mut self, err: impl Into<BoxError>) -> Self {
        let kind = match err.into().downcast::<ServiceError>() {
            Ok(se) => se.kind(),
            Err(_) => StatusKind::Failed,
        };
        self.kind = Some(kind);
        self
    }

    pub fn into_envelope(self) -> Envelope {
        let kind = self.kind.unwrap_or(StatusKind::Success);
        Envelope {
            status: kind.http_status().as_u16(),
            message: self.locale.get(kind.message_key()),
            data: self.data,
            error: self.error,
        }
    }
}

impl IntoResponse for Resp {
    fn into_response(self) -> Response {
        let kind = self.kind.unwrap_or(StatusKind::Success);
        (kind.http_status(), Json(self.into_envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn locale() -> Arc<Locale> {
        Arc::new(Locale::new("en").unwrap())
    }

    #[test]
    fn default_status_is_success() {
        let env = Resp::new(locale()).data(json!({"a": 1})).into_envelope();
        assert_eq!(env.status, 200);
        assert_eq!(env.message, "operation completed successfully");
        assert_eq!(env.data, Some(json!({"a": 1})));
        assert!(env.error.is_none());
    }

    #[test]
    fn service_error_renders_kind_only() {
        let se = ServiceError::with_cause(
            StatusKind::ItemExist,
            "duplicate key value violates unique constraint \"idx_todos_uuid\"",
        );

        let env = Resp::new(locale()).service_err(se).into_envelope();
        assert_eq!(env.status, 409);
        assert_eq!(env.message, "item already exists");
        assert!(env.error.is_none());
        assert!(env.data.is_none());
    }

    #[test]
    fn failed_serialization_is_not_overwritten_by_later_data() {
        let mut unserializable = HashMap::new();
        unserializable.insert((1, 2), "tuple keys are not JSON");

        let env = Resp::new(locale())
            .status(StatusKind::Created)
            .data(unserializable)
            .into_envelope();
        assert_eq!(env.status, 400);
        assert_eq!(env.message, "the operation failed");
        assert!(env.data.is_none());
        assert!(env.error.is_some());
    }

    #[test]
    fn foreign_error_degrades_to_failed() {
        let io = std::io::Error::other("boom");
        let env = Resp::new(locale()).service_err(io).into_envelope();
        assert_eq!(env.status, 400);
        assert_eq!(env.message, "the operation failed");
        assert!(env.error.is_none());
    }

    #[test]
    fn validation_error_text_is_kept() {
        let env = Resp::new(locale())
            .status(StatusKind::Validate)
            .err("validation failed for the description field.")
            .into_envelope();
        assert_eq!(env.status, 422);
        assert_eq!(env.message, "the request is not valid");
        assert_eq!(
            env.error.as_deref(),
            Some("validation failed for the description field.")
        );
    }

    #[test]
    fn into_response_uses_http_status() {
        let res = Resp::new(locale()).status(StatusKind::Created).into_response();
        assert_eq!(res.status(), axum::http::StatusCode::CREATED);
    }
}
