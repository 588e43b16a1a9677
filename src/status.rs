use axum::http::StatusCode;
use std::fmt;

/// Outcome classes shared by the response envelope, the locale catalog and the error type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Success,
    Created,
    Updated,
    Validate,
    NotFound,
    Failed,
    Unauthorized,
    Conflict,
    ItemExist,
}

impl StatusKind {
    /// Locale key for the user-facing message.
    pub fn message_key(self) -> &'static str {
        match self {
            StatusKind::Success => "resp_done",
            StatusKind::Created => "create_done",
            StatusKind::Updated => "update_done",
            StatusKind::Validate => "validation_err",
            StatusKind::NotFound => "not_found",
            StatusKind::Failed => "resp_fail",
            StatusKind::Unauthorized => "unauthorized",
            StatusKind::Conflict => "conflict",
            StatusKind::ItemExist => "item_exist",
        }
    }

    pub fn http_status(self) -> StatusCode {
        match self {
            StatusKind::Success => StatusCode::OK,
            StatusKind::Created => StatusCode::CREATED,
            StatusKind::Updated => StatusCode::NO_CONTENT,
            StatusKind::Validate => StatusCode::UNPROCESSABLE_ENTITY,
            StatusKind::NotFound => StatusCode::NOT_FOUND,
            StatusKind::Failed => StatusCode::BAD_REQUEST,
            StatusKind::Unauthorized => StatusCode::UNAUTHORIZED,
            StatusKind::Conflict | StatusKind::ItemExist => StatusCode::CONFLICT,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicts_share_409() {
        assert_eq!(StatusKind::ItemExist.http_status(), StatusCode::CONFLICT);
        assert_eq!(StatusKind::Conflict.http_status(), StatusCode::CONFLICT);
        assert_ne!(
            StatusKind::ItemExist.message_key(),
            StatusKind::Conflict.message_key()
        );
    }

    #[test]
    fn validation_is_unprocessable() {
        assert_eq!(
            StatusKind::Validate.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(StatusKind::Failed.http_status(), StatusCode::BAD_REQUEST);
    }
}
