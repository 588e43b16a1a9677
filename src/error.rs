use crate::status::StatusKind;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Startup and infrastructure failures. Any of these aborts the process.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("migration {file} failed: {source}")]
    Migration {
        file: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logger init failed: {0}")]
    Logger(#[from] tracing_subscriber::util::TryInitError),
    #[error("metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
    #[error("locale catalog error: {0}")]
    Locale(String),
}

impl AppError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Request-path failure, classified by [`StatusKind`].
///
/// Built where the failure happens and consumed once by the response envelope.
/// The cause is kept for logs and the source chain; the envelope only shows the kind.
#[derive(Debug, thiserror::Error)]
#[error("{kind}{}", cause_suffix(.cause))]
pub struct ServiceError {
    kind: StatusKind,
    #[source]
    cause: Option<BoxError>,
}

impl ServiceError {
    pub fn new(kind: StatusKind) -> Self {
        Self { kind, cause: None }
    }

    pub fn with_cause<E>(kind: StatusKind, cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self {
            kind,
            cause: Some(cause.into()),
        }
    }

    pub fn not_found() -> Self {
        Self::new(StatusKind::NotFound)
    }

    pub fn failed<E: Into<BoxError>>(cause: E) -> Self {
        Self::with_cause(StatusKind::Failed, cause)
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }
}

fn cause_suffix(cause: &Option<BoxError>) -> String {
    cause.as_ref().map(|c| format!(": {c}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_cause() {
        let err = ServiceError::failed("connection reset");
        assert_eq!(err.to_string(), "resp_fail: connection reset");
        assert_eq!(ServiceError::not_found().to_string(), "not_found");
    }

    #[test]
    fn cause_is_the_error_source() {
        use std::error::Error;
        let err = ServiceError::failed("connection reset");
        assert_eq!(err.kind(), StatusKind::Failed);
        assert_eq!(err.source().unwrap().to_string(), "connection reset");
        assert!(ServiceError::not_found().source().is_none());
    }
}
