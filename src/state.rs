use crate::{
    config::Config, db::Database, error::AppError, locale::Locale, metrics::Metrics,
    repository::PgTodoRepository, usecase::TodoUsecase,
};
use axum::extract::FromRef;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub locale: Arc<Locale>,
    pub todos: TodoUsecase,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, db: Database, locale: Locale) -> Result<Self, AppError> {
        let todos = TodoUsecase::new(Arc::new(PgTodoRepository::new(db)));
        Ok(Self {
            config: Arc::new(config),
            locale: Arc::new(locale),
            todos,
            metrics: Arc::new(Metrics::new()?),
        })
    }

    /// Test state backed by the in-memory repository; no database needed.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self::for_tests_with(
            Config::for_tests(),
            crate::repository::memory::InMemoryTodoRepository::new(),
        )
    }

    #[cfg(test)]
    pub fn for_tests_with(
        config: Config,
        repo: crate::repository::memory::InMemoryTodoRepository,
    ) -> Self {
        Self {
            config: Arc::new(config),
            locale: Arc::new(Locale::new("en").expect("embedded en catalog")),
            todos: TodoUsecase::new(Arc::new(repo)),
            metrics: Arc::new(Metrics::new().expect("metrics registry")),
        }
    }
}

impl FromRef<AppState> for Arc<Locale> {
    fn from_ref(state: &AppState) -> Self {
        state.locale.clone()
    }
}
