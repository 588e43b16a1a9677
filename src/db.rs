use crate::{config::DatabaseConfig, error::AppError, error::ServiceError};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgSslMode},
    ConnectOptions, PgConnection, PgPool, Postgres, Transaction,
};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use log::LevelFilter;

/// Postgres pool plus the migration runner.
///
/// Cheap to clone; clones share the pool and the closed flag.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    closed: Arc<AtomicBool>,
}

impl Database {
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, AppError> {
        let mut opts = connect_options(cfg)?;
        opts = if cfg.debug {
            tracing::info!("sql statement logging enabled");
            opts.log_statements(LevelFilter::Info)
        } else {
            opts.log_statements(LevelFilter::Debug)
        };
        opts = opts.log_slow_statements(LevelFilter::Warn, cfg.slow_sql_threshold);

        let pool_fut = PgPoolOptions::new()
            .max_connections(cfg.max_open_connections)
            .min_connections(cfg.max_idle_connections)
            .acquire_timeout(cfg.acquire_timeout)
            .max_lifetime(cfg.max_lifetime)
            .connect_with(opts);

        // Outer bound on startup; the pool itself only knows acquire timeouts.
        let pool = tokio::time::timeout(cfg.connect_timeout, pool_fut)
            .await
            .map_err(|_| AppError::invalid_config("DB connection timed out while creating pool"))??;

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            pool,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Non-transactional connection source.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Tx, sqlx::Error> {
        Ok(Tx {
            inner: self.pool.begin().await?,
        })
    }

    /// Applies every not yet recorded `*.sql` file under `dir`, in file name order.
    ///
    /// Each file runs as one batch inside its own transaction together with its
    /// `schema_migrations` bookkeeping row.
    pub async fn migrate(&self, dir: &Path) -> Result<(), AppError> {
        let files = migration_files(dir)?;
        if files.is_empty() {
            return Err(AppError::invalid_config(format!(
                "no migration file found in {}",
                dir.display()
            )));
        }

        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await?;

        for path in files {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM schema_migrations WHERE name = $1")
                    .bind(&name)
                    .fetch_optional(&self.pool)
                    .await?;
            if applied.is_some() {
                tracing::debug!(migration = %name, "already applied");
                continue;
            }

            let sql = std::fs::read_to_string(&path)?;
            let failed = |source: sqlx::Error| AppError::Migration {
                file: name.clone(),
                source,
            };

            let mut tx = self.pool.begin().await?;
            sqlx::raw_sql(&sql)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
            sqlx::query("INSERT INTO schema_migrations (name) VALUES ($1)")
                .bind(&name)
                .execute(&mut *tx)
                .await
                .map_err(failed)?;
            tx.commit().await.map_err(failed)?;

            tracing::info!(migration = %name, "applied");
        }

        Ok(())
    }

    /// Closes the pool once; later calls do nothing.
    pub async fn stop(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.pool.close().await;
        tracing::info!("database stopped");
    }
}

/// An open transaction. Consumed by [`Tx::commit`], [`Tx::rollback`] or [`Tx::resolve`].
pub struct Tx {
    inner: Transaction<'static, Postgres>,
}

impl Tx {
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.inner
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.inner.commit().await
    }

    pub async fn rollback(self) -> Result<(), sqlx::Error> {
        self.inner.rollback().await
    }

    /// Rolls back on `Err` (returning that error) and commits on `Ok`.
    pub async fn resolve<T>(self, outcome: Result<T, ServiceError>) -> Result<T, ServiceError> {
        match outcome {
            Ok(value) => {
                self.commit().await.map_err(|e| {
                    tracing::error!(error = %e, "db.tx.commit");
                    ServiceError::failed(e)
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(e) = self.rollback().await {
                    tracing::error!(error = %e, "db.tx.rollback");
                }
                Err(err)
            }
        }
    }
}

fn connect_options(cfg: &DatabaseConfig) -> Result<PgConnectOptions, AppError> {
    if let Some(url) = &cfg.url {
        return PgConnectOptions::from_str(url).map_err(|_| {
            AppError::invalid_config(
                "DATABASE_URL is not a valid Postgres connection string (PgConnectOptions parse failed)",
            )
        });
    }

    let ssl_mode = PgSslMode::from_str(&cfg.ssl_mode)
        .map_err(|_| AppError::invalid_config(format!("DB_SSL `{}` is not a valid sslmode", cfg.ssl_mode)))?;

    Ok(PgConnectOptions::new()
        .host(&cfg.host)
        .port(cfg.port)
        .username(&cfg.username)
        .password(&cfg.password)
        .database(&cfg.database)
        .ssl_mode(ssl_mode))
}

fn migration_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    // zero-padded names keep numeric order under a plain string sort
    files.sort();
    Ok(files)
}
