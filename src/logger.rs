use crate::{config::ServiceConfig, error::AppError};
use std::{
    fs::{self, File, OpenOptions},
    path::Path,
    sync::Arc,
};
use tracing::Level;
use tracing_subscriber::{
    filter::filter_fn, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Handle over the per-level log files, kept so they can be flushed on shutdown.
pub struct Logger {
    info: Arc<File>,
    err: Arc<File>,
}

impl Logger {
    /// Console gets everything the filter lets through; `info-*.log` only INFO
    /// and `err-*.log` only ERROR, both as JSON lines.
    ///
    /// `RUST_LOG` wins over `APP_LOG_LEVEL` when set.
    pub fn init(cfg: &ServiceConfig) -> Result<Self, AppError> {
        fs::create_dir_all(&cfg.log_dir)?;
        let day = chrono::Local::now().format("%Y-%m-%d");
        let info = Arc::new(open_append(&cfg.log_dir.join(format!("info-{day}.log")))?);
        let err = Arc::new(open_append(&cfg.log_dir.join(format!("err-{day}.log")))?);

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&cfg.log_level))
            .map_err(|e| AppError::invalid_config(format!("APP_LOG_LEVEL: {e}")))?;

        let console = fmt::layer().with_target(cfg.debug);

        let info_file = fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(info.clone())
            .with_filter(filter_fn(|meta| *meta.level() == Level::INFO));

        let err_file = fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(err.clone())
            .with_filter(filter_fn(|meta| *meta.level() == Level::ERROR));

        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .with(info_file)
            .with(err_file)
            .try_init()?;

        Ok(Self { info, err })
    }

    pub fn stop(&self) {
        for file in [&self.info, &self.err] {
            if let Err(e) = file.sync_all() {
                eprintln!("[logger] flush failed: {e}");
            }
        }
        eprintln!("[logger] stopped");
    }
}

fn open_append(path: &Path) -> Result<File, AppError> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn log_files_are_appended() {
        let dir = std::env::temp_dir().join(format!("todo-service-logs-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("info-test.log");
        let _ = fs::remove_file(&path);

        writeln!(open_append(&path).unwrap(), "first").unwrap();
        writeln!(open_append(&path).unwrap(), "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
