mod app;
mod config;
mod db;
mod domain;
mod dto;
mod error;
mod handlers;
mod locale;
mod logger;
mod metrics;
mod middleware;
mod openapi;
mod repository;
mod request;
mod response;
mod server;
mod state;
mod status;
mod usecase;

use crate::{
    config::Config, db::Database, error::AppError, locale::Locale, logger::Logger,
    server::HttpServer, state::AppState,
};

fn main() {
    let cfg = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[config] {e}");
            std::process::exit(1);
        }
    };

    // chrono::Local reads TZ; set it before any worker thread exists
    std::env::set_var("TZ", &cfg.service.timezone);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("[runtime] {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cfg)) {
        eprintln!("[{}] {e}", env!("CARGO_PKG_NAME"));
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<(), AppError> {
    let logger = Logger::init(&cfg.service)?;
    tracing::info!(
        name = %cfg.service.name,
        env = %cfg.service.env,
        timezone = %cfg.service.timezone,
        pool_max = cfg.database.max_open_connections,
        pool_min = cfg.database.max_idle_connections,
        connect_timeout_ms = cfg.database.connect_timeout.as_millis(),
        acquire_timeout_ms = cfg.database.acquire_timeout.as_millis(),
        "starting"
    );

    let result = serve(cfg).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "startup failed");
    }
    logger.stop();
    result
}

async fn serve(cfg: Config) -> Result<(), AppError> {
    let locale = Locale::new(&cfg.service.locale)?;
    tracing::info!(locale = locale.lang(), "locale loaded");

    let db = Database::connect(&cfg.database).await?;
    if let Err(e) = db.migrate(&cfg.service.migrations_dir).await {
        db.stop().await;
        return Err(e);
    }

    let state = match AppState::new(cfg.clone(), db.clone(), locale) {
        Ok(state) => state,
        Err(e) => {
            db.stop().await;
            return Err(e);
        }
    };
    let router = app::build_router(state);

    let server = match HttpServer::start(&cfg, router).await {
        Ok(server) => server,
        Err(e) => {
            db.stop().await;
            return Err(e);
        }
    };

    server::shutdown_signal().await;

    server.stop().await;
    db.stop().await;
    Ok(())
}

#[cfg(test)]
mod app_tests;
