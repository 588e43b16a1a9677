use crate::{config::Config, error::AppError};
use axum::Router;
use std::{io, time::Duration};
use tokio::{net::TcpListener, signal, sync::oneshot, task::JoinHandle};

/// A running HTTP listener that can be drained on demand.
pub struct HttpServer {
    task: JoinHandle<io::Result<()>>,
    stop_tx: oneshot::Sender<()>,
    stop_timeout: Duration,
    debug: bool,
}

impl HttpServer {
    pub async fn start(cfg: &Config, router: Router) -> Result<Self, AppError> {
        let addr = cfg.http.addr();
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!(%addr, tls = cfg.http.tls, "listening");
        if cfg.http.tls {
            tracing::warn!("HTTP_TLS is set; TLS must be terminated in front of this listener");
        }

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = stop_rx.await;
                })
                .await
        });

        Ok(Self {
            task,
            stop_tx,
            stop_timeout: cfg.service.stop_timeout,
            debug: cfg.service.debug,
        })
    }

    /// Drains in-flight requests for up to the stop timeout, then aborts.
    /// In debug mode the listener is aborted straight away.
    pub async fn stop(self) {
        let Self {
            mut task,
            stop_tx,
            stop_timeout,
            debug,
        } = self;

        if debug {
            task.abort();
            tracing::info!("http server aborted (debug)");
            return;
        }

        let _ = stop_tx.send(());
        match tokio::time::timeout(stop_timeout, &mut task).await {
            Ok(Ok(Ok(()))) => tracing::info!("http server stopped"),
            Ok(Ok(Err(e))) => tracing::error!(error = %e, "http server exited with error"),
            Ok(Err(e)) => tracing::error!(error = %e, "http server task failed"),
            Err(_) => {
                tracing::warn!(
                    timeout_secs = stop_timeout.as_secs(),
                    "http server did not drain in time; aborting"
                );
                task.abort();
            }
        }
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
