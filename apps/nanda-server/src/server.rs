use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use hyper_util::service::TowerToHyperService;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::{config::ServiceConfig, tls};

/// Bind the configured address and serve until the process is killed.
pub(crate) async fn run(config: &ServiceConfig, app: Router, endpoints: &[String]) -> Result<()> {
    let acceptor = match &config.tls {
        Some(paths) => Some(
            tls::acceptor_from_pem(&paths.cert, &paths.key).context("load TLS certificate")?,
        ),
        None => None,
    };

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    info!(
        target: "nanda::http",
        "NANDA agent listening ({}) on {}",
        config.scheme(),
        config.addr
    );
    info!(target: "nanda::http", "Endpoints: {}", endpoints.join(" | "));

    match acceptor {
        Some(acceptor) => serve_tls(listener, acceptor, app).await,
        None => axum::serve(listener, app)
            .await
            .context("http server exited"),
    }
}

async fn serve_tls(listener: TcpListener, acceptor: TlsAcceptor, app: Router) -> Result<()> {
    let exec = TokioExecutor::new();
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(target: "nanda::tls", error = %err, "accept failed");
                tokio::time::sleep(Duration::from_millis(50)).await;
                continue;
            }
        };
        let acceptor = acceptor.clone();
        let svc = TowerToHyperService::new(app.clone());
        let exec = exec.clone();
        tokio::spawn(async move {
            let stream = match acceptor.accept(stream).await {
                Ok(stream) => stream,
                Err(err) => {
                    debug!(target: "nanda::tls", %peer, error = %err, "TLS handshake failed");
                    return;
                }
            };
            let io = TokioIo::new(stream);
            if let Err(err) = AutoBuilder::new(exec)
                .serve_connection_with_upgrades(io, svc)
                .await
            {
                debug!(target: "nanda::tls", %peer, error = %err, "connection closed with error");
            }
        });
    }
}
