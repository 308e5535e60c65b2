use axum::Router;
use utoipa::OpenApi;

use crate::{app_state::AppState, config::ServiceConfig, router::build_router};

pub(crate) struct BootstrapOutput {
    pub router: Router<()>,
    pub endpoints: Vec<String>,
}

pub(crate) fn build(config: &ServiceConfig) -> BootstrapOutput {
    let state = AppState::new(config);
    let (router, endpoints) = build_router();
    let router = attach_http_layers(router.with_state(state), config.concurrency_limit);
    BootstrapOutput { router, endpoints }
}

pub(crate) fn attach_http_layers(router: Router<()>, concurrency_limit: usize) -> Router<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower_http::trace::TraceLayer;

    router
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
}

/// When `OPENAPI_OUT` is set, write the API description there and report the
/// path so the caller can exit instead of serving.
pub(crate) fn ensure_openapi_export() -> Result<Option<String>, std::io::Error> {
    match std::env::var("OPENAPI_OUT") {
        Ok(path) if !path.trim().is_empty() => {
            export_openapi(&path)?;
            Ok(Some(path))
        }
        _ => Ok(None),
    }
}

fn export_openapi(path: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = crate::openapi::ApiDoc::openapi()
        .to_yaml()
        .map_err(std::io::Error::other)?;
    std::fs::write(path, yaml)
}
