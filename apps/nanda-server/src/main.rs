use tracing::error;

mod api;
mod app_state;
mod bootstrap;
mod config;
mod openapi;
mod responses;
mod router;
mod server;
mod telemetry;
#[cfg(test)]
mod test_support;
mod tls;

pub(crate) use app_state::AppState;

#[tokio::main]
async fn main() {
    match bootstrap::ensure_openapi_export() {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(err) => {
            eprintln!("error: failed to write generated OPENAPI_OUT: {err}");
            std::process::exit(2);
        }
    }

    telemetry::init();

    let config = match config::config_from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(target: "nanda::config", error = %err, "invalid configuration");
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let bootstrap::BootstrapOutput { router, endpoints } = bootstrap::build(&config);

    if let Err(err) = server::run(&config, router, &endpoints).await {
        error!(target: "nanda::http", error = %format!("{err:#}"), "server exited");
        std::process::exit(1);
    }
}
