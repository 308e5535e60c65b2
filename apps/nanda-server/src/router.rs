use std::mem;

use axum::{
    handler::Handler,
    routing::{get, post},
    Router,
};

use crate::{api, AppState};

pub(crate) mod paths {
    pub const HEALTH: &str = "/api/health";
    pub const SEND: &str = "/api/send";
    pub const RENDER: &str = "/api/render";
    pub const AGENTS_LIST: &str = "/api/agents/list";
}

/// Router plus a human-readable index of what was registered.
pub(crate) struct RouterBuilder {
    router: Router<AppState>,
    endpoints: Vec<String>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
        }
    }

    fn record(&mut self, method: &str, path: &'static str) {
        self.endpoints.push(format!("{} {}", method, path));
    }

    pub fn route_get<H, T>(&mut self, path: &'static str, handler: H) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: Send + 'static,
    {
        self.record("GET", path);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, get(handler));
        self
    }

    pub fn route_post<H, T>(&mut self, path: &'static str, handler: H) -> &mut Self
    where
        H: Handler<T, AppState> + Clone + 'static,
        T: Send + 'static,
    {
        self.record("POST", path);
        let router = mem::take(&mut self.router);
        self.router = router.route(path, post(handler));
        self
    }

    pub fn build(self) -> (Router<AppState>, Vec<String>) {
        (self.router, self.endpoints)
    }
}

pub(crate) fn build_router() -> (Router<AppState>, Vec<String>) {
    let mut builder = RouterBuilder::new();
    builder
        .route_get(paths::HEALTH, api::meta::health)
        .route_post(paths::SEND, api::messages::send)
        .route_get(paths::RENDER, api::messages::render)
        .route_get(paths::AGENTS_LIST, api::meta::agents_list);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_index_lists_routes_in_registration_order() {
        let (_, endpoints) = build_router();
        assert_eq!(
            endpoints,
            vec![
                "GET /api/health",
                "POST /api/send",
                "GET /api/render",
                "GET /api/agents/list",
            ]
        );
    }
}
