use utoipa::OpenApi;

use crate::api::{messages, meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::meta::health,
        crate::api::messages::send,
        crate::api::messages::render,
        crate::api::meta::agents_list,
    ),
    components(
        schemas(
            meta::HealthStatus,
            meta::AgentDescriptor,
            messages::SendRequest,
            messages::SendResponse,
            messages::RenderResponse
        )
    ),
    tags(
        (name = "Meta", description = "Health and agent discovery"),
        (name = "Messages", description = "Message submission and latest render")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::paths;

    #[test]
    fn document_covers_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            paths::HEALTH,
            paths::SEND,
            paths::RENDER,
            paths::AGENTS_LIST,
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let yaml = doc.to_yaml().expect("yaml");
        assert!(yaml.contains("SendResponse"));
    }
}
