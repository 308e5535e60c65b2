use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use nanda_core::{transform, MemoryStore, Note, SessionState, ToolCommand};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::debug;
use utoipa::ToSchema;

use crate::{responses, AppState};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SendRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendResponse {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RenderResponse {
    pub latest: String,
}

/// Submit a message for transformation.
///
/// The admitted slot is spent even when the body fails to decode.
#[utoipa::path(
    post,
    path = "/api/send",
    tag = "Messages",
    operation_id = "send_doc",
    request_body = SendRequest,
    responses(
        (status = 200, description = "Transformed message", body = SendResponse),
        (status = 400, description = "Malformed JSON body"),
        (status = 405, description = "Method not allowed"),
        (status = 429, description = "Rate limit exceeded")
    )
)]
pub async fn send(State(state): State<AppState>, body: Bytes) -> Response {
    let mut session = state.session_owned().await;
    if !session.limiter_mut().admit() {
        debug!(
            target: "nanda::http",
            window_count = session.limiter().window_count(),
            "send rejected by rate limiter"
        );
        return responses::rate_limited();
    }
    let req = match decode_send(&body) {
        Ok(req) => req,
        Err(err) => {
            debug!(target: "nanda::http", error = %err, "send body rejected");
            return responses::bad_request();
        }
    };

    let memory = state.memory();
    let command = if state.tools_enabled() {
        ToolCommand::parse(&req.message)
    } else {
        None
    };
    let (output, note) = match command {
        Some(command) => {
            let notes = if command.reads_memory() {
                memory.load().await.notes
            } else {
                Vec::new()
            };
            let outcome = command.run(&notes);
            (outcome.output, outcome.note)
        }
        None => (transform(&req.message), None),
    };

    session.record_output(output.clone());
    tokio::spawn(persist_accepted(session, memory, note));

    Json(SendResponse {
        input: req.message,
        output,
    })
    .into_response()
}

/// Reads the first JSON value of the body and ignores anything after it. A
/// `null` body counts as an empty message; an empty body is an error.
fn decode_send(body: &[u8]) -> Result<SendRequest, serde_json::Error> {
    let mut values =
        serde_json::Deserializer::from_slice(body).into_iter::<Option<SendRequest>>();
    match values.next() {
        Some(value) => value.map(Option::unwrap_or_default),
        None => Err(serde::de::Error::custom("empty request body")),
    }
}

/// Rewrites the memory file for the send that produced `session`'s latest
/// state. Holding the guard keeps other requests out until the write is done.
async fn persist_accepted(
    session: OwnedMutexGuard<SessionState>,
    memory: Arc<MemoryStore>,
    note: Option<Note>,
) {
    let mut persisted = memory.load().await;
    persisted.metrics.messages = session.message_count();
    if persisted.metrics.start_ts == 0.0 {
        persisted.metrics.start_ts = session.started_epoch_secs();
    }
    if let Some(note) = note {
        persisted.notes.push(note);
    }
    memory.save(&persisted).await;
    drop(session);
}

/// Latest transformed output, or an empty string before the first send.
#[utoipa::path(
    get,
    path = "/api/render",
    tag = "Messages",
    operation_id = "render_doc",
    responses(
        (status = 200, description = "Most recent output", body = RenderResponse)
    )
)]
pub async fn render(State(state): State<AppState>) -> Json<RenderResponse> {
    let session = state.session().await;
    Json(RenderResponse {
        latest: session.last_output().to_string(),
    })
}
