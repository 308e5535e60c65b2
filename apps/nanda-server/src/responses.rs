use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Plain-text error body terminated by a newline.
pub fn plain_text(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{message}\n"),
    )
        .into_response()
}

pub fn rate_limited() -> Response {
    plain_text(StatusCode::TOO_MANY_REQUESTS, "rate limit exceeded")
}

pub fn bad_request() -> Response {
    plain_text(StatusCode::BAD_REQUEST, "bad request")
}
