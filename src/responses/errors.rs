use crate::errors::ServerError;
use crate::templates::components::error_page;
use astra::{Body, Response, ResponseBuilder};
use http::StatusCode;
use serde_json::json;
use tracing::{error, warn};

fn log_error(err: &ServerError) {
    match err {
        ServerError::DbError(_) | ServerError::InternalError => {
            error!(error = %err, "request failed")
        }
        _ => warn!(error = %err, "request rejected"),
    }
}

fn plain_fallback(status: u16) -> Response {
    let mut resp = Response::new(Body::from("Error interno del servidor"));
    *resp.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    resp
}

/// `{"error": "..."}` with the status of the error. Used for /api/* routes.
pub fn json_error_response(err: ServerError) -> Response {
    log_error(&err);
    let status = err.status();
    let body = json!({ "error": err.public_message() }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "application/json; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| plain_fallback(status))
}

/// Full HTML error page for browser routes.
pub fn html_error_response(err: ServerError, user: Option<&str>) -> Response {
    log_error(&err);
    let status = err.status();
    let body = error_page(status, &err.public_message(), user).into_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", "text/html; charset=utf-8")
        .body(Body::from(body))
        .unwrap_or_else(|_| plain_fallback(status))
}
