use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

use crate::errors::ServerError;

pub type ResultResp = Result<Response, ServerError>;

/// Convert a ServerError into a JSON error response.
pub fn error_to_response(err: ServerError) -> Response {
    match err {
        ServerError::NotFound => json_error_response(404, "Not Found"),
        ServerError::BadRequest(msg) => json_error_response(400, &msg),
        ServerError::Unauthorized(msg) => json_error_response(401, &msg),
        ServerError::Forbidden(msg) => json_error_response(403, &msg),
        ServerError::DbError(msg) => json_error_response(500, &msg),
        ServerError::MailError(msg) => json_error_response(500, &msg),
        ServerError::ReportError(msg) => json_error_response(500, &msg),
        ServerError::InternalError => json_error_response(500, "Internal Server Error"),
    }
}

/// Build a JSON error body: `{"success": false, "message": ...}`.
pub fn json_error_response(status: u16, message: &str) -> Response {
    let body = json!({ "success": false, "message": message });

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.to_string()))
        .unwrap()
}
