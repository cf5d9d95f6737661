// responses/json.rs
use astra::{Body, ResponseBuilder};
use serde_json::{json, Value};

use crate::errors::ServerError;
use crate::responses::ResultResp;

/// 200 with the standard `{"success": true, "data": ...}` envelope.
pub fn json_ok(data: Value) -> ResultResp {
    json_with_status(200, json!({ "success": true, "data": data }))
}

/// 201 for successful creations.
pub fn json_created(data: Value) -> ResultResp {
    json_with_status(201, json!({ "success": true, "data": data }))
}

pub fn json_with_status(status: u16, body: Value) -> ResultResp {
    let bytes = serde_json::to_vec(&body).map_err(|_| ServerError::InternalError)?;

    let resp = ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(bytes))
        .map_err(|_| ServerError::InternalError)?;

    Ok(resp)
}
