use lambda_http::{http::StatusCode, Body, Response};
use serde::Serialize;

use crate::error::ApiError;

/// Uniform success envelope: JSON body, JSON content type, permissive CORS.
pub fn success<T: Serialize>(status: StatusCode, data: &T) -> Result<Response<Body>, ApiError> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(data)?.into())?)
}

/// Error envelope: `{"error": true, "message": ...}`.
pub fn error(status: StatusCode, message: &str) -> Result<Response<Body>, lambda_http::http::Error> {
    let body = serde_json::json!({
        "error": true,
        "message": message,
    });

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(body.to_string().into())
}

/// CORS preflight
pub fn preflight() -> Result<Response<Body>, lambda_http::http::Error> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET,POST,PUT,DELETE,OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(Body::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(response: &Response<Body>) -> serde_json::Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn test_success_envelope() {
        let response = success(StatusCode::CREATED, &serde_json::json!({"userId": "abc"})).unwrap();
        assert_eq!(response.status(), 201);
        assert_eq!(response.headers()["Content-Type"], "application/json");
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        assert_eq!(body_json(&response)["userId"], "abc");
    }

    #[test]
    fn test_error_envelope_sets_flag() {
        let response = error(StatusCode::NOT_FOUND, "User not found").unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(response.headers()["Access-Control-Allow-Origin"], "*");
        let body = body_json(&response);
        assert_eq!(body["error"], true);
        assert_eq!(body["message"], "User not found");
    }

    #[test]
    fn test_preflight_has_no_body() {
        let response = preflight().unwrap();
        assert_eq!(response.status(), 200);
        assert!(response.body().is_empty());
    }
}
