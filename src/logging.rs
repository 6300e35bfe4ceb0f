//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The maximum number of bytes of a body that is logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

const REDACTED: &str = "********";

/// JSON fields whose values are never written to the logs.
const SECRET_FIELDS: [&str; 2] = ["password", "token"];

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
///
/// Passwords, bearer tokens and the `Authorization` header are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    let headers = redact_headers(&parts.headers);
    log_body(
        &format!("Received request: {} {}\nheaders: {headers:#?}", parts.method, parts.uri),
        &redact_body(&body_bytes),
    );

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    log_body(
        &format!("Sending response: {}\nheaders: {:#?}", parts.status, parts.headers),
        &redact_body(&body_bytes),
    );

    Response::from_parts(parts, Body::from(body_bytes))
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static(REDACTED));
    }

    headers
}

/// Replace the values of secret fields in a JSON object body.
///
/// Bodies that are not JSON objects are returned as lossy UTF-8 text.
fn redact_body(body: &Bytes) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut object)) => {
            for field in SECRET_FIELDS {
                if let Some(value) = object.get_mut(field) {
                    *value = Value::String(REDACTED.to_owned());
                }
            }

            Value::Object(object).to_string()
        }
        _ => String::from_utf8_lossy(body).to_string(),
    }
}

fn log_body(summary: &str, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!("{summary}\nbody: {}...", truncate(body, LOG_BODY_LENGTH_LIMIT));
        tracing::debug!("Full body: {body:?}");
    } else {
        tracing::info!("{summary}\nbody: {body:?}");
    }
}

/// Cut `text` to at most `max_len` bytes without splitting a character.
fn truncate(text: &str, max_len: usize) -> &str {
    let end = (0..=max_len.min(text.len()))
        .rev()
        .find(|&index| text.is_char_boundary(index))
        .unwrap_or(0);

    &text[..end]
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Bytes,
        http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
        middleware,
        routing::post,
    };
    use axum_test::TestServer;

    use super::{logging_middleware, redact_body, redact_headers, truncate};

    #[test]
    fn redacts_password_and_token_fields() {
        let body = Bytes::from(r#"{"email":"foo@bar.baz","password":"hunter2","token":"abc"}"#);

        let got = redact_body(&body);

        assert!(!got.contains("hunter2"));
        assert!(!got.contains("abc"));
        assert!(got.contains("foo@bar.baz"));
    }

    #[test]
    fn leaves_other_bodies_unchanged() {
        let body = Bytes::from("password=hunter2 is not JSON");

        assert_eq!(redact_body(&body), "password=hunter2 is not JSON");
    }

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));

        let got = redact_headers(&headers);

        assert_eq!(got.get(AUTHORIZATION).unwrap(), "********");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "h");
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[tokio::test]
    async fn middleware_passes_body_through() {
        async fn echo(body: String) -> String {
            body
        }

        let app = Router::new()
            .route("/echo", post(echo))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server.post("/echo").text(r#"{"password":"hunter2"}"#).await;

        response.assert_status_ok();
        response.assert_text(r#"{"password":"hunter2"}"#);
    }
}
