//! Preview endpoint.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use super::super::AppState;
use super::helpers::error_response;
use crate::preview::{PreviewRequest, RequestError};

/// `POST /preview`: run the preview pipeline for `{ url, raw_html? }`.
pub async fn create_preview(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(value)) => match parse_request(value) {
            Ok(request) => request,
            Err(e) => return e.into_response(),
        },
        Err(rejection) => {
            tracing::debug!("Rejected preview body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.service.handle(&request).await {
        Ok(preview) => Json(preview).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Read the request fields from a JSON body.
///
/// A `url` that is present but not a string is an invalid URL, not a
/// missing one. A non-string `raw_html` is ignored.
fn parse_request(value: Value) -> Result<PreviewRequest, BodyError> {
    let Value::Object(mut fields) = value else {
        return Err(BodyError::NotAnObject);
    };

    let url = match fields.remove("url") {
        None | Some(Value::Null) => None,
        Some(Value::String(url)) => Some(url),
        Some(_) => return Err(BodyError::Request(RequestError::InvalidUrl)),
    };

    let raw_html = match fields.remove("raw_html").or_else(|| fields.remove("rawContent")) {
        Some(Value::String(html)) => Some(html),
        _ => None,
    };

    Ok(PreviewRequest { url, raw_html })
}

#[derive(Debug)]
enum BodyError {
    NotAnObject,
    Request(RequestError),
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        match self {
            BodyError::NotAnObject => {
                error_response(StatusCode::BAD_REQUEST, "Request body must be a JSON object")
            }
            BodyError::Request(e) => e.into_response(),
        }
    }
}

/// Every preview failure is the caller's problem: 400 with the message.
impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self.fetch_kind() {
            Some(kind) => tracing::info!("Preview fetch failed ({}): {}", kind.as_str(), self),
            None => tracing::debug!("Preview request rejected: {}", self),
        }
        error_response(StatusCode::BAD_REQUEST, self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_request_fields() {
        let request =
            parse_request(json!({"url": "https://a.com", "raw_html": "<p>x</p>"})).unwrap();
        assert_eq!(request, PreviewRequest::new("https://a.com").with_raw_html("<p>x</p>"));

        let request = parse_request(json!({"url": "https://a.com", "raw_html": 5})).unwrap();
        assert_eq!(request.raw_html, None);

        let request = parse_request(json!({})).unwrap();
        assert_eq!(request.url, None);
    }

    #[test]
    fn test_parse_request_rejects_bad_shapes() {
        assert!(matches!(
            parse_request(json!([1, 2])),
            Err(BodyError::NotAnObject)
        ));
        assert!(matches!(
            parse_request(json!({"url": 42})),
            Err(BodyError::Request(RequestError::InvalidUrl))
        ));
    }
}
