use crate::utils::error::internal_error_response;
use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::{
        header::{CONTENT_LENGTH, CONTENT_TYPE},
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};

pub const CALLBACK_PARAM: &str = "callback";
pub const JAVASCRIPT_CONTENT_TYPE: &str = "application/javascript";

/// Wraps successful JSON responses as `callback(body)` when the request
/// carries a non-empty `callback` query parameter.
pub async fn support_jsonp(request: Request, next: Next) -> Response {
    let callback = callback_param(request.uri().query());
    let response = next.run(request).await;

    let Some(callback) = callback else {
        return response;
    };
    if !response.status().is_success() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "Failed to buffer response body for JSONP");
            return internal_error_response();
        }
    };

    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static(JAVASCRIPT_CONTENT_TYPE));
    parts.headers.remove(CONTENT_LENGTH);

    Response::from_parts(parts, Body::from(wrap_jsonp(&callback, &bytes)))
}

pub fn callback_param(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == CALLBACK_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

pub fn wrap_jsonp(callback: &str, body: &[u8]) -> Vec<u8> {
    let mut wrapped = Vec::with_capacity(callback.len() + body.len() + 2);
    wrapped.extend_from_slice(callback.as_bytes());
    wrapped.push(b'(');
    wrapped.extend_from_slice(body);
    wrapped.push(b')');
    wrapped
}
