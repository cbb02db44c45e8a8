//! Cache-disabling middleware.
//!
//! Every API response must be served fresh: storage state can change
//! between requests and intermediaries must not cache envelopes.

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Disables caching on every response.
///
/// Sets `Cache-Control: no-store, no-cache, must-revalidate, proxy-revalidate`
/// along with `Pragma: no-cache` and `Expires: 0`.
pub async fn no_cache_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;

    let headers = response.headers_mut();
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
    );
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));

    response
}
