//! Forwarding of allowed page requests to the upstream renderer.
//!
//! Registered as the app's default service, behind the route guard. Only
//! requests the guard allowed ever get here. Method, query, headers and body
//! are passed through unchanged, except hop-by-hop headers, which are dropped
//! in both directions. The path is sent in the same canonical form the guard
//! classified.

use actix_web::{
    HttpRequest, HttpResponse,
    http::{StatusCode, header::HeaderValue},
    web,
};
use reqwest::Client;

use crate::auth::path::canonical_path;

/// Request and response headers that are never forwarded.
const HOP_BY_HOP: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

fn is_forwardable(name: &str) -> bool {
    !HOP_BY_HOP.contains(&name)
}

/// The page renderer behind the gate.
#[derive(Debug, Clone)]
pub struct Upstream {
    client: Client,
    base_url: String,
}

impl Upstream {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upstream URL for the incoming request: canonical path plus the raw
    /// query. `None` when the path has no canonical form.
    pub fn target(&self, req: &HttpRequest) -> Option<String> {
        let path = canonical_path(req.path())?;
        Some(match req.query_string() {
            "" => format!("{}{}", self.base_url, path),
            query => format!("{}{}?{}", self.base_url, path, query),
        })
    }
}

/// Forwards the request upstream and relays the answer.
///
/// # Error Responses
/// - `400 Bad Request`: the path has no canonical form
/// - `405 Method Not Allowed`: the method cannot be expressed to the client
/// - `502 Bad Gateway`: upstream unreachable or the response body was cut off
#[tracing::instrument(skip(req, body, upstream), fields(method = %req.method(), path = %req.path()))]
pub async fn forward(
    req: HttpRequest,
    body: web::Bytes,
    upstream: web::Data<Upstream>,
) -> HttpResponse {
    let Ok(method) = reqwest::Method::from_bytes(req.method().as_str().as_bytes()) else {
        return HttpResponse::MethodNotAllowed().finish();
    };
    let Some(url) = upstream.target(&req) else {
        return HttpResponse::BadRequest().finish();
    };

    let mut outbound = upstream.client.request(method, &url);
    for (name, value) in req.headers() {
        if is_forwardable(name.as_str()) {
            outbound = outbound.header(name.as_str(), value.as_bytes());
        }
    }
    if let Some(peer) = req.connection_info().realip_remote_addr() {
        outbound = outbound.header("x-forwarded-for", peer);
    }

    let res = match outbound.body(body).send().await {
        Ok(res) => res,
        Err(e) => {
            tracing::error!(url = %url, error = ?e, "Upstream request failed");
            return HttpResponse::BadGateway()
                .json(serde_json::json!({"error": "upstream unavailable"}));
        }
    };

    let status = StatusCode::from_u16(res.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = HttpResponse::build(status);
    for (name, value) in res.headers() {
        if !is_forwardable(name.as_str()) {
            continue;
        }
        if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
            response.append_header((name.as_str(), value));
        }
    }

    match res.bytes().await {
        Ok(bytes) => response.body(bytes),
        Err(e) => {
            tracing::error!(url = %url, error = ?e, "Upstream response body failed");
            HttpResponse::BadGateway().json(serde_json::json!({"error": "upstream unavailable"}))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn target_keeps_path_and_query() {
        let upstream = Upstream::new("http://renderer:3000/");
        let req = TestRequest::get().uri("/menu?category=drinks").to_http_request();
        assert_eq!(
            upstream.target(&req).as_deref(),
            Some("http://renderer:3000/menu?category=drinks")
        );
    }

    #[test]
    fn target_uses_the_canonical_path() {
        let upstream = Upstream::new("http://renderer:3000");
        let req = TestRequest::get()
            .uri("/images/%2e%2e/admin/../menu?x=1")
            .to_http_request();
        assert_eq!(upstream.target(&req).as_deref(), Some("http://renderer:3000/menu?x=1"));

        let req = TestRequest::get().uri("//cart").to_http_request();
        assert_eq!(upstream.target(&req).as_deref(), Some("http://renderer:3000/cart"));

        let req = TestRequest::get().uri("/images/..%2Fadmin").to_http_request();
        assert_eq!(upstream.target(&req), None);
    }

    #[test]
    fn hop_by_hop_headers_are_dropped() {
        assert!(!is_forwardable("connection"));
        assert!(!is_forwardable("host"));
        assert!(is_forwardable("cookie"));
        assert!(is_forwardable("content-type"));
    }
}
