//! Hardening headers on every response: JSON, the sitemap and Swagger UI.

use crate::config::env::{flag_or, non_empty, parse_or, process_env};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::OnceLock;

const DEFAULT_CSP: &str = "default-src 'self'; base-uri 'self'; frame-ancestors 'none'; object-src 'none'; script-src 'self' 'unsafe-inline'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; connect-src 'self'";
const DEFAULT_HSTS_MAX_AGE: u64 = 31_536_000;

// Article images are hotlinked by share previews, hence a cross-origin CORP.
const STATIC_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    ("permissions-policy", "geolocation=(), microphone=(), camera=()"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "cross-origin"),
];

#[derive(Debug, Clone)]
pub struct SecurityHeaders {
    csp: HeaderValue,
    hsts: Option<HeaderValue>,
}

impl SecurityHeaders {
    /// `CSP_POLICY` replaces the default policy; `ENABLE_HSTS=false` drops
    /// HSTS for plain-HTTP deployments; `HSTS_MAX_AGE` is in seconds.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let csp = match non_empty(&lookup, "CSP_POLICY") {
            Some(raw) => HeaderValue::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!("Invalid CSP_POLICY ({err}), using the default policy");
                HeaderValue::from_static(DEFAULT_CSP)
            }),
            None => HeaderValue::from_static(DEFAULT_CSP),
        };

        let hsts = flag_or(&lookup, "ENABLE_HSTS", true).then(|| {
            let max_age = parse_or(&lookup, "HSTS_MAX_AGE", DEFAULT_HSTS_MAX_AGE);
            HeaderValue::from_str(&format!("max-age={max_age}; includeSubDomains"))
                .unwrap_or_else(|_| HeaderValue::from_static("max-age=31536000; includeSubDomains"))
        });

        Self { csp, hsts }
    }

    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert("content-security-policy", self.csp.clone());
        for (name, value) in STATIC_HEADERS {
            headers.insert(
                HeaderName::from_static(name),
                HeaderValue::from_static(value),
            );
        }
        if let Some(hsts) = &self.hsts {
            headers.insert("strict-transport-security", hsts.clone());
        }
    }
}

fn configured() -> &'static SecurityHeaders {
    static CONFIG: OnceLock<SecurityHeaders> = OnceLock::new();
    CONFIG.get_or_init(|| SecurityHeaders::from_lookup(process_env))
}

pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    configured().apply(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::lookup_from;
    use axum::{body::Body, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn defaults_include_hsts() {
        let mut headers = HeaderMap::new();
        SecurityHeaders::from_lookup(lookup_from(&[])).apply(&mut headers);
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["cross-origin-resource-policy"], "cross-origin");
        assert_eq!(
            headers["strict-transport-security"],
            "max-age=31536000; includeSubDomains"
        );
        assert_eq!(headers["content-security-policy"], DEFAULT_CSP);
    }

    #[test]
    fn hsts_can_be_disabled_or_shortened() {
        let mut headers = HeaderMap::new();
        SecurityHeaders::from_lookup(lookup_from(&[("ENABLE_HSTS", "false")])).apply(&mut headers);
        assert!(headers.get("strict-transport-security").is_none());

        let mut headers = HeaderMap::new();
        SecurityHeaders::from_lookup(lookup_from(&[("HSTS_MAX_AGE", "600")])).apply(&mut headers);
        assert_eq!(
            headers["strict-transport-security"],
            "max-age=600; includeSubDomains"
        );
    }

    #[test]
    fn invalid_csp_falls_back() {
        let mut headers = HeaderMap::new();
        SecurityHeaders::from_lookup(lookup_from(&[("CSP_POLICY", "default-src\n'self'")]))
            .apply(&mut headers);
        assert_eq!(headers["content-security-policy"], DEFAULT_CSP);
    }

    #[tokio::test]
    async fn middleware_sets_headers_on_xml_responses() {
        let app = Router::new()
            .route("/sitemap.xml", get(|| async { "<urlset/>" }))
            .layer(axum::middleware::from_fn(security_headers_middleware));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/sitemap.xml")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert!(response.headers().get("content-security-policy").is_some());
    }
}
