use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

#[derive(Clone, Debug)]
pub struct HttpsRedirectionOptions {
    /// Port insecure requests are redirected to; no redirect when unset
    pub https_port: Option<u16>,
    pub trust_forwarded_proto: bool,
}

#[derive(Clone, Debug)]
pub struct HstsOptions {
    pub max_age: Duration,
    pub include_subdomains: bool,
    pub preload: bool,
    pub excluded_hosts: Vec<String>,
    pub trust_forwarded_proto: bool,
}

impl Default for HstsOptions {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30 * 24 * 60 * 60),
            include_subdomains: false,
            preload: false,
            excluded_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "[::1]".to_string(),
            ],
            trust_forwarded_proto: false,
        }
    }
}

impl HstsOptions {
    pub fn header_value(&self) -> String {
        let mut value = format!("max-age={}", self.max_age.as_secs());
        if self.include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.preload {
            value.push_str("; preload");
        }
        value
    }
}

/// True when the request arrived over TLS. `X-Forwarded-Proto` only counts
/// when the deployment sits behind a proxy that sets it.
pub fn is_secure(req: &Request, trust_forwarded_proto: bool) -> bool {
    if req.uri().scheme_str() == Some("https") {
        return true;
    }
    if !trust_forwarded_proto {
        return false;
    }
    req.headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or("").trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

fn request_host(req: &Request) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_owned()))
}

/// Host without port; IPv6 literals keep their brackets
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, _)) => name,
        None => host,
    }
}

pub async fn redirect_to_https(
    State(options): State<HttpsRedirectionOptions>,
    req: Request,
    next: Next,
) -> Response {
    let Some(port) = options.https_port else {
        return next.run(req).await;
    };
    if is_secure(&req, options.trust_forwarded_proto) {
        return next.run(req).await;
    }
    let Some(host) = request_host(&req) else {
        return next.run(req).await;
    };

    let host = strip_port(&host);
    let authority = if port == 443 {
        host.to_string()
    } else {
        format!("{}:{}", host, port)
    };
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let location = format!("https://{}{}", authority, path_and_query);

    tracing::debug!("Redirecting to {}", location);
    (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, location)]).into_response()
}

/// Adds Strict-Transport-Security to secure, non-loopback responses
pub async fn hsts(State(options): State<HstsOptions>, req: Request, next: Next) -> Response {
    let applies = is_secure(&req, options.trust_forwarded_proto)
        && request_host(&req)
            .map(|host| {
                let host = strip_port(&host).to_ascii_lowercase();
                !options.excluded_hosts.iter().any(|h| h.eq_ignore_ascii_case(&host))
            })
            .unwrap_or(false);

    let mut response = next.run(req).await;
    if applies {
        if let Ok(value) = HeaderValue::from_str(&options.header_value()) {
            response
                .headers_mut()
                .insert(header::STRICT_TRANSPORT_SECURITY, value);
        }
    }
    response
}
