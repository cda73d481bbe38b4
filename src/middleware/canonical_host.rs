use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Sends `www.` and plain-HTTP page traffic to `https://<host>` with a 308.
/// `/health` and `/api/*` are never redirected.
#[derive(Debug, Clone)]
pub struct CanonicalHost {
    pub host: String,
    pub enforce_https: bool,
}

impl CanonicalHost {
    pub fn new(host: impl Into<String>, enforce_https: bool) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
            enforce_https,
        }
    }

    fn redirect_target(&self, request_host: &str, forwarded_proto: Option<&str>, path_and_query: &str) -> Option<String> {
        let request_host = request_host
            .split(':')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        let is_www = request_host == format!("www.{}", self.host);
        let plain_http = self.enforce_https
            && request_host == self.host
            && forwarded_proto.is_some_and(|p| p.eq_ignore_ascii_case("http"));

        (is_www || plain_http).then(|| format!("https://{}{}", self.host, path_and_query))
    }
}

fn is_exempt(path: &str) -> bool {
    path == "/health" || path == "/api" || path.starts_with("/api/")
}

pub async fn redirect_to_canonical_host(
    State(canonical): State<CanonicalHost>,
    req: Request,
    next: Next,
) -> Response {
    if is_exempt(req.uri().path()) {
        return next.run(req).await;
    }

    let host = req
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| req.uri().host())
        .unwrap_or_default();
    let proto = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok());
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    match canonical.redirect_target(host, proto, path_and_query) {
        Some(target) => {
            tracing::debug!(from = %host, to = %target, "Canonical host redirect");
            Redirect::permanent(&target).into_response()
        }
        None => next.run(req).await,
    }
}
