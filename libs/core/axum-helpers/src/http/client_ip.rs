use axum::{
    extract::{ConnectInfo, FromRequestParts, Request},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Resolved address of the calling client, stored as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Extract client IP address from proxy headers.
///
/// Checks X-Forwarded-For first (uses the first IP in the chain), then falls
/// back to X-Real-IP.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Middleware that resolves the client address, inserts [`ClientIp`] and
/// records it as `client_ip` on the enclosing request span.
///
/// Proxy headers win over the socket peer address. The peer address is only
/// available when the server was started with connect info.
pub async fn client_ip_middleware(mut request: Request, next: Next) -> Response {
    let ip = extract_ip_from_headers(request.headers())
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string());

    tracing::Span::current().record("client_ip", ip.as_str());
    request.extensions_mut().insert(ClientIp(ip));
    next.run(request).await
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<ClientIp>()
            .cloned()
            .or_else(|| extract_ip_from_headers(&parts.headers).map(ClientIp))
            .unwrap_or_else(|| ClientIp("unknown".to_string())))
    }
}
