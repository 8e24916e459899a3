use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// 无法确定客户端地址时传给地理定位的占位值
pub const UNKNOWN_CLIENT_IP: &str = "unknown";

/// 提交者 IP：优先取 `X-Forwarded-For` 第一项，其次为对端地址
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(resolve_client_ip(&parts.headers, peer))
    }
}

pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> ClientIp {
    let forwarded = headers
        .get(FORWARDED_FOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty());

    if let Some(first) = forwarded {
        return ClientIp(first.to_string());
    }

    match peer {
        Some(addr) => ClientIp(addr.ip().to_string()),
        None => ClientIp(UNKNOWN_CLIENT_IP.to_string()),
    }
}
