//! 基于 HTTP 的 IP 地理定位
//!
//! 请求 `<base_url><ip>`，期望返回 `{"status": "...", "country": "..."}`。
//! 任何失败（传输错误、非 2xx、空响应、解码失败、状态非 success）
//! 都在 [`LookupOutcome`] 处统一折叠为 `UNKNOWN_COUNTRY`。

use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use complaint_core::GeolocationConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, warn};

use crate::domain::model::UNKNOWN_COUNTRY;
use crate::domain::repository::GeolocationResolver;

const SUCCESS_STATUS: &str = "success";

/// 响应体读取上限（字节），正常响应只有几百字节
const MAX_RESPONSE_BYTES: usize = 16 * 1024;

#[derive(Debug, Deserialize)]
struct LookupPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// 一次查询的结果
#[derive(Debug, PartialEq, Eq)]
enum LookupOutcome {
    Resolved(String),
    /// 响应格式正确但未给出国家
    Unresolved(String),
    /// 响应无法解码
    Malformed(String),
}

impl LookupOutcome {
    fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return Self::Unresolved("empty response body".to_string());
        }

        match serde_json::from_str::<LookupPayload>(body) {
            Ok(LookupPayload {
                status: Some(status),
                country: Some(country),
            }) if status == SUCCESS_STATUS => Self::Resolved(country),
            Ok(LookupPayload {
                status: Some(status),
                ..
            }) if status == SUCCESS_STATUS => {
                Self::Unresolved("success response without country".to_string())
            }
            Ok(payload) => Self::Unresolved(format!(
                "lookup status {}",
                payload.status.as_deref().unwrap_or("<missing>")
            )),
            Err(err) => Self::Malformed(err.to_string()),
        }
    }

    fn into_country(self, ip_address: &str) -> String {
        match self {
            Self::Resolved(country) => country,
            Self::Unresolved(reason) => {
                warn!(ip = %ip_address, %reason, "Unable to determine country for IP");
                UNKNOWN_COUNTRY.to_string()
            }
            Self::Malformed(reason) => {
                error!(ip = %ip_address, %reason, "Error decoding geolocation response");
                UNKNOWN_COUNTRY.to_string()
            }
        }
    }
}

#[derive(Clone)]
pub struct HttpGeolocationResolver {
    client: Client,
    base_url: String,
}

impl HttpGeolocationResolver {
    pub fn new(config: &GeolocationConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().use_rustls_tls();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .context("failed to build geolocation http client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn lookup_url(&self, ip_address: &str) -> String {
        format!("{}{}", self.base_url, ip_address)
    }

    async fn fetch_body(&self, url: &str) -> anyhow::Result<String> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .context("geolocation request failed")?
            .error_for_status()
            .context("geolocation provider returned an error status")?;

        if let Some(length) = response
            .content_length()
            .filter(|length| *length > MAX_RESPONSE_BYTES as u64)
        {
            bail!("geolocation response of {length} bytes exceeds {MAX_RESPONSE_BYTES} bytes");
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .context("failed to read geolocation response body")?
        {
            if body.len() + chunk.len() > MAX_RESPONSE_BYTES {
                bail!("geolocation response exceeds {MAX_RESPONSE_BYTES} bytes");
            }
            body.extend_from_slice(&chunk);
        }

        String::from_utf8(body).context("geolocation response is not valid UTF-8")
    }
}

#[async_trait]
impl GeolocationResolver for HttpGeolocationResolver {
    async fn resolve_country(&self, ip_address: &str) -> String {
        let url = self.lookup_url(ip_address);
        debug!(%url, "resolving country");

        match self.fetch_body(&url).await {
            Ok(body) => LookupOutcome::from_body(&body).into_country(ip_address),
            Err(err) => {
                let detail = format!("{err:#}");
                error!(ip = %ip_address, error = %detail, "Error getting country by IP");
                UNKNOWN_COUNTRY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::Router;
    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use tokio::net::TcpListener;

    async fn stub_provider(Path(ip): Path<String>) -> Response {
        match ip.as_str() {
            "1.2.3.4" => (
                StatusCode::OK,
                r#"{"status":"success","country":"Poland","query":"1.2.3.4"}"#,
            )
                .into_response(),
            "10.0.0.1" => (
                StatusCode::OK,
                r#"{"status":"fail","message":"private range"}"#,
            )
                .into_response(),
            "5.5.5.5" => (StatusCode::OK, r#"{"status":"success"}"#).into_response(),
            "6.6.6.6" => (StatusCode::OK, "<html>not json</html>").into_response(),
            "7.7.7.7" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            "9.9.9.9" => {
                let padding = "x".repeat(MAX_RESPONSE_BYTES);
                (
                    StatusCode::OK,
                    format!(r#"{{"status":"success","country":"Poland","pad":"{padding}"}}"#),
                )
                    .into_response()
            }
            _ => (StatusCode::OK, "").into_response(),
        }
    }

    async fn spawn_stub() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/json/{ip}", get(stub_provider));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn resolver_for(addr: SocketAddr) -> HttpGeolocationResolver {
        HttpGeolocationResolver::new(&GeolocationConfig {
            base_url: format!("http://{addr}/json/"),
            timeout_ms: Some(2_000),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn success_status_returns_country_verbatim() {
        let resolver = resolver_for(spawn_stub().await);
        assert_eq!(resolver.resolve_country("1.2.3.4").await, "Poland");
    }

    #[tokio::test]
    async fn fail_status_returns_unknown() {
        let resolver = resolver_for(spawn_stub().await);
        assert_eq!(resolver.resolve_country("10.0.0.1").await, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn empty_body_returns_unknown() {
        let resolver = resolver_for(spawn_stub().await);
        assert_eq!(resolver.resolve_country("8.8.8.8").await, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn error_status_returns_unknown() {
        let resolver = resolver_for(spawn_stub().await);
        assert_eq!(resolver.resolve_country("7.7.7.7").await, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn success_without_country_or_malformed_body_returns_unknown() {
        let resolver = resolver_for(spawn_stub().await);
        assert_eq!(resolver.resolve_country("5.5.5.5").await, UNKNOWN_COUNTRY);
        assert_eq!(resolver.resolve_country("6.6.6.6").await, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn oversized_body_returns_unknown() {
        let resolver = resolver_for(spawn_stub().await);
        assert_eq!(resolver.resolve_country("9.9.9.9").await, UNKNOWN_COUNTRY);
    }

    #[tokio::test]
    async fn unreachable_provider_returns_unknown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let resolver = resolver_for(addr);
        assert_eq!(resolver.resolve_country("1.2.3.4").await, UNKNOWN_COUNTRY);
    }

    #[test]
    fn outcome_decoding() {
        assert_eq!(
            LookupOutcome::from_body(r#"{"status":"success","country":"Brazil"}"#),
            LookupOutcome::Resolved("Brazil".to_string())
        );
        assert!(matches!(
            LookupOutcome::from_body(r#"{"country":"Brazil"}"#),
            LookupOutcome::Unresolved(_)
        ));
        assert!(matches!(
            LookupOutcome::from_body("   "),
            LookupOutcome::Unresolved(_)
        ));
        assert!(matches!(
            LookupOutcome::from_body("not json"),
            LookupOutcome::Malformed(_)
        ));
    }
}
