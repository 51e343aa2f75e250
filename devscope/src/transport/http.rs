//! HTTP(S) client backed by `reqwest`.

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;

use super::HttpTransport;
use super::config::HttpConfig;
use super::response::HttpResponse;
use crate::error::{Error, Result, TransportError};

/// HTTP client for one device.
pub struct HttpClient {
    config: HttpConfig,
    base_url: String,
    http: reqwest::Client,
    cancel: CancellationToken,
}

impl HttpClient {
    /// Build a client for the endpoint described by `config`.
    pub fn new(config: HttpConfig, cancel: CancellationToken) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("devscope/", env!("CARGO_PKG_VERSION")));
        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(TransportError::Http)?;

        Ok(Self {
            base_url: config.base_url(),
            config,
            http,
            cancel,
        })
    }

    /// Configuration this client was created with.
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn url(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else if uri.starts_with('/') {
            format!("{}{}", self.base_url, uri)
        } else {
            format!("{}/{}", self.base_url, uri)
        }
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
        headers: &[(String, String)],
    ) -> Result<HttpResponse> {
        let url = self.url(uri);
        trace!("HTTP {method} {url}");

        let mut header_map = HeaderMap::new();
        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::InvalidRequest(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| {
                    TransportError::InvalidRequest(format!("header value '{value}': {e}"))
                })?;
            header_map.insert(name, value);
        }

        let mut request = self.http.request(method, &url).headers(header_map);
        if let Some(username) = &self.config.username {
            let password = self.config.password.as_ref().map(|p| p.expose_secret().to_string());
            request = request.basic_auth(username, password);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Error::Cancelled),
            response = request.send() => response.map_err(TransportError::Http)?,
        };

        let status = response.status().as_u16();
        if status == 404 {
            return Err(Error::not_found(format!("HTTP {uri} returned 404")));
        }
        if !response.status().is_success() {
            debug!("HTTP {uri} returned status {status}");
            return Err(TransportError::HttpStatus {
                uri: uri.to_string(),
                status,
            }
            .into());
        }

        let body = response.text().await.map_err(TransportError::Http)?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn setup() -> (MockServer, HttpConfig) {
        let server = MockServer::start().await;
        let mut config = HttpConfig::new(server.address().ip().to_string());
        config.port = Some(server.address().port());
        (server, config)
    }

    #[tokio::test]
    async fn test_get_body() {
        let (server, config) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/system"))
            .respond_with(ResponseTemplate::new(200).set_body_string("model=SRX300"))
            .mount(&server)
            .await;

        let client = HttpClient::new(config, CancellationToken::new()).unwrap();
        let response = client.request(Method::GET, "/api/system", None, &[]).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "model=SRX300");
    }

    #[tokio::test]
    async fn test_basic_auth_header() {
        let (server, mut config) = setup().await;
        config.username = Some("admin".into());
        config.password = Some(SecretString::from("secret"));
        Mock::given(method("GET"))
            .and(path("/status"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new(config, CancellationToken::new()).unwrap();
        let response = client.request(Method::GET, "status", None, &[]).await.unwrap();
        assert_eq!(response.body, "ok");
    }

    #[tokio::test]
    async fn test_status_errors() {
        let (server, config) = setup().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpClient::new(config, CancellationToken::new()).unwrap();
        let missing = client.request(Method::GET, "/missing", None, &[]).await.unwrap_err();
        assert!(missing.is_not_found());

        let broken = client.request(Method::GET, "/broken", None, &[]).await.unwrap_err();
        assert!(matches!(
            broken,
            Error::Transport(TransportError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancelled() {
        let (_server, config) = setup().await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let client = HttpClient::new(config, cancel).unwrap();
        let err = client.request(Method::GET, "/", None, &[]).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
