//! HTTP client for the conversion service.
//!
//! Wraps `reqwest` with the service credentials, a request timeout and an
//! optional SOCKS/HTTP proxy. Responses are buffered into [`HttpResponse`] so
//! callers can inspect status and body without holding the connection.

mod response;

pub use response::{truncate_chars, HttpResponse, BODY_PREVIEW_CHARS};

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::{multipart::Form, Client, Proxy, RequestBuilder, Response};
use thiserror::Error;
use tracing::debug;

use crate::privacy::{redact_secret, Credentials};

/// Default user agent sent with every request.
pub const USER_AGENT: &str = concat!("ocrbridge/", env!("CARGO_PKG_VERSION"));

/// Failure before a response was received.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub is_timeout: bool,
    pub is_connect: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_timeout: false,
            is_connect: false,
        }
    }

    /// The request ran past its deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            is_timeout: true,
            ..Self::new(message)
        }
    }

    /// No connection to the service could be established.
    pub fn connect(message: impl Into<String>) -> Self {
        Self {
            is_connect: true,
            ..Self::new(message)
        }
    }

    /// Message prefixed with the failure class when it is known.
    pub fn into_detail(self) -> String {
        if self.is_timeout {
            format!("request timed out: {}", self.message)
        } else if self.is_connect {
            format!("connection failed: {}", self.message)
        } else {
            self.message
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self {
            message,
            is_timeout: err.is_timeout(),
            is_connect: err.is_connect(),
        }
    }
}

fn extract_response_headers(response: &Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.to_string(), v.to_string()))
        })
        .collect()
}

/// Builder for constructing `HttpClient` with optional configuration.
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    credentials: Option<Credentials>,
    proxy: Option<String>,
}

impl HttpClientBuilder {
    /// Set the user agent string.
    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = Some(ua.to_string());
        self
    }

    /// Attach the service credentials sent as request headers.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Route requests through a proxy (`socks5://`, `http://`).
    pub fn proxy(mut self, proxy: &str) -> Self {
        self.proxy = Some(proxy.to_string());
        self
    }

    /// Build the `HttpClient`.
    ///
    /// # Errors
    /// Returns an error if the proxy URL is invalid or the TLS backend fails
    /// to initialize.
    pub fn build(self) -> Result<HttpClient, String> {
        let user_agent = self.user_agent.unwrap_or_else(|| USER_AGENT.to_string());

        let mut builder = Client::builder()
            .user_agent(&user_agent)
            .timeout(self.timeout)
            .gzip(true)
            .brotli(true);

        if let Some(ref proxy_url) = self.proxy {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| format!("Invalid proxy URL '{}': {}", proxy_url, e))?;
            builder = builder.proxy(proxy);
            tracing::info!("HTTP client routing through proxy {}", proxy_url);
        }

        let client = builder
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        if let Some(ref credentials) = self.credentials {
            debug!(
                "HTTP client configured for app id {} (key {})",
                credentials.app_id,
                redact_secret(&credentials.app_key)
            );
        }

        Ok(HttpClient {
            client,
            credentials: self.credentials,
        })
    }
}

/// HTTP client with credential headers and buffered responses.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpClient {
    /// Start building a client with the given request timeout.
    pub fn builder(timeout: Duration) -> HttpClientBuilder {
        HttpClientBuilder {
            timeout,
            user_agent: None,
            credentials: None,
            proxy: None,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.credentials {
            Some(ref credentials) => request
                .header("app_id", &credentials.app_id)
                .header("app_key", &credentials.app_key),
            None => request,
        }
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        request: RequestBuilder,
    ) -> Result<HttpResponse, TransportError> {
        let start = Instant::now();
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let headers = extract_response_headers(&response);
        let body = response.bytes().await?.to_vec();

        debug!(
            "{} {} -> {} ({} bytes, {:?})",
            method,
            url,
            status.as_u16(),
            body.len(),
            start.elapsed()
        );

        Ok(HttpResponse::new(status, headers, body))
    }

    /// GET a URL and buffer the response.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send("GET", url, self.client.get(url)).await
    }

    /// POST a multipart form and buffer the response.
    pub async fn post_multipart(
        &self,
        url: &str,
        form: Form,
    ) -> Result<HttpResponse, TransportError> {
        self.send("POST", url, self.client.post(url).multipart(form)).await
    }

    /// Redacted form of the configured secret, for diagnostics.
    pub fn credential_hint(&self) -> Option<String> {
        self.credentials.as_ref().map(|c| redact_secret(&c.app_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_hint_is_redacted() {
        let client = HttpClient::builder(Duration::from_secs(5))
            .credentials(Credentials::new("my-app", "secret-key-123456"))
            .build()
            .unwrap();
        let hint = client.credential_hint().unwrap();
        assert!(!hint.contains("secret"));
        assert!(hint.ends_with("3456"));
    }

    #[test]
    fn test_detail_names_failure_class() {
        assert_eq!(
            TransportError::timeout("deadline exceeded").into_detail(),
            "request timed out: deadline exceeded"
        );
        assert_eq!(
            TransportError::connect("tcp handshake").into_detail(),
            "connection failed: tcp handshake"
        );
        assert_eq!(TransportError::new("boom").into_detail(), "boom");
    }
}
