//! HTTP implementation of [`ConversionApi`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use url::Url;

use super::api::{ConversionApi, UploadRequest};
use crate::config::ApiConfig;
use crate::http_client::{HttpClient, HttpResponse, TransportError};

/// Conversion API reached over HTTP.
///
/// Submissions are posted to the base URL; status and outputs live under
/// `{base}/{job_id}` and `{base}/{job_id}.{extension}`.
#[derive(Clone)]
pub struct RemoteApi {
    base_url: Url,
    client: HttpClient,
}

impl RemoteApi {
    pub fn new(base_url: &str, client: HttpClient) -> Result<Self, String> {
        let base_url =
            Url::parse(base_url).map_err(|e| format!("Invalid API URL '{}': {}", base_url, e))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("API URL '{}' cannot carry a path", base_url));
        }
        Ok(Self { base_url, client })
    }

    /// Build a client from the API section of the config.
    pub fn from_config(config: &ApiConfig) -> Result<Self, String> {
        let mut builder = HttpClient::builder(config.timeout());
        if let Some(ref ua) = config.user_agent {
            builder = builder.user_agent(ua);
        }
        if let Some(ref proxy) = config.proxy {
            builder = builder.proxy(proxy);
        }
        match config.credentials() {
            Some(credentials) => builder = builder.credentials(credentials),
            None => tracing::warn!("No API credentials configured; requests will be rejected"),
        }
        Self::new(&config.base_url, builder.build()?)
    }

    /// URL of a job resource, with an optional output extension.
    pub fn job_url(&self, job_id: &str, extension: Option<&str>) -> String {
        let segment = match extension {
            Some(ext) => format!("{}.{}", job_id, ext),
            None => job_id.to_string(),
        };
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(&segment);
        }
        url.to_string()
    }
}

#[async_trait]
impl ConversionApi for RemoteApi {
    async fn submit(&self, request: UploadRequest) -> Result<HttpResponse, TransportError> {
        let file = Part::bytes(request.content)
            .file_name(request.file_name)
            .mime_str(&request.mime_type)?;
        let form = Form::new()
            .part("file", file)
            .text("options_json", request.options_json);
        self.client.post_multipart(self.base_url.as_str(), form).await
    }

    async fn status(&self, job_id: &str) -> Result<HttpResponse, TransportError> {
        self.client.get(&self.job_url(job_id, None)).await
    }

    async fn download(
        &self,
        job_id: &str,
        extension: &str,
    ) -> Result<HttpResponse, TransportError> {
        self.client.get(&self.job_url(job_id, Some(extension))).await
    }

    fn credential_hint(&self) -> Option<String> {
        self.client.credential_hint()
    }
}
