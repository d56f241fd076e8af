use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use charitable_types::api::ErrorBody;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// Supplies extra headers for each request. Called on every request so the
/// set can change over the client's lifetime (an auth token, for instance).
pub type HeaderProvider = Arc<dyn Fn() -> HeaderMap + Send + Sync>;

/// Path segments plus query pairs, resolved against the client's base URL.
///
/// Segments are percent-encoded individually, so a slug containing `/` or `?`
/// stays a single segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }
}

/// One network call per invocation; no retries, no caching.
#[derive(Clone)]
pub struct RequestClient {
    http: reqwest::Client,
    base_url: Url,
    headers: HeaderProvider,
}

impl RequestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("bad base url {}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Config(format!(
                "base url cannot carry paths: {}",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            headers: Arc::new(HeaderMap::new),
        })
    }

    /// Replace the header provider.
    pub fn with_headers<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> HeaderMap + Send + Sync + 'static,
    {
        self.headers = Arc::new(provider);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn url(&self, endpoint: &Endpoint) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("base url cannot carry paths: {}", self.base_url)))?
            .pop_if_empty()
            .extend(&endpoint.segments);
        if !endpoint.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&endpoint.query);
        }
        Ok(url)
    }

    pub async fn get<T>(&self, endpoint: &Endpoint) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request::<T, ()>(Method::GET, endpoint, None).await
    }

    pub async fn post<T, B>(&self, endpoint: &Endpoint, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    /// Send `body` as JSON and decode a JSON response.
    ///
    /// Provider headers are applied after the JSON defaults and win on conflict.
    /// A non-2xx status becomes [`ApiError::Http`] carrying the body's
    /// `message`/`error` field, or `"HTTP <status>"` when there is none.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in (self.headers)().iter() {
            headers.insert(name.clone(), value.clone());
        }

        let mut req = self.http.request(method.clone(), url.clone()).headers(headers);
        if let Some(body) = body {
            let payload = serde_json::to_vec(body)
                .map_err(|e| ApiError::Validation(format!("unserializable body: {e}")))?;
            req = req.body(payload);
        }

        let response = req.send().await.map_err(|e| {
            debug!(%method, %url, "request failed: {}", e);
            ApiError::from(e)
        })?;

        let status = response.status();
        debug!(%method, %url, status = status.as_u16(), "request complete");

        if !status.is_success() {
            // The status is the answer; a body that fails to arrive only
            // costs us the message.
            let body = match response.bytes().await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    debug!(%method, %url, "error body unreadable: {}", e);
                    None
                }
            };
            let message = body
                .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// The endpoint surface of the Charitable backend.
#[derive(Clone)]
pub struct HttpApi {
    client: RequestClient,
}

impl HttpApi {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self::new(RequestClient::new(config)?))
    }

    pub fn client(&self) -> &RequestClient {
        &self.client
    }
}
