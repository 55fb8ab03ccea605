//! Low-level access to the SoundCloud REST API
//!
//! This module speaks HTTP: building requests from resolved
//! [`ApiResource`]s, attaching the credential when the resource asks for
//! it, mapping error responses onto the crate error taxonomy, and probing
//! signed stream URLs for their CDN relocation target.

pub mod resolver;

use crate::error::{Result, SoundCloudError};
use reqwest::{header, redirect, Client, Response};
use self::resolver::ApiResource;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default base URL of the SoundCloud API
pub const DEFAULT_BASE_URL: &str = "https://api.soundcloud.com";

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default User-Agent
const DEFAULT_USER_AGENT: &str = "pmosoundcloud/0.1";

/// Low-level API client
///
/// Holds two HTTP clients: the regular one, and one with redirect
/// following disabled for the redirect probe. Cloning is cheap, the
/// underlying connection pools are shared.
#[derive(Debug, Clone)]
pub struct SoundCloudApi {
    client: Client,
    probe_client: Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Builder for [`SoundCloudApi`]
#[derive(Debug, Clone)]
pub struct ApiBuilder {
    base_url: String,
    timeout: Duration,
    auth_token: Option<String>,
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            auth_token: None,
        }
    }
}

impl ApiBuilder {
    /// Override the API base URL (test seam)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Override the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the OAuth credential
    pub fn auth_token(mut self, token: Option<String>) -> Self {
        self.auth_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Build the API client
    pub fn build(self) -> Result<SoundCloudApi> {
        let client = Client::builder()
            .timeout(self.timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        // Redirect probe client: never follow, the Location header is the result
        let probe_client = Client::builder()
            .timeout(self.timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(SoundCloudApi {
            client,
            probe_client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            auth_token: self.auth_token,
        })
    }
}

impl SoundCloudApi {
    /// Create a client against the public API with no credential
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ApiBuilder {
        ApiBuilder::default()
    }

    /// Base URL in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a credential is configured
    pub fn has_auth_token(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Perform a GET against a resolved resource and decode the body
    pub(crate) async fn get<T: DeserializeOwned>(&self, resource: &ApiResource) -> Result<T> {
        let url = format!("{}/{}", self.base_url, resource.path);

        debug!(
            "GET {} with {} params (auth: {})",
            url,
            resource.query.len(),
            resource.requires_auth && self.auth_token.is_some()
        );

        let mut request = self.client.get(&url).query(&resource.query);

        // Authenticated resources fall back to anonymous access when no
        // credential is configured; server-side anonymous limits apply.
        if resource.requires_auth {
            if let Some(ref token) = self.auth_token {
                request = request.header(header::AUTHORIZATION, format!("OAuth {token}"));
            }
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Perform a GET and return the raw decoded JSON value
    pub(crate) async fn get_value(&self, resource: &ApiResource) -> Result<Value> {
        self.get(resource).await
    }

    /// Probe a stream URL for its CDN relocation target
    ///
    /// Issues a GET with redirect following disabled and returns the
    /// `Location` header. A response without a relocation target is a
    /// terminal stream-resolution failure, even when the status is 2xx.
    pub async fn probe_redirect(&self, url: &str) -> Result<String> {
        debug!("Probing redirect for {}", url);

        let mut request = self.probe_client.get(url);
        if let Some(ref token) = self.auth_token {
            request = request.header(header::AUTHORIZATION, format!("OAuth {token}"));
        }

        let response = request.send().await?;
        let status = response.status();

        if let Some(location) = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
        {
            return Ok(location.to_string());
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!("Redirect probe failed ({}): {}", status, text);
            return Err(SoundCloudError::from_status_code(status.as_u16(), text));
        }

        warn!("Redirect probe for {} returned {} without Location", url, status);
        Err(SoundCloudError::RedirectMissing(url.to_string()))
    }

    /// Decode an HTTP response, surfacing structured API errors
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let status_code = status.as_u16();

        debug!("Response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&error_text).unwrap_or(error_text);
            warn!("API error ({}): {}", status_code, message);
            return Err(SoundCloudError::from_status_code(status_code, message));
        }

        let text = response.text().await?;

        // A structured error field can ride on a successful status
        if let Some(message) = extract_error_message(&text) {
            warn!("SoundCloud API error: {}", message);
            return Err(SoundCloudError::RemoteApi {
                code: status_code,
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!("Failed to parse response: {}", e);
            SoundCloudError::Decode(e)
        })
    }
}

/// Pull a server-supplied error message out of a response body
///
/// The API reports errors either as `{"errors": [{"error_message": ..}]}`
/// or as a plain `{"error": ..}` field.
fn extract_error_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;

    if let Some(message) = json
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|e| e.get("error_message"))
        .and_then(Value::as_str)
    {
        return Some(message.to_string());
    }

    json.get("error")
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}
