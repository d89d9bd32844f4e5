//! Core Upbound client implementation.

use crate::error::{ClientError, Result};
use reqwest::{Client as HttpClient, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Endpoint used when a provider config does not name one.
pub const DEFAULT_ENDPOINT: &str = "https://api.upbound.io";

/// User agent sent with every request.
pub const USER_AGENT: &str = "provider-upbound";

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "SID";

/// A client for the Upbound Cloud API.
///
/// # Example
///
/// ```no_run
/// use upbound_client::Client;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("api.upbound.io")?.with_session("session-token");
/// let cp = client.get_control_plane("acme", "prod").await?;
/// println!("{:?}", cp.control_plane.configuration.current_version);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    /// Normalized base URL, no trailing slash.
    base_url: String,
    /// HTTP client.
    http: HttpClient,
    /// Session token sent as the `SID` cookie.
    session: Option<String>,
}

impl Client {
    /// Create a new client for the given endpoint.
    ///
    /// A bare host such as `api.upbound.io` is assumed to be HTTPS.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is empty, uses a scheme other than
    /// http or https, or the HTTP client cannot be created.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self> {
        let base_url = normalize_endpoint(endpoint.as_ref())?;

        let http = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            http,
            session: None,
        })
    }

    /// Create a client for an optional endpoint, falling back to
    /// [`DEFAULT_ENDPOINT`].
    pub fn for_endpoint(endpoint: Option<&str>) -> Result<Self> {
        Self::new(endpoint.unwrap_or(DEFAULT_ENDPOINT))
    }

    /// Attach a session token.
    #[must_use]
    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    /// Set a custom timeout for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be rebuilt.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = HttpClient::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(self)
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an API path.
    pub(crate) fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/v1/{}", self.base_url, path)
    }

    /// The login URL. Login lives at the host root, so any path prefix on
    /// the endpoint is dropped.
    pub(crate) fn login_url(&self) -> Result<String> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        Ok(format!("{}/v1/login", url.origin().ascii_serialization()))
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    fn with_session_cookie(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session {
            Some(ref session) => {
                builder.header(reqwest::header::COOKIE, format!("{SESSION_COOKIE}={session}"))
            }
            None => builder,
        }
    }

    /// Execute a GET request.
    pub(crate) async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        let request = self.with_session_cookie(self.http.get(&url));

        request.send().await.map_err(ClientError::Http)
    }

    /// Execute a POST request with a JSON body.
    pub(crate) async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = self.url(path);
        let request = self.with_session_cookie(self.http.post(&url)).json(body);

        request.send().await.map_err(ClientError::Http)
    }

    /// Execute a PATCH request with a JSON body.
    pub(crate) async fn patch<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = self.url(path);
        let request = self.with_session_cookie(self.http.patch(&url)).json(body);

        request.send().await.map_err(ClientError::Http)
    }

    /// Execute a DELETE request.
    pub(crate) async fn delete(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        let request = self.with_session_cookie(self.http.delete(&url));

        request.send().await.map_err(ClientError::Http)
    }

    /// Handle a response and deserialize JSON.
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T> {
        if response.status().is_success() {
            response.json::<T>().await.map_err(ClientError::Http)
        } else {
            Err(api_error(response).await)
        }
    }

    /// Handle a response whose body is not needed.
    pub(crate) async fn handle_empty_response(&self, response: Response) -> Result<()> {
        let status = response.status();

        if status.is_success() || status == StatusCode::NO_CONTENT {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}

/// Turn a failed response into [`ClientError::Api`], preferring the
/// `message` or `error` field of a JSON body.
pub(crate) async fn api_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| {
            json["message"]
                .as_str()
                .or_else(|| json["error"].as_str())
                .map(str::to_string)
        })
        .unwrap_or(body);

    ClientError::Api { status, message }
}

/// Normalize a user supplied endpoint into a base URL.
fn normalize_endpoint(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ClientError::InvalidUrl("endpoint must not be empty".into()));
    }

    let with_scheme = match raw.split_once("://") {
        Some(("http" | "https", rest)) if !rest.is_empty() => raw.to_string(),
        Some((scheme, _)) => {
            return Err(ClientError::InvalidUrl(format!(
                "URL must use http:// or https://, got: {}",
                scheme
            )));
        }
        None => format!("https://{}", raw),
    };

    Ok(with_scheme.trim_end_matches('/').to_string())
}
