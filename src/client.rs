use std::env;
use std::time::{Duration, Instant};

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::backend::Backend;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{
    AdminPrompt, AdminPromptCreate, Analytics, ChatMessage, Identity, LoginRequest, LoginResponse,
    RegisterRequest, SendRequest, SendResponse, SessionInfo, StatusMessage,
};

/// Environment variable consulted when no API URL is given.
pub const API_URL_ENV: &str = "KURDCINE_API_URL";

/// API root used when neither an explicit URL nor the environment provides one.
pub const DEFAULT_API_URL: &str = "http://localhost:8001/api/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the KurdCine Chat API.
#[derive(Debug, Clone)]
pub struct ChatApi {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl ChatApi {
    /// Create a new client.
    ///
    /// The API root can be provided directly or read from the KURDCINE_API_URL
    /// environment variable; it falls back to a local development server.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The API root every endpoint is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create the headers for one request.
    ///
    /// The `Authorization` header is present exactly when a credential is given.
    pub fn request_headers(&self, credential: Option<&Credential>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(credential) = credential {
            let mut value = HeaderValue::from_str(&credential.header_value()).map_err(|_| {
                Error::validation(
                    "credential contains characters not allowed in a header",
                    Some("credential".to_string()),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Resolve an endpoint from path segments beneath the API root.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url("API URL cannot be a base", None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        #[derive(Deserialize)]
        struct ErrorResponse {
            detail: Option<Value>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let detail = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.detail)
            .and_then(|d| detail_text(&d));
        let message = match &detail {
            Some(detail) => detail.clone(),
            None if error_body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            None => error_body,
        };
        Error::api(status_code, detail, message)
    }

    /// Send a prepared request and check its status.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;

        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            let err = Self::process_error_response(response).await;
            tracing::debug!(error = %err, "request rejected");
            return Err(err);
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        credential: Option<&Credential>,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let request = self
            .client
            .get(url)
            .headers(self.request_headers(credential)?);
        Self::parse(self.execute(request).await?).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        credential: Option<&Credential>,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "POST");
        let request = self
            .client
            .post(url)
            .headers(self.request_headers(credential)?)
            .json(body);
        Self::parse(self.execute(request).await?).await
    }

    async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        credential: Option<&Credential>,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "PUT");
        let request = self
            .client
            .put(url)
            .headers(self.request_headers(credential)?)
            .json(body);
        Self::parse(self.execute(request).await?).await
    }

    async fn delete(&self, segments: &[&str], credential: Option<&Credential>) -> Result<Response> {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "DELETE");
        let request = self
            .client
            .delete(url)
            .headers(self.request_headers(credential)?);
        self.execute(request).await
    }

    /// `GET /`: reports whether the API is up.
    pub async fn health(&self) -> Result<StatusMessage> {
        self.get_json(&[""], None).await
    }

    /// `GET /admin/analytics`.
    pub async fn analytics(&self, credential: Option<&Credential>) -> Result<Analytics> {
        self.get_json(&["admin", "analytics"], credential).await
    }

    /// `GET /admin/prompts`, newest first.
    pub async fn list_prompts(&self, credential: Option<&Credential>) -> Result<Vec<AdminPrompt>> {
        self.get_json(&["admin", "prompts"], credential).await
    }

    /// `POST /admin/prompts`.
    pub async fn create_prompt(
        &self,
        credential: Option<&Credential>,
        prompt: &AdminPromptCreate,
    ) -> Result<AdminPrompt> {
        self.post_json(&["admin", "prompts"], credential, prompt)
            .await
    }

    /// `PUT /admin/prompts/{id}`.
    pub async fn update_prompt(
        &self,
        credential: Option<&Credential>,
        prompt_id: &str,
        prompt: &AdminPromptCreate,
    ) -> Result<StatusMessage> {
        self.put_json(&["admin", "prompts", prompt_id], credential, prompt)
            .await
    }

    /// `DELETE /admin/prompts/{id}`.
    pub async fn delete_prompt(
        &self,
        credential: Option<&Credential>,
        prompt_id: &str,
    ) -> Result<StatusMessage> {
        let response = self.delete(&["admin", "prompts", prompt_id], credential).await?;
        Self::parse(response).await
    }
}

#[async_trait::async_trait]
impl Backend for ChatApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.post_json(&["auth", "login"], None, request).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<Identity> {
        self.post_json(&["auth", "register"], None, request).await
    }

    async fn me(&self, credential: Option<&Credential>) -> Result<Identity> {
        self.get_json(&["auth", "me"], credential).await
    }

    async fn list_sessions(&self, credential: Option<&Credential>) -> Result<Vec<SessionInfo>> {
        self.get_json(&["chat", "sessions"], credential).await
    }

    async fn session_messages(
        &self,
        credential: Option<&Credential>,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>> {
        self.get_json(&["chat", "sessions", session_id, "messages"], credential)
            .await
    }

    async fn send_message(
        &self,
        credential: Option<&Credential>,
        request: &SendRequest,
    ) -> Result<SendResponse> {
        self.post_json(&["chat", "send"], credential, request).await
    }

    async fn delete_session(
        &self,
        credential: Option<&Credential>,
        session_id: &str,
    ) -> Result<()> {
        self.delete(&["chat", "sessions", session_id], credential)
            .await
            .map(|_| ())
    }
}

/// Parse an API root, making sure it ends in `/`.
pub fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be used as an API root"), None));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Human-readable text of a `detail` field.
///
/// The server sends either a string, or for request validation failures a
/// list of objects each carrying a `msg`.
fn detail_text(detail: &Value) -> Option<String> {
    match detail {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let messages = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>();
            if messages.is_empty() {
                Some(detail.to_string())
            } else {
                Some(messages.join("; "))
            }
        }
        other => Some(other.to_string()),
    }
}
