//! HTTP implementation of [`AssistantsBackend`].

use crate::assistant::{Assistant, AssistantPage};
use crate::backend::{AssistantsBackend, Run, RunRequest};
use crate::error::AssistantsError;
use crate::thread::{MessagePage, ThreadMessage};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, Url};
use rootcause::Report;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Header carrying the protocol version on every call.
pub const PROTOCOL_HEADER: &str = "openai-beta";

/// Default protocol version sent in [`PROTOCOL_HEADER`].
pub const DEFAULT_PROTOCOL_VERSION: &str = "assistants=v2";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PAGE_LIMIT: &str = "100";

/// Connection settings for [`AssistantsClient`].
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    api_key: String,
    protocol_version: String,
    request_timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration with the default protocol version and timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the protocol version header value.
    #[must_use]
    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Returns the protocol version header value.
    #[must_use]
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("protocol_version", &self.protocol_version)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Parses a base URL, making sure relative endpoint paths join beneath it.
///
/// # Errors
///
/// Returns an error if the URL is malformed or cannot carry paths.
pub fn parse_base_url(raw: &str) -> Result<Url, Report<AssistantsError>> {
    let invalid = |reason: String| AssistantsError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base".to_string()).into());
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())).into());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Assistants API client over HTTP.
///
/// The bearer credential and protocol header are attached to every request
/// through the client's default headers.
#[derive(Debug, Clone)]
pub struct AssistantsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AssistantsClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or header values are invalid, or the
    /// underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, Report<AssistantsError>> {
        let base_url = parse_base_url(config.base_url())?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key()))
            .map_err(|_| AssistantsError::InvalidHeader {
                name: "Authorization",
            })?;
        auth.set_sensitive(true);
        let protocol = HeaderValue::from_str(config.protocol_version()).map_err(|_| {
            AssistantsError::InvalidHeader {
                name: PROTOCOL_HEADER,
            }
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(HeaderName::from_static(PROTOCOL_HEADER), protocol);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AssistantsError::ClientBuild {
                reason: e.to_string(),
            })?;

        Ok(Self { http, base_url })
    }

    /// Returns the base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Report<AssistantsError>> {
        self.base_url.join(path).map_err(|e| {
            AssistantsError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            }
            .into()
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, Report<AssistantsError>> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, endpoint, "assistants request failed");
            if e.is_timeout() {
                AssistantsError::Timeout {
                    endpoint: endpoint.to_string(),
                }
            } else {
                AssistantsError::RequestFailed {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(endpoint, status = %status, body = %body, "assistants endpoint returned error");
            return Err(AssistantsError::HttpStatus {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            warn!(error = %e, endpoint, "failed to parse assistants response");
            AssistantsError::ResponseParseFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(parsed)
    }
}

#[async_trait]
impl AssistantsBackend for AssistantsClient {
    #[instrument(
        skip(self, request),
        fields(assistant_id = %request.assistant_id, window = request.messages().len())
    )]
    async fn create_run(&self, request: &RunRequest) -> Result<Run, Report<AssistantsError>> {
        let endpoint = "threads/runs";
        let run: Run = self
            .execute(self.http.post(self.url(endpoint)?).json(request), endpoint)
            .await?;
        debug!(run_id = %run.id, thread_id = %run.thread_id, status = %run.status, "run created");
        Ok(run)
    }

    #[instrument(skip(self))]
    async fn get_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<Run, Report<AssistantsError>> {
        let endpoint = format!("threads/{thread_id}/runs/{run_id}");
        let run: Run = self
            .execute(self.http.get(self.url(&endpoint)?), &endpoint)
            .await?;
        debug!(status = %run.status, "run status");
        Ok(run)
    }

    #[instrument(skip(self))]
    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<Vec<ThreadMessage>, Report<AssistantsError>> {
        let endpoint = format!("threads/{thread_id}/messages");
        let url = self.url(&endpoint)?;

        let mut messages = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut query = vec![("order", "asc"), ("limit", PAGE_LIMIT)];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let page: MessagePage = self
                .execute(self.http.get(url.clone()).query(&query), &endpoint)
                .await?;
            let next = page.last_id;
            messages.extend(page.data);

            match next {
                Some(cursor) if page.has_more => after = Some(cursor),
                _ => break,
            }
        }

        debug!(count = messages.len(), "listed thread messages");
        Ok(messages)
    }

    #[instrument(skip(self))]
    async fn list_assistants(&self) -> Result<Vec<Assistant>, Report<AssistantsError>> {
        let endpoint = "assistants";
        let url = self.url(endpoint)?;

        let mut assistants = Vec::new();
        let mut after: Option<String> = None;
        loop {
            let mut query = vec![("limit", PAGE_LIMIT)];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let page: AssistantPage = self
                .execute(self.http.get(url.clone()).query(&query), endpoint)
                .await?;
            let next = page.last_id;
            assistants.extend(page.data);

            match next {
                Some(cursor) if page.has_more => after = Some(cursor),
                _ => break,
            }
        }

        debug!(count = assistants.len(), "listed assistants");
        Ok(assistants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{RunStatus, WindowMessage};
    use smart_dialogue_conversation::TurnRole;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AssistantsClient {
        let config = ClientConfig::new(format!("{}/v1", server.uri()), "sk-test");
        AssistantsClient::new(&config).expect("client")
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = parse_base_url("https://api.example.com/v1").expect("valid");
        assert_eq!(url.as_str(), "https://api.example.com/v1/");
        assert_eq!(
            url.join("threads/runs").expect("join").as_str(),
            "https://api.example.com/v1/threads/runs"
        );
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(parse_base_url("not a url").is_err());
        assert!(parse_base_url("mailto:someone@example.com").is_err());
        assert!(parse_base_url("ftp://example.com/").is_err());
    }

    #[test]
    fn config_debug_redacts_key() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, "sk-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn rejects_unprintable_key() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, "bad\nkey");
        assert!(AssistantsClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn create_run_sends_window_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/threads/runs"))
            .and(header("authorization", "Bearer sk-test"))
            .and(header("openai-beta", "assistants=v2"))
            .and(body_json(serde_json::json!({
                "assistant_id": "asst_1",
                "thread": {"messages": [{"role": "user", "content": "Hello"}]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1",
                "object": "thread.run",
                "thread_id": "thread_1",
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = RunRequest::new(
            "asst_1",
            vec![WindowMessage {
                role: TurnRole::User,
                content: "Hello".to_string(),
            }],
        );
        let run = client_for(&server)
            .create_run(&request)
            .await
            .expect("create run");

        assert_eq!(run.id, "run_1");
        assert_eq!(run.thread_id, "thread_1");
        assert_eq!(run.status, RunStatus::Queued);
    }

    #[tokio::test]
    async fn get_run_reads_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "run_1",
                "thread_id": "thread_1",
                "status": "completed",
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })))
            .mount(&server)
            .await;

        let run = client_for(&server)
            .get_run("thread_1", "run_1")
            .await
            .expect("get run");

        assert!(run.status.is_completed());
        assert_eq!(run.usage.map(|u| u.total_tokens), Some(15));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/threads/runs"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create_run(&RunRequest::new("asst_1", Vec::new()))
            .await
            .unwrap_err();

        assert_eq!(
            err.current_context(),
            &AssistantsError::HttpStatus {
                endpoint: "threads/runs".to_string(),
                status: 401,
                body: "invalid api key".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/runs/run_1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"unexpected\": true}"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_run("thread_1", "run_1")
            .await
            .unwrap_err();

        assert!(matches!(
            err.current_context(),
            AssistantsError::ResponseParseFailed { .. }
        ));
    }

    #[tokio::test]
    async fn list_messages_follows_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/messages"))
            .and(query_param("order", "asc"))
            .and(query_param("after", "msg_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": "msg_2",
                    "role": "assistant",
                    "run_id": "run_1",
                    "content": [{"type": "text", "text": {"value": "second", "annotations": []}}]
                }],
                "last_id": "msg_2",
                "has_more": false
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/messages"))
            .and(query_param("order", "asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": "msg_1",
                    "role": "user",
                    "run_id": null,
                    "content": [{"type": "text", "text": {"value": "first", "annotations": []}}]
                }],
                "last_id": "msg_1",
                "has_more": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let messages = client_for(&server)
            .list_messages("thread_1")
            .await
            .expect("list messages");

        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["msg_1", "msg_2"]);
        assert_eq!(messages[1].role, TurnRole::Assistant);
    }

    #[tokio::test]
    async fn list_assistants_parses_descriptors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/assistants"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [{
                    "id": "asst_1",
                    "object": "assistant",
                    "created_at": 1_700_000_000,
                    "name": "Helper",
                    "description": null,
                    "model": "gpt-4o",
                    "instructions": "Be brief.",
                    "tools": []
                }],
                "first_id": "asst_1",
                "last_id": "asst_1",
                "has_more": false
            })))
            .mount(&server)
            .await;

        let assistants = client_for(&server)
            .list_assistants()
            .await
            .expect("list assistants");

        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].name.as_deref(), Some("Helper"));
        assert_eq!(assistants[0].model, "gpt-4o");
    }
}
