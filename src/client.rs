use std::fmt;
use std::time::Duration;

use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Url,
};
use serde::de::DeserializeOwned;
use tokio::time::{sleep, timeout};

use crate::{
    decode::{decode_json, is_binary_content_type},
    retry::{into_final_error, AttemptError, AttemptState},
    Body, ClientOptions, FetchRequest, Method, Query, Result, SiputzxError,
};

/// Base URL of the public Siputzx API.
pub const DEFAULT_BASE_URL: &str = "https://api.siputzx.my.id/api";

/// Browser-like agent sent by [`SiputzxClient::fetch_json`]; some hosts reject bare clients.
const FETCH_USER_AGENT: &str = "Mozilla/5.0";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Expect {
    Json,
    Binary,
}

enum Payload {
    Text(String),
    Bytes(Vec<u8>),
}

#[derive(Clone)]
/// HTTP client for the Siputzx API host.
pub struct SiputzxClient {
    http: reqwest::Client,
    base_url: String,
    headers: HeaderMap,
    options: ClientOptions,
}

impl fmt::Debug for SiputzxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<(&str, &str)> = self
            .headers
            .keys()
            .map(|name| (name.as_str(), "<redacted>"))
            .collect();
        f.debug_struct("SiputzxClient")
            .field("base_url", &self.base_url)
            .field("headers", &header_names)
            .field("options", &self.options)
            .finish()
    }
}

impl Default for SiputzxClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SiputzxClient {
    /// Creates a client against [`DEFAULT_BASE_URL`].
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Creates a client against a custom host, e.g. a mirror or a local mock.
    ///
    /// Endpoints are appended to `base_url` with a single `/` separator.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            headers,
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads (all optional):
    /// - `SIPUTZX_BASE_URL` — API host, defaults to [`DEFAULT_BASE_URL`]
    /// - `SIPUTZX_TIMEOUT_MS` — per-attempt timeout
    /// - `SIPUTZX_MAX_ATTEMPTS` — attempt budget per call
    ///
    /// Returns an error if a variable is set but malformed.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use siputzx_http::SiputzxClient;
    ///
    /// let api = SiputzxClient::from_env().expect("malformed SIPUTZX_* env vars");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut client = match lookup("SIPUTZX_BASE_URL") {
            Some(url) if url.trim().is_empty() => {
                return Err("SIPUTZX_BASE_URL is set but empty".to_owned())
            }
            Some(url) => Self::with_base_url(url.trim()),
            None => Self::new(),
        };

        let mut options = client.options.clone();
        if let Some(timeout_ms) = read_positive(&lookup, "SIPUTZX_TIMEOUT_MS")? {
            options.timeout_ms = timeout_ms;
        }
        if let Some(max_attempts) = read_positive(&lookup, "SIPUTZX_MAX_ATTEMPTS")? {
            options.max_attempts = usize::try_from(max_attempts)
                .map_err(|_| format!("SIPUTZX_MAX_ATTEMPTS is too large: {max_attempts}"))?;
        }
        client.options = options;
        Ok(client)
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            SiputzxError::InvalidRequest(format!("invalid header name '{name}': {err}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|err| {
            SiputzxError::InvalidRequest(format!("invalid value for header '{name}': {err}"))
        })?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Sends `request` and decodes a successful body as JSON into `T`.
    ///
    /// Server errors (5xx), timeouts and transport failures are retried up to
    /// the attempt budget. Any other non-2xx status fails on the spot.
    pub async fn request<T: DeserializeOwned>(&self, request: FetchRequest) -> Result<T> {
        let url = self.build_url(&request.endpoint, &request.query)?;
        match self.send_with_retry(&request, &url, Expect::Json).await? {
            Payload::Text(body) => decode_json(&body)
                .map_err(|err| into_final_error(err, request.endpoint.trim(), 1)),
            Payload::Bytes(_) => Err(SiputzxError::Decode(
                "binary payload returned for json request".to_owned(),
            )),
        }
    }

    /// Sends `request` and returns the raw body of an octet-stream or `image/*` response.
    ///
    /// A successful response with any other content type fails with
    /// [`SiputzxError::UnexpectedContentType`].
    pub async fn request_binary(&self, request: FetchRequest) -> Result<Vec<u8>> {
        let url = self.build_url(&request.endpoint, &request.query)?;
        match self.send_with_retry(&request, &url, Expect::Binary).await? {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Text(_) => Err(SiputzxError::Decode(
                "text payload returned for binary request".to_owned(),
            )),
        }
    }

    /// GETs `endpoint` with `query` and decodes the JSON body.
    pub async fn get<T, Q>(&self, endpoint: &str, query: Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Into<Query>,
    {
        self.request(FetchRequest::get(endpoint).params(query)).await
    }

    /// GETs `endpoint` with `query` and returns the binary body.
    pub async fn get_binary<Q: Into<Query>>(&self, endpoint: &str, query: Q) -> Result<Vec<u8>> {
        self.request_binary(FetchRequest::get(endpoint).params(query)).await
    }

    /// Fetches JSON from an absolute URL outside the API host.
    ///
    /// Single attempt, same per-attempt timeout as the client options.
    pub async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let parsed = Url::parse(url)
            .map_err(|err| SiputzxError::InvalidRequest(format!("invalid url '{url}': {err}")))?;
        let mut headers = self.headers.clone();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(FETCH_USER_AGENT));

        let deadline = Duration::from_millis(self.options.timeout_ms.max(1));
        match self
            .attempt(Method::Get, &parsed, None, &headers, Expect::Json, deadline)
            .await
        {
            Ok(Payload::Text(body)) => {
                decode_json(&body).map_err(|err| into_final_error(err, url, 1))
            }
            Ok(Payload::Bytes(_)) => Err(SiputzxError::Decode(
                "binary payload returned for json request".to_owned(),
            )),
            Err(err) => Err(into_final_error(err, url, 1)),
        }
    }

    fn build_url(&self, endpoint: &str, query: &Query) -> Result<Url> {
        let endpoint = endpoint.trim();
        if endpoint.is_empty() {
            return Err(SiputzxError::InvalidRequest(
                "endpoint must not be empty".to_owned(),
            ));
        }

        let raw = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw)
            .map_err(|err| SiputzxError::InvalidRequest(format!("invalid url '{raw}': {err}")))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.iter() {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    async fn send_with_retry(
        &self,
        request: &FetchRequest,
        url: &Url,
        expect: Expect,
    ) -> Result<Payload> {
        let endpoint = request.endpoint.trim();
        let max_attempts = request.max_attempts.unwrap_or(self.options.max_attempts);
        let timeout_ms = request.timeout_ms.unwrap_or(self.options.timeout_ms);
        if timeout_ms == 0 {
            return Err(SiputzxError::InvalidRequest(
                "timeout must be greater than zero".to_owned(),
            ));
        }
        let deadline = Duration::from_millis(timeout_ms);

        let mut state = if max_attempts == 0 {
            AttemptState::Failed
        } else {
            AttemptState::Attempting(1)
        };

        let mut outcome = None;
        while let AttemptState::Attempting(attempt) = state {
            #[cfg(feature = "tracing")]
            tracing::debug!(
                endpoint,
                attempt,
                max_attempts,
                method = request.method.as_str(),
                "sending request"
            );

            let result = self
                .attempt(
                    request.method,
                    url,
                    request.body.as_ref(),
                    &self.headers,
                    expect,
                    deadline,
                )
                .await;

            match result {
                Ok(payload) => {
                    state = AttemptState::Done;
                    outcome = Some(Ok(payload));
                }
                Err(err) => {
                    state = AttemptState::after_failure(attempt, max_attempts, &err);
                    if let AttemptState::Attempting(next) = state {
                        #[cfg(feature = "tracing")]
                        log_retry(endpoint, attempt, max_attempts, &err);
                        self.wait_before_retry(next).await;
                    } else {
                        #[cfg(feature = "tracing")]
                        tracing::error!(
                            endpoint,
                            attempts = attempt,
                            "request failed after {attempt} attempt(s)"
                        );
                        outcome = Some(Err(into_final_error(err, endpoint, attempt)));
                    }
                }
            }
        }

        debug_assert!(state.is_terminal());
        outcome.unwrap_or_else(|| {
            Err(SiputzxError::ExhaustedRetries {
                endpoint: endpoint.to_owned(),
                attempts: 0,
            })
        })
    }

    /// Runs one request/response cycle under `deadline`.
    ///
    /// The whole cycle, body read included, lives inside the timeout future, so
    /// an expired deadline drops the in-flight request together with its timer.
    async fn attempt(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Body>,
        headers: &HeaderMap,
        expect: Expect,
        deadline: Duration,
    ) -> std::result::Result<Payload, AttemptError> {
        match timeout(deadline, self.exchange(method, url, body, headers, expect)).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => Err(AttemptError::Timeout),
        }
    }

    async fn exchange(
        &self,
        method: Method,
        url: &Url,
        body: Option<&Body>,
        headers: &HeaderMap,
        expect: Expect,
    ) -> std::result::Result<Payload, AttemptError> {
        let mut headers = headers.clone();
        if expect == Expect::Binary {
            headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        }

        let mut builder = self
            .http
            .request(method.into(), url.clone())
            .headers(headers);
        builder = match body {
            Some(Body::Json(value)) => builder.json(value),
            Some(Body::Bytes(bytes)) => builder
                .header(header::CONTENT_TYPE, "application/octet-stream")
                .body(bytes.clone()),
            None => builder,
        };

        let response = builder.send().await.map_err(AttemptError::Transport)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.map_err(AttemptError::Transport)?;
            return Err(AttemptError::Status { status, body });
        }

        match expect {
            Expect::Json => response
                .text()
                .await
                .map(Payload::Text)
                .map_err(AttemptError::Transport),
            Expect::Binary => {
                let content_type = response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default()
                    .to_owned();
                if !is_binary_content_type(&content_type) {
                    return Err(AttemptError::UnexpectedContentType(content_type));
                }
                response
                    .bytes()
                    .await
                    .map(|bytes| Payload::Bytes(bytes.to_vec()))
                    .map_err(AttemptError::Transport)
            }
        }
    }

    /// Waits before attempt `next_attempt`; a no-op unless backoff is configured.
    async fn wait_before_retry(&self, next_attempt: usize) {
        if let Some(delay_ms) = self.options.backoff_before(next_attempt) {
            #[cfg(feature = "tracing")]
            tracing::debug!("retrying request after {} ms", delay_ms);

            sleep(Duration::from_millis(delay_ms)).await;
        }
    }
}

#[cfg(feature = "tracing")]
fn log_retry(endpoint: &str, attempt: usize, max_attempts: usize, err: &AttemptError) {
    match err {
        AttemptError::Timeout => {
            tracing::warn!(endpoint, attempt, max_attempts, "request timed out, retrying")
        }
        AttemptError::Status { status, .. } => tracing::warn!(
            endpoint,
            attempt,
            max_attempts,
            status = status.as_u16(),
            "server error, retrying"
        ),
        other => tracing::warn!(
            endpoint,
            attempt,
            max_attempts,
            error = ?other,
            "request failed, retrying"
        ),
    }
}

fn read_positive<F>(lookup: &F, name: &str) -> std::result::Result<Option<u64>, String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(format!("{name} must be greater than zero")),
            Ok(value) => Ok(Some(value)),
            Err(err) => Err(format!("{name} is not a valid number: {err}")),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::{SiputzxClient, DEFAULT_BASE_URL};
    use crate::{ClientOptions, Query, SiputzxError};

    fn client_from(vars: &[(&str, &str)]) -> Result<SiputzxClient, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        SiputzxClient::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn env_defaults_when_nothing_is_set() {
        let client = client_from(&[]).expect("empty environment is valid");
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(client.options(), &ClientOptions::default());
    }

    #[test]
    fn env_overrides_are_trimmed_and_applied() {
        let client = client_from(&[
            ("SIPUTZX_BASE_URL", " http://h/api "),
            ("SIPUTZX_TIMEOUT_MS", " 2500"),
            ("SIPUTZX_MAX_ATTEMPTS", "5"),
        ])
        .expect("valid overrides");
        assert_eq!(client.base_url(), "http://h/api");
        assert_eq!(client.options().timeout_ms, 2_500);
        assert_eq!(client.options().max_attempts, 5);
    }

    #[test]
    fn env_rejects_empty_base_url() {
        let err = client_from(&[("SIPUTZX_BASE_URL", "   ")]).expect_err("must fail");
        assert_eq!(err, "SIPUTZX_BASE_URL is set but empty");
    }

    #[test]
    fn env_rejects_non_numeric_values() {
        let err = client_from(&[("SIPUTZX_MAX_ATTEMPTS", "abc")]).expect_err("must fail");
        assert!(err.starts_with("SIPUTZX_MAX_ATTEMPTS is not a valid number"), "{err}");

        let err = client_from(&[("SIPUTZX_TIMEOUT_MS", "10s")]).expect_err("must fail");
        assert!(err.starts_with("SIPUTZX_TIMEOUT_MS is not a valid number"), "{err}");
    }

    #[test]
    fn env_rejects_zero() {
        let err = client_from(&[("SIPUTZX_TIMEOUT_MS", "0")]).expect_err("must fail");
        assert_eq!(err, "SIPUTZX_TIMEOUT_MS must be greater than zero");

        let err = client_from(&[("SIPUTZX_MAX_ATTEMPTS", "0")]).expect_err("must fail");
        assert_eq!(err, "SIPUTZX_MAX_ATTEMPTS must be greater than zero");
    }

    #[test]
    fn build_url_joins_base_and_endpoint() {
        let client = SiputzxClient::with_base_url("http://127.0.0.1:9/api/");
        let url = client
            .build_url("/ai/llama33", &Query::from([("prompt", "hi there"), ("text", "a&b")]))
            .expect("must build url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9/api/ai/llama33?prompt=hi+there&text=a%26b"
        );
    }

    #[test]
    fn build_url_without_query_has_no_question_mark() {
        let client = SiputzxClient::new();
        let url = client
            .build_url("news/antara", &Query::new())
            .expect("must build url");
        assert_eq!(url.as_str(), format!("{DEFAULT_BASE_URL}/news/antara"));
    }

    #[test]
    fn empty_endpoint_is_rejected() {
        let client = SiputzxClient::new();
        let err = client.build_url("   ", &Query::new()).expect_err("must fail");
        assert!(matches!(err, SiputzxError::InvalidRequest(_)));
    }

    #[test]
    fn invalid_header_is_rejected() {
        let err = SiputzxClient::new()
            .with_header("bad header", "x")
            .expect_err("must fail");
        assert!(matches!(err, SiputzxError::InvalidRequest(_)));
    }

    #[test]
    fn debug_redacts_header_values() {
        let client = SiputzxClient::new()
            .with_header("x-api-key", "secret-key")
            .expect("valid header");
        let debug = format!("{client:?}");
        assert!(debug.contains("x-api-key"));
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-key"));
    }
}
