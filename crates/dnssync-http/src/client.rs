use dnssync_core::{Error, Result};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Default HTTP timeout for API requests (30 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Authorization scheme sent with every request
#[derive(Clone)]
pub enum Auth {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// `Authorization: Basic base64(username:password)`
    Basic { username: String, password: String },
    /// Verbatim `Authorization` header value
    Raw(String),
}

// Credentials stay out of logs
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = match self {
            Auth::Bearer(_) => "Bearer",
            Auth::Basic { .. } => "Basic",
            Auth::Raw(_) => "Raw",
        };
        f.debug_tuple(scheme).field(&"<REDACTED>").finish()
    }
}

/// The parts of a JSON API that differ between providers
///
/// Every method has a default suited to an API that returns its payload
/// unwrapped and never pages.
pub trait ApiDialect: Send + Sync {
    /// Provider id used in logs and errors
    fn provider(&self) -> &'static str;

    /// Unwrap the payload from a response envelope
    fn select_data(&self, body: Value) -> Value {
        body
    }

    /// Number of pages a list response spans, if the API pages
    fn total_pages(&self, _body: &Value) -> Option<u64> {
        None
    }

    /// Human-readable error out of an error response body
    fn error_message(&self, _body: &Value) -> Option<String> {
        None
    }

    /// Query parameters added to every request
    fn default_query(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Query parameters selecting `page` of a list
    fn page_query(&self, page: u64) -> Vec<(String, String)> {
        vec![("page".to_string(), page.to_string())]
    }
}

/// JSON REST client bound to one API
///
/// Requests are sent one at a time; there is no retry or backoff.
pub struct RestClient {
    base_url: String,
    auth: Auth,
    headers: Vec<(String, String)>,
    dialect: Box<dyn ApiDialect>,
    client: reqwest::Client,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("provider", &self.dialect.provider())
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish()
    }
}

impl RestClient {
    /// Create a client
    ///
    /// # Parameters
    ///
    /// - `base_url`: API root; request paths are joined onto it
    /// - `auth`: Authorization sent with every request
    /// - `dialect`: Envelope, paging and error layout of the API
    pub fn new(
        base_url: impl Into<String>,
        auth: Auth,
        dialect: Box<dyn ApiDialect>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into(),
            auth,
            headers: Vec::new(),
            dialect,
            client,
        })
    }

    /// Send an extra header with every request
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn provider(&self) -> &'static str {
        self.dialect.provider()
    }

    /// GET `path` and return the unwrapped payload
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value> {
        let body = self.send(Method::GET, path, query, None).await?;
        Ok(self.dialect.select_data(body))
    }

    /// GET every page of a list endpoint
    ///
    /// The first response says how many pages there are; pages 2..=n are
    /// then fetched in order and concatenated.
    pub async fn get_all(&self, path: &str, query: &[(String, String)]) -> Result<Vec<Value>> {
        let body = self.send(Method::GET, path, query, None).await?;
        let pages = self.dialect.total_pages(&body).unwrap_or(1);
        let mut items = self.list_items(path, body)?;

        for page in 2..=pages {
            let mut page_query = query.to_vec();
            page_query.extend(self.dialect.page_query(page));

            let body = self.send(Method::GET, path, &page_query, None).await?;
            items.extend(self.list_items(path, body)?);
        }

        debug!(
            "[{}] Fetched {} item(s) from {} in {} page(s)",
            self.provider(),
            items.len(),
            path,
            pages
        );
        Ok(items)
    }

    /// POST a JSON body and return the unwrapped payload
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let body = self.send(Method::POST, path, &[], Some(body)).await?;
        Ok(self.dialect.select_data(body))
    }

    /// PUT a JSON body and return the unwrapped payload
    pub async fn put(&self, path: &str, body: &Value) -> Result<Value> {
        let body = self.send(Method::PUT, path, &[], Some(body)).await?;
        Ok(self.dialect.select_data(body))
    }

    /// DELETE `path`
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    fn list_items(&self, path: &str, body: Value) -> Result<Vec<Value>> {
        match self.dialect.select_data(body) {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(Error::http(format!(
                "Expected a list from {path}, got: {other}"
            ))),
        }
    }

    /// Send one request
    ///
    /// # Returns
    ///
    /// - `Ok(Value)`: the parsed 2xx body; `Value::Null` when it is empty
    ///   or not JSON
    /// - `Err(Error)`: transport failure or a non-2xx status
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = join_url(&self.base_url, path);
        debug!("[{}] {} {}", self.provider(), method, url);

        let mut request = self
            .client
            .request(method, &url)
            .header("Accept", "application/json");

        request = match &self.auth {
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Basic { username, password } => request.basic_auth(username, Some(password)),
            Auth::Raw(value) => request.header("Authorization", value),
        };

        for (name, value) in &self.headers {
            request = request.header(name, value);
        }

        let default_query = self.dialect.default_query();
        if !default_query.is_empty() {
            request = request.query(&default_query);
        }
        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::http(format!("Request to {url} timed out: {e}"))
            } else {
                Error::http(format!("Request to {url} failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        debug!("[{}] Response Status: {}", self.provider(), status);

        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {e}")))?;

        let json = serde_json::from_str(&text).unwrap_or(Value::Null);

        if (200..300).contains(&status) {
            return Ok(json);
        }

        let message = self
            .dialect
            .error_message(&json)
            .unwrap_or_else(|| text.trim().to_string());
        Err(status_error(self.provider(), status, &message))
    }
}

/// Join a request path onto a base URL with exactly one slash between them
pub fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Value of query parameter `name` in an absolute URL
///
/// Used by APIs that report paging as links rather than counts.
pub fn query_param(url: &str, name: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Map a non-2xx status to an error
pub fn status_error(provider: &str, status: u16, message: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "{provider} rejected the credentials (HTTP {status}): {message}"
        )),
        404 => Error::http(format!("HTTP {status} Not found: {message}")),
        409 => Error::http(format!("HTTP {status} Conflict: {message}")),
        429 => Error::rate_limited(format!(
            "{provider} rate limit exceeded (HTTP {status}): {message}"
        )),
        500..=599 => Error::http(format!("HTTP {status} Server error (transient): {message}")),
        _ => Error::http(format!("HTTP {status}: {message}")),
    }
}
