use std::{fmt, time::Duration};

use axum::http::{Method, StatusCode};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::Error;

/// Client for the upstream LMS REST API.
///
/// Every request carries the static bearer token the platform was issued.
#[derive(Clone)]
pub struct LmsClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for LmsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LmsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Successful upstream answer, passed back to the caller verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Option<Value>,
}

impl LmsClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, Error> {
        let invalid_base_url = |reason: String| {
            Error::Server(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("invalid LMS base URL '{base_url}': {reason}"),
            )
        };
        let parsed = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| invalid_base_url(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid_base_url("not a hierarchical URL".to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|source| Error::Request {
                action: "build LMS client",
                source,
            })?;

        Ok(Self {
            http,
            base_url: parsed,
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends `path` to the base URL one percent-encoded segment at a time,
    /// so no segment can climb out of the API prefix.
    fn upstream_url(&self, path: &str, query: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                Error::Server(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("LMS base URL {} cannot carry a path", self.base_url),
                )
            })?
            .pop_if_empty()
            .extend(path.split('/').filter(|s| !s.is_empty()));
        url.set_query(query.filter(|q| !q.is_empty()));
        Ok(url)
    }

    /// Forwards one request to `{base_url}/{path}`.
    ///
    /// `action` names the operation in error bodies, e.g. "fetch exam".
    #[instrument(skip(self, body), fields(base_url = %self.base_url), err(Debug))]
    pub async fn forward(
        &self,
        action: &'static str,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<Value>,
    ) -> Result<UpstreamResponse, Error> {
        let url = self.upstream_url(path, query)?;

        let mut request = self.http.request(method, url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| Error::Request { action, source })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|source| Error::Request { action, source })?;
        debug!(%status, len = bytes.len(), "lms responded");

        let body = parse_body(&bytes);

        if !status.is_success() {
            return Err(Error::Upstream {
                action,
                status,
                details: body.unwrap_or(Value::Null),
            });
        }

        Ok(UpstreamResponse { status, body })
    }
}

/// Upstream bodies are JSON. Anything else is passed on as a JSON string.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned())),
    )
}

/// Rejects path parameters that would change the shape of the upstream URL.
///
/// `%` is refused too: the parameter is already decoded once, a remaining
/// escape such as `%2e%2e` would be read as a dot segment upstream.
pub fn segment(value: &str) -> Result<&str, Error> {
    let invalid = value.is_empty()
        || value == "."
        || value == ".."
        || value.contains(['/', '\\', '?', '#', '%']);
    if invalid {
        return Err(Error::BadRequest(format!("invalid path segment '{value}'")));
    }
    Ok(value)
}
