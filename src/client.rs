//! The HTTP client every endpoint goes through.

use crate::{config::Config, credentials::CredentialStore};
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Method, RequestBuilder, Response, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_json::Value;
use std::{
    io,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use url::Url;

/// A handle to the REST backend.
///
/// Every request built through [`ApiClient::request()`] picks up the
/// persisted bearer token, if there is one. Cloning is cheap and clones
/// share the same connection pool and credentials.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    credentials: CredentialStore,
    logout_on_unauthorized: bool,
    revoked: Arc<AtomicBool>,
}

impl ApiClient {
    pub fn new(
        config: &Config,
        credentials: CredentialStore,
    ) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(ApiClient::with_client(http, config, credentials))
    }

    /// Use an existing [`reqwest::Client`] instead of building a new one.
    pub fn with_client(
        http: Client,
        config: &Config,
        credentials: CredentialStore,
    ) -> Self {
        ApiClient {
            http,
            base_url: config.base_url.clone(),
            credentials,
            logout_on_unauthorized: config.logout_on_unauthorized,
            revoked: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn base_url(&self) -> &Url { &self.base_url }

    pub fn credentials(&self) -> &CredentialStore { &self.credentials }

    /// Resolve an endpoint path (e.g. `"events/42"`) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let relative = path.trim_start_matches('/');

        self.base_url
            .join(relative)
            .map_err(|source| ApiError::BadPath {
                path: path.to_string(),
                source,
            })
    }

    /// Start a request to an endpoint, attaching the persisted token.
    pub fn request(
        &self,
        method: Method,
        path: &str,
    ) -> Result<RequestBuilder, ApiError> {
        let token = self.credentials.token();
        self.request_with_token(method, path, token.as_deref())
    }

    /// Start a request using an explicit token instead of the persisted
    /// one.
    pub fn request_with_token(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.url(path)?;
        let builder = self.http.request(method, url);

        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send a request, turning any non-2xx status into an [`ApiError`].
    pub async fn send(
        &self,
        builder: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let request = builder.build()?;
        let authenticated =
            request.headers().contains_key(header::AUTHORIZATION);

        log::debug!("Sending a {} request to {}", request.method(), request.url());
        let response = self.http.execute(request).await?;
        log::trace!("Headers: {:#?}", response.headers());

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await?;
        log::trace!("Error response ({}): {}", status, body);
        let err = ApiError::from_response(status, &body);

        if authenticated && status == StatusCode::UNAUTHORIZED {
            self.on_unauthorized();
        }

        Err(err)
    }

    /// Send a request and parse the JSON body.
    pub async fn send_json<T>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let body = self.send(builder).await?.text().await?;
        log::trace!("Response: {}", body);

        serde_json::from_str(&body).map_err(ApiError::Decode)
    }

    /// Has a 401 caused the persisted credentials to be thrown away since
    /// the last login?
    pub fn credentials_revoked(&self) -> bool {
        self.revoked.load(Ordering::SeqCst)
    }

    pub(crate) fn reset_revoked(&self) {
        self.revoked.store(false, Ordering::SeqCst);
    }

    fn on_unauthorized(&self) {
        if !self.logout_on_unauthorized {
            return;
        }

        log::info!("The backend rejected our token, forgetting the credentials");
        self.credentials.clear();
        self.revoked.store(true, Ordering::SeqCst);
    }
}

/// Errors returned by the backend or encountered while talking to it.
///
/// The status-based variants display the backend's `detail` message as-is
/// so it can be shown straight to the user.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad credentials, or an expired/invalid token.
    #[error("{}", detail)]
    Unauthorized { detail: String },
    /// Logged in, but not allowed to do this (e.g. not an admin).
    #[error("{}", detail)]
    Forbidden { detail: String },
    #[error("{}", detail)]
    NotFound { detail: String },
    /// The backend didn't like the request body.
    #[error("{}", detail)]
    Validation { status: StatusCode, detail: String },
    /// Any other non-2xx response.
    #[error("{}", detail)]
    Server { status: StatusCode, detail: String },
    /// The HTTP client encountered an error.
    #[error("Unable to send the request")]
    Network(#[from] reqwest::Error),
    #[error("Unable to parse the response")]
    Decode(#[source] serde_json::Error),
    #[error("\"{}\" isn't a valid endpoint path", path)]
    BadPath {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("\"{}\" isn't a valid MIME type", mime_type)]
    BadMimeType {
        mime_type: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unable to read \"{}\"", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ApiError {
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let detail = error_detail(status, body);

        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized { detail },
            StatusCode::FORBIDDEN => ApiError::Forbidden { detail },
            StatusCode::NOT_FOUND => ApiError::NotFound { detail },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation { status, detail }
            },
            _ => ApiError::Server { status, detail },
        }
    }

    /// The HTTP status the backend responded with, if it responded at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Forbidden { .. } => Some(StatusCode::FORBIDDEN),
            ApiError::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            ApiError::Validation { status, .. }
            | ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// The human-readable message the backend sent back.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Unauthorized { detail }
            | ApiError::Forbidden { detail }
            | ApiError::NotFound { detail }
            | ApiError::Validation { detail, .. }
            | ApiError::Server { detail, .. } => Some(detail.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Value,
}

/// Pull a message out of an error body. The backend normally sends
/// `{"detail": "..."}`, but request validation failures come back as a
/// list of `{"loc": [...], "msg": "..."}` objects.
fn error_detail(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Value::String(detail),
        }) => detail,
        Ok(ErrorBody {
            detail: Value::Array(items),
        }) => items
            .iter()
            .map(describe_validation_error)
            .collect::<Vec<_>>()
            .join("; "),
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string(),
    }
}

fn describe_validation_error(item: &Value) -> String {
    let msg = match item.get("msg").and_then(Value::as_str) {
        Some(msg) => msg,
        None => return item.to_string(),
    };

    let location: Vec<String> = item
        .get("loc")
        .and_then(Value::as_array)
        .map(|loc| {
            loc.iter()
                .map(|part| match part {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    if location.is_empty() {
        msg.to_string()
    } else {
        format!("{}: {}", location.join("."), msg)
    }
}
