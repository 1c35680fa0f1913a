use crate::{ApiClient, ApiError, Message, NewUser, User};
use reqwest::Method;
use serde_derive::{Deserialize, Serialize};

/// Exchange an identifier (email or CPF) and password for a bearer token.
///
/// The backend implements the OAuth2 password flow, so the credentials are
/// sent form-encoded.
pub async fn login(
    api: &ApiClient,
    identifier: &str,
    password: &str,
) -> Result<LoginResponse, ApiError> {
    let data = LoginData {
        username: identifier,
        password,
    };
    log::trace!("Logging in as {}", identifier);

    // whatever token is persisted belongs to the previous login
    let request = api
        .request_with_token(Method::POST, "auth/token", None)?
        .form(&data);
    api.send_json(request).await
}

/// Create a new volunteer account.
pub async fn register(
    api: &ApiClient,
    new_user: &NewUser,
) -> Result<User, ApiError> {
    let request = api.request(Method::POST, "auth/register")?.json(new_user);
    api.send_json(request).await
}

/// Ask for a password reset link. The backend gives the same answer
/// whether or not the email is registered.
pub async fn reset_password(
    api: &ApiClient,
    email: &str,
) -> Result<Message, ApiError> {
    let request = api
        .request(Method::POST, "auth/reset-password")?
        .query(&[("email", email)]);
    api.send_json(request).await
}

/// Who does the persisted token belong to?
pub async fn current_user(api: &ApiClient) -> Result<User, ApiError> {
    let request = api.request(Method::GET, "users/me")?;
    api.send_json(request).await
}

/// Like [`current_user()`], but using a token which hasn't been persisted
/// yet.
pub async fn current_user_with_token(
    api: &ApiClient,
    token: &str,
) -> Result<User, ApiError> {
    let request = api.request_with_token(Method::GET, "users/me", Some(token))?;
    api.send_json(request).await
}

#[derive(Debug, Copy, Clone, Serialize)]
struct LoginData<'a> {
    username: &'a str,
    password: &'a str,
}

/// What the backend hands back after a successful login.
///
/// Older deployments only return the token, in which case the user has to
/// be fetched separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub user: Option<User>,
}

fn default_token_type() -> String { String::from("bearer") }
