//! Who is logged in, and what are they allowed to do?

use crate::{endpoints::auth, ApiClient, ApiError, Config, User};

static ANONYMOUS: SessionState = SessionState::Anonymous;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool { self.user().is_some() }

    pub fn is_admin(&self) -> bool {
        self.user().map(|user| user.is_admin).unwrap_or(false)
    }
}

impl Default for SessionState {
    fn default() -> Self { SessionState::Anonymous }
}

/// The single source of truth for the current login.
///
/// A [`SessionContext`] owns its state and is the only thing that changes
/// it, via [`SessionContext::login()`] and [`SessionContext::logout()`].
/// Create one per application and pass it to whatever needs to know who is
/// logged in.
#[derive(Debug)]
pub struct SessionContext {
    api: ApiClient,
    state: SessionState,
    loading: bool,
    revalidate_on_startup: bool,
}

impl SessionContext {
    /// Create a context which hasn't looked at the persisted credentials
    /// yet. It stays [`SessionState::Anonymous`] and loading until
    /// [`SessionContext::initialize()`] is called.
    pub fn new(api: ApiClient, config: &Config) -> Self {
        SessionContext {
            api,
            state: SessionState::Anonymous,
            loading: true,
            revalidate_on_startup: config.revalidate_on_startup,
        }
    }

    /// Create a context and pick up any previously persisted login.
    pub async fn restore(api: ApiClient, config: &Config) -> Self {
        let mut session = SessionContext::new(api, config);
        session.initialize().await;
        session
    }

    /// Work out the initial state from the persisted credentials.
    ///
    /// The persisted token is trusted as-is unless
    /// [`Config::revalidate_on_startup`] is set, in which case the backend
    /// is asked who it belongs to first.
    pub async fn initialize(&mut self) {
        self.loading = true;
        self.api.reset_revoked();

        let credential = self.api.credentials().load();

        self.state = match credential {
            None => {
                log::debug!("No persisted credentials, starting anonymous");
                SessionState::Anonymous
            },
            Some(credential) if !self.revalidate_on_startup => {
                log::debug!(
                    "Restored the session for {}",
                    credential.user.email
                );
                SessionState::Authenticated(credential.user)
            },
            Some(credential) => self.revalidate(credential.token, credential.user).await,
        };

        self.loading = false;
    }

    async fn revalidate(&self, token: String, cached: User) -> SessionState {
        match auth::current_user_with_token(&self.api, &token).await {
            Ok(user) => {
                log::debug!("The backend confirmed the session for {}", user.email);
                self.api.credentials().save(&token, &user);
                SessionState::Authenticated(user)
            },
            Err(e @ ApiError::Unauthorized { .. })
            | Err(e @ ApiError::Forbidden { .. }) => {
                log::info!("Discarding the persisted session: {}", e);
                self.api.credentials().clear();
                SessionState::Anonymous
            },
            Err(e) => {
                log::warn!(
                    "Unable to revalidate the persisted session, trusting it anyway: {}",
                    e
                );
                SessionState::Authenticated(cached)
            },
        }
    }

    /// Is the initial state still being worked out?
    pub fn is_loading(&self) -> bool { self.loading }

    pub fn state(&self) -> &SessionState {
        if self.api.credentials_revoked() {
            &ANONYMOUS
        } else {
            &self.state
        }
    }

    pub fn user(&self) -> Option<&User> { self.state().user() }

    pub fn is_authenticated(&self) -> bool { self.state().is_authenticated() }

    pub fn is_admin(&self) -> bool { self.state().is_admin() }

    /// The client to use for everything else, already wired up to send the
    /// session's token.
    pub fn api(&self) -> &ApiClient { &self.api }

    /// Log in and remember the credentials.
    ///
    /// Nothing changes if the backend rejects the credentials or can't be
    /// reached; the error is handed back to the caller.
    pub async fn login(
        &mut self,
        identifier: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let response = auth::login(&self.api, identifier, password).await?;
        let token = response.access_token;

        let user = match response.user {
            Some(user) => user,
            None => {
                log::debug!("The login response had no user, asking for it");
                auth::current_user_with_token(&self.api, &token).await?
            },
        };

        self.api.credentials().save(&token, &user);
        self.api.reset_revoked();
        log::info!("Logged in as {}", user.email);
        self.state = SessionState::Authenticated(user.clone());

        Ok(user)
    }

    /// Forget the current login. The backend isn't told about it.
    pub fn logout(&mut self) {
        if let Some(user) = self.user() {
            log::info!("Logging out {}", user.email);
        }

        self.api.credentials().clear();
        self.api.reset_revoked();
        self.state = SessionState::Anonymous;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        endpoints::{events, stub},
        storage::{MemoryStorage, Storage},
        CredentialStore, Page,
    };
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    async fn context(
        router: Router,
        config: Config,
    ) -> (Arc<MemoryStorage>, SessionContext) {
        let base_url = stub::serve(router).await;
        let config = Config {
            base_url: crate::config::parse_base_url(&base_url).unwrap(),
            ..config
        };
        let storage = Arc::new(MemoryStorage::new());
        let credentials = CredentialStore::new(storage.clone());
        let api = ApiClient::new(&config, credentials).unwrap();

        (storage, SessionContext::new(api, &config))
    }

    fn login_router() -> Router {
        Router::new().route(
            "/auth/token",
            post(|| async {
                Json(json!({
                    "access_token": "t1",
                    "token_type": "bearer",
                    "user": {"id": 1, "full_name": "Maria", "email": "maria@x.org", "is_admin": false}
                }))
            }),
        )
    }

    #[test]
    fn derived_flags() {
        let admin = SessionState::Authenticated(User::new(1, "A", "a@x.org", true));
        let volunteer =
            SessionState::Authenticated(User::new(2, "V", "v@x.org", false));

        assert!(!SessionState::Anonymous.is_authenticated());
        assert!(!SessionState::Anonymous.is_admin());
        assert!(admin.is_admin());
        assert!(volunteer.is_authenticated());
        assert!(!volunteer.is_admin());
    }

    #[tokio::test]
    async fn successful_login() {
        let (storage, mut session) =
            context(login_router(), Config::default()).await;
        session.initialize().await;
        assert!(!session.is_loading());
        assert!(!session.is_authenticated());

        let user = session.login("maria@x.org", "secret").await.unwrap();

        assert_eq!(user.id, 1);
        assert_eq!(session.state(), &SessionState::Authenticated(user));
        assert!(session.is_authenticated());
        assert!(!session.is_admin());
        assert_eq!(storage.get("token").unwrap(), Some(String::from("t1")));
    }

    #[tokio::test]
    async fn rejected_login_changes_nothing() {
        let router = Router::new().route(
            "/auth/token",
            post(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Invalid credentials"})),
                )
            }),
        );
        let (storage, mut session) = context(router, Config::default()).await;
        session.initialize().await;

        let err = session.login("maria@x.org", "wrong").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(session.state(), &SessionState::Anonymous);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let config = Config::new("http://127.0.0.1:1").unwrap();
        let storage = Arc::new(MemoryStorage::new());
        let api =
            ApiClient::new(&config, CredentialStore::new(storage.clone()))
                .unwrap();
        let mut session = SessionContext::restore(api, &config).await;

        let err = session.login("maria@x.org", "secret").await.unwrap_err();

        assert!(matches!(err, ApiError::Network(_)));
        assert!(!session.is_authenticated());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn token_only_login_fetches_the_user() {
        let router = Router::new()
            .route(
                "/auth/token",
                post(|| async {
                    Json(json!({"access_token": "t2", "token_type": "bearer"}))
                }),
            )
            .route(
                "/users/me",
                get(|headers: HeaderMap| async move {
                    assert_eq!(stub::bearer(&headers).as_deref(), Some("t2"));
                    Json(stub::user_json(3, true))
                }),
            );
        let (_, mut session) = context(router, Config::default()).await;

        let user = session.login("123.456.789-00", "secret").await.unwrap();

        assert_eq!(user.id, 3);
        assert!(session.is_admin());
        assert_eq!(session.api().credentials().token().as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn logout_forgets_everything() {
        let (storage, mut session) =
            context(login_router(), Config::default()).await;
        session.login("maria@x.org", "secret").await.unwrap();

        session.logout();

        assert!(!session.is_authenticated());
        assert!(!session.is_admin());
        assert_eq!(session.user(), None);
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn persisted_credentials_are_trusted_without_asking() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let router = Router::new().route(
            "/users/me",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { StatusCode::UNAUTHORIZED }
            }),
        );
        let (_, session) = context(router, Config::default()).await;
        let api = session.api().clone();
        api.credentials()
            .save("stale", &User::new(1, "Maria", "maria@x.org", false));

        let session = SessionContext::restore(api, &Config::default()).await;

        assert!(session.is_authenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn revalidation_drops_rejected_tokens() {
        let router = Router::new().route(
            "/users/me",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({"detail": "Could not validate credentials"})),
                )
            }),
        );
        let config = Config {
            revalidate_on_startup: true,
            ..Config::default()
        };
        let (storage, mut session) = context(router, config).await;
        session
            .api()
            .credentials()
            .save("stale", &User::new(1, "Maria", "maria@x.org", false));

        session.initialize().await;

        assert!(!session.is_loading());
        assert!(!session.is_authenticated());
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn revalidation_refreshes_the_cached_user() {
        let router = Router::new().route(
            "/users/me",
            get(|| async { Json(stub::user_json(1, true)) }),
        );
        let config = Config {
            revalidate_on_startup: true,
            ..Config::default()
        };
        let (_, mut session) = context(router, config).await;
        session
            .api()
            .credentials()
            .save("t1", &User::new(1, "Maria", "maria@x.org", false));

        session.initialize().await;

        assert!(session.is_admin());
        assert!(session.api().credentials().load().unwrap().user.is_admin);
    }

    #[tokio::test]
    async fn unauthorized_responses_are_ignored_by_default() {
        let router = login_router().route(
            "/users/me/events",
            get(|| async { StatusCode::UNAUTHORIZED }),
        );
        let (storage, mut session) = context(router, Config::default()).await;
        session.login("maria@x.org", "secret").await.unwrap();

        let err = crate::endpoints::users::my_events(session.api())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert!(session.is_authenticated());
        assert!(!storage.is_empty());
    }

    #[tokio::test]
    async fn optionally_log_out_on_unauthorized() {
        let router = login_router().route(
            "/events",
            get(|headers: HeaderMap| async move {
                match stub::bearer(&headers) {
                    Some(_) => Err(StatusCode::UNAUTHORIZED),
                    None => Ok(Json(json!([]))),
                }
            }),
        );
        let config = Config {
            logout_on_unauthorized: true,
            ..Config::default()
        };
        let (storage, mut session) = context(router, config).await;
        session.login("maria@x.org", "secret").await.unwrap();

        let err = events::list(session.api(), Page::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert!(!session.is_authenticated());
        assert!(storage.is_empty());

        // the next request goes out without the dead token
        let got = events::list(session.api(), Page::default()).await.unwrap();
        assert!(got.is_empty());

        session.login("maria@x.org", "secret").await.unwrap();
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn wrong_password_keeps_the_current_login() {
        let router = Router::new().route(
            "/auth/token",
            post(|headers: HeaderMap, body: String| async move {
                assert_eq!(stub::bearer(&headers), None);

                if body.contains("password=secret") {
                    Ok(Json(json!({
                        "access_token": "t1",
                        "token_type": "bearer",
                        "user": {"id": 1, "full_name": "Maria", "email": "maria@x.org", "is_admin": false}
                    })))
                } else {
                    Err((
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"detail": "Invalid credentials"})),
                    ))
                }
            }),
        );
        let config = Config {
            logout_on_unauthorized: true,
            ..Config::default()
        };
        let (storage, mut session) = context(router, config).await;
        session.login("maria@x.org", "secret").await.unwrap();

        let err = session.login("maria@x.org", "wrong").await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert!(session.is_authenticated());
        assert_eq!(session.user().map(|u| u.id), Some(1));
        assert_eq!(storage.get("token").unwrap(), Some(String::from("t1")));
    }
}
