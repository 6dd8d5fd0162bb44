use std::sync::Arc;

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, User};
use crate::pages::Route;
use crate::services::api::ApiClient;
use crate::services::storage::{KeyValueStore, ACCESS_TOKEN_KEY, USER_KEY};

/// Claims read from the access token payload. Only used to check that the
/// token is structurally sound; the signature and expiry are the backend's job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub rol: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Decode the middle segment of a `header.payload.signature` token.
pub fn decode_token(token: &str) -> AppResult<TokenClaims> {
    let payload = token.split('.').nth(1).ok_or(AppError::InvalidToken)?;

    let bytes = [&STANDARD, &STANDARD_NO_PAD, &URL_SAFE, &URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(payload).ok())
        .ok_or(AppError::InvalidToken)?;

    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|_| AppError::InvalidToken)?;
    if !value.is_object() {
        return Err(AppError::InvalidToken);
    }

    serde_json::from_value(value).map_err(|_| AppError::InvalidToken)
}

/// Authentication state shared by every page.
///
/// `init`, `login`, `register` and `logout` are the only operations that
/// change it. The bearer token is mirrored into the [`ApiClient`].
pub struct SessionStore {
    api: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    user: Option<User>,
    is_loading: bool,
}

impl SessionStore {
    pub fn new(api: ApiClient, storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            api,
            storage,
            user: None,
            is_loading: true,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Restore the persisted session.
    ///
    /// Nothing happens unless both a token and a user are stored. An
    /// unreadable store, a token whose payload does not decode, or a stored
    /// user that does not parse logs the session out and routes to login.
    pub async fn init(&mut self) -> AppResult<Option<Route>> {
        let stored = self
            .storage
            .get(ACCESS_TOKEN_KEY)
            .and_then(|token| Ok((token, self.storage.get(USER_KEY)?)));
        let (token, stored_user) = match stored {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Stored session is unreadable, logging out: {}", e);
                self.is_loading = false;
                return Ok(Some(self.logout().await));
            }
        };

        let outcome = match (token, stored_user) {
            (Some(token), Some(stored_user)) => match decode_token(&token) {
                Ok(claims) => match serde_json::from_str::<User>(&stored_user) {
                    Ok(user) => {
                        debug!("Restored session for {:?}", claims.sub);
                        self.api.set_token(token).await;
                        self.user = Some(user);
                        None
                    }
                    Err(e) => {
                        warn!("Stored user is unreadable, logging out: {}", e);
                        Some(self.logout().await)
                    }
                },
                Err(_) => {
                    warn!("Stored access token is malformed, logging out");
                    Some(self.logout().await)
                }
            },
            _ => None,
        };

        self.is_loading = false;
        Ok(outcome)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> AppResult<Route> {
        let response = self.api.login(email, password).await?;
        self.establish(response).await
    }

    pub async fn register(&mut self, nombre: &str, email: &str, password: &str) -> AppResult<Route> {
        let response = self.api.register(nombre, email, password).await?;
        self.establish(response).await
    }

    async fn establish(&mut self, response: AuthResponse) -> AppResult<Route> {
        let user_json = serde_json::to_string(&response.user)?;
        self.storage.set(ACCESS_TOKEN_KEY, &response.access_token)?;
        if let Err(e) = self.storage.set(USER_KEY, &user_json) {
            if let Err(cleanup) = self.storage.remove(ACCESS_TOKEN_KEY) {
                warn!("Failed to clear {} from storage: {}", ACCESS_TOKEN_KEY, cleanup);
            }
            return Err(e);
        }
        self.api.set_token(response.access_token).await;

        info!("Signed in as {}", response.user.email);
        self.user = Some(response.user);
        self.is_loading = false;
        Ok(Route::Dashboard)
    }

    /// Clear persisted and in-memory credentials. Never fails: storage errors
    /// are logged and the in-memory session is dropped regardless.
    pub async fn logout(&mut self) -> Route {
        for key in [ACCESS_TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!("Failed to clear {} from storage: {}", key, e);
            }
        }
        self.api.clear_token().await;
        self.user = None;
        Route::Login
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The signed-in user, or the route to send an anonymous visitor to.
    pub fn require_authenticated(&self) -> Result<&User, Route> {
        self.user.as_ref().ok_or(Route::Login)
    }

    /// The signed-in admin. Anonymous visitors go to login, other roles to
    /// the dashboard.
    pub fn require_admin(&self) -> Result<&User, Route> {
        let user = self.require_authenticated()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(Route::Dashboard)
        }
    }
}


#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::fixtures::{offline_api, signed_in, token_for, user};
    use super::*;
    use crate::models::UserRole;
    use crate::services::api::test_server::{spawn, user_json};
    use crate::services::storage::{FileStore, MemoryStore};

    #[test]
    fn decode_accepts_padded_and_unpadded_payloads() {
        let claims = decode_token(&token_for("u1", "ADMIN")).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("u1"));
        assert_eq!(claims.rol.as_deref(), Some("ADMIN"));

        let padded = format!("h.{}.s", STANDARD.encode(r#"{"sub":"u2"}"#));
        assert_eq!(decode_token(&padded).unwrap().sub.as_deref(), Some("u2"));
    }

    #[test]
    fn decode_rejects_malformed_tokens() {
        assert!(matches!(decode_token("no-dots"), Err(AppError::InvalidToken)));
        assert!(matches!(decode_token("a.!!!not-base64!!!.c"), Err(AppError::InvalidToken)));
        // Valid base64 but not a JSON object
        let array = format!("a.{}.c", STANDARD.encode("[1,2]"));
        assert!(matches!(decode_token(&array), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn bad_token_clears_session_and_routes_to_login() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(ACCESS_TOKEN_KEY, "header.%%%.sig").unwrap();
        storage
            .set(USER_KEY, &serde_json::to_string(&user("u1", UserRole::Admin)).unwrap())
            .unwrap();

        let api = offline_api();
        let mut session = SessionStore::new(api.clone(), storage.clone());
        assert!(session.is_loading());

        let route = session.init().await.unwrap();
        assert_eq!(route, Some(Route::Login));
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get(USER_KEY).unwrap(), None);
        assert!(!api.has_token().await);
    }

    #[tokio::test]
    async fn unreadable_user_logs_out() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(ACCESS_TOKEN_KEY, &token_for("u1", "ADMIN")).unwrap();
        storage.set(USER_KEY, "{not json").unwrap();

        let mut session = SessionStore::new(offline_api(), storage.clone());
        assert_eq!(session.init().await.unwrap(), Some(Route::Login));
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn token_without_user_is_left_alone() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        storage.set(ACCESS_TOKEN_KEY, "garbage").unwrap();

        let mut session = SessionStore::new(offline_api(), storage.clone());
        assert_eq!(session.init().await.unwrap(), None);
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("garbage"));
    }

    #[tokio::test]
    async fn restored_session_exposes_role_guards() {
        let admin = signed_in(offline_api(), user("a1", UserRole::Admin)).await;
        assert!(admin.is_admin());
        assert!(admin.require_admin().is_ok());
        assert!(admin.api().has_token().await);

        let veedor = signed_in(offline_api(), user("v1", UserRole::Veedor)).await;
        assert!(veedor.is_authenticated());
        assert!(!veedor.is_admin());
        assert_eq!(veedor.require_admin().unwrap_err(), Route::Dashboard);

        let anonymous = SessionStore::new(offline_api(), Arc::new(MemoryStore::new()));
        assert_eq!(anonymous.require_authenticated().unwrap_err(), Route::Login);
        assert_eq!(anonymous.require_admin().unwrap_err(), Route::Login);
    }

    #[tokio::test]
    async fn login_persists_token_and_user_then_logout_clears() {
        let router = Router::new().route(
            "/api/auth/login",
            post(|Json(body): Json<serde_json::Value>| async move {
                if body["password"] == "secreto" {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "user": user_json("u1", "VEEDOR"),
                            "access_token": token_for("u1", "VEEDOR")
                        })),
                    )
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"message": "Credenciales inválidas", "statusCode": 401})),
                    )
                }
            }),
        );
        let api = spawn(router).await;
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut session = SessionStore::new(api.clone(), storage.clone());

        let err = session.login("u1@nodo.org", "mala").await.unwrap_err();
        assert_eq!(err.user_message(), "Credenciales inválidas");
        assert!(!session.is_authenticated());

        let route = session.login("u1@nodo.org", "secreto").await.unwrap();
        assert_eq!(route, Route::Dashboard);
        assert_eq!(session.user().unwrap().id, "u1");
        assert!(storage.get(ACCESS_TOKEN_KEY).unwrap().is_some());
        assert!(api.has_token().await);

        assert_eq!(session.logout().await, Route::Login);
        assert!(storage.get(USER_KEY).unwrap().is_none());
        assert!(!api.has_token().await);
    }

    fn login_router() -> Router {
        Router::new().route(
            "/api/auth/login",
            post(|| async {
                Json(json!({
                    "user": user_json("u1", "VEEDOR"),
                    "access_token": token_for("u1", "VEEDOR")
                }))
            }),
        )
    }

    #[tokio::test]
    async fn truncated_session_file_logs_out_and_allows_login() {
        let dir = std::env::temp_dir().join(format!(
            "nodo-calendar-session-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("session.json"), r#"{"access_token": "abc"#).unwrap();

        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::in_dir(&dir));
        let mut session = SessionStore::new(spawn(login_router()).await, storage.clone());

        assert_eq!(session.init().await.unwrap(), Some(Route::Login));
        assert!(!session.is_authenticated());
        assert!(!session.is_loading());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);

        session.login("u1@nodo.org", "secreto").await.unwrap();
        assert!(session.is_authenticated());
        assert!(storage.get(USER_KEY).unwrap().is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Memory store that refuses to save the user.
    struct UserWriteFails(MemoryStore);

    impl KeyValueStore for UserWriteFails {
        fn get(&self, key: &str) -> AppResult<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> AppResult<()> {
            if key == USER_KEY {
                return Err(AppError::Storage("disk full".to_string()));
            }
            self.0.set(key, value)
        }

        fn remove(&self, key: &str) -> AppResult<()> {
            self.0.remove(key)
        }
    }

    #[tokio::test]
    async fn failed_user_write_leaves_no_token_behind() {
        let api = spawn(login_router()).await;
        let storage: Arc<dyn KeyValueStore> = Arc::new(UserWriteFails(MemoryStore::new()));
        let mut session = SessionStore::new(api.clone(), storage.clone());

        let err = session.login("u1@nodo.org", "secreto").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(!session.is_authenticated());
        assert_eq!(storage.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert!(!api.has_token().await);
    }
}
