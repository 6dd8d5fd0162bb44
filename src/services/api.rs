use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, AppError, AppResult};
use crate::i18n;
use crate::models::{
    AuthResponse, CalendarResponse, CreateEventDto, CreateUserDto, Event, EventFilters,
    LoginRequest, RegisterRequest, UpcomingEventsResponse, UpdateEventDto, UpdateUserDto, User,
};

/// Typed facade over the calendar REST backend.
///
/// Injects `Authorization: Bearer <token>` whenever a token is set and turns
/// every non-2xx response into an [`ApiError`]. No retries, caching or request
/// de-duplication. Clones share the same token slot.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    pub async fn clear_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn build(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, self.api_url(endpoint))
            .header("Content-Type", "application/json");

        if let Some(token) = self.token.read().await.as_ref() {
            request = request.bearer_auth(token);
        }

        request
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> AppResult<T> {
        let response = request.send().await.map_err(|e| {
            warn!("Request to backend failed: {}", e);
            AppError::Network(e)
        })?;

        let status = response.status();
        let text = response.text().await.map_err(AppError::Network)?;

        if !status.is_success() {
            let error = error_from_body(status.as_u16(), &text);
            debug!("Backend responded {}: {}", status, error.message);
            return Err(AppError::Api(error));
        }

        // Empty bodies (204, DELETE) decode as an empty object
        if text.trim().is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> AppResult<T> {
        let request = self.build(Method::GET, endpoint).await;
        self.send(request).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let request = self.build(Method::GET, endpoint).await.query(query);
        self.send(request).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> AppResult<T> {
        let request = self.build(method, endpoint).await.json(body);
        self.send(request).await
    }

    async fn delete(&self, endpoint: &str) -> AppResult<()> {
        let request = self.build(Method::DELETE, endpoint).await;
        let _: Value = self.send(request).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Auth
    // ------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthResponse> {
        self.send_json(Method::POST, "/auth/login", &LoginRequest { email, password })
            .await
    }

    pub async fn register(&self, nombre: &str, email: &str, password: &str) -> AppResult<AuthResponse> {
        self.send_json(
            Method::POST,
            "/auth/register",
            &RegisterRequest {
                nombre,
                email,
                password,
            },
        )
        .await
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn get_users(&self) -> AppResult<Vec<User>> {
        self.get("/users").await
    }

    pub async fn get_user(&self, id: &str) -> AppResult<User> {
        self.get(&format!("/users/{}", id)).await
    }

    pub async fn create_user(&self, data: &CreateUserDto) -> AppResult<User> {
        self.send_json(Method::POST, "/users", data).await
    }

    pub async fn update_user(&self, id: &str, data: &UpdateUserDto) -> AppResult<User> {
        self.send_json(Method::PATCH, &format!("/users/{}", id), data).await
    }

    pub async fn delete_user(&self, id: &str) -> AppResult<()> {
        self.delete(&format!("/users/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub async fn get_events(&self, filters: &EventFilters) -> AppResult<Vec<Event>> {
        let query = filters.query_pairs();
        if query.is_empty() {
            self.get("/events").await
        } else {
            self.get_with_query("/events", &query).await
        }
    }

    pub async fn get_event(&self, id: &str) -> AppResult<Event> {
        self.get(&format!("/events/{}", id)).await
    }

    pub async fn create_event(&self, data: &CreateEventDto) -> AppResult<Event> {
        self.send_json(Method::POST, "/events", data).await
    }

    pub async fn update_event(&self, id: &str, data: &UpdateEventDto) -> AppResult<Event> {
        self.send_json(Method::PATCH, &format!("/events/{}", id), data).await
    }

    pub async fn delete_event(&self, id: &str) -> AppResult<()> {
        self.delete(&format!("/events/{}", id)).await
    }

    // ------------------------------------------------------------------
    // Calendar
    // ------------------------------------------------------------------

    pub async fn get_calendar(&self, year: i32, month: u32) -> AppResult<CalendarResponse> {
        self.get_with_query(
            "/calendar",
            &[("year", year.to_string()), ("month", month.to_string())],
        )
        .await
    }

    pub async fn get_upcoming_events(&self, days: u32) -> AppResult<UpcomingEventsResponse> {
        self.get_with_query("/calendar/upcoming", &[("days", days.to_string())])
            .await
    }
}

/// Build the error for a non-2xx response body.
///
/// A body that is not JSON reports a connection error; JSON without a usable
/// `message` gets the generic request error. Validation errors may carry
/// `message` as an array of strings.
fn error_from_body(status: u16, body: &str) -> ApiError {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return ApiError::new(i18n::t("error.connection"), Some(status)),
    };

    let message = match parsed.get("message") {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    };

    ApiError::new(
        message.unwrap_or_else(|| i18n::t("error.request_failed")),
        Some(status),
    )
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::test_server::{event_json, spawn, user_json};
    use super::*;
    use crate::error::ApiErrorKind;
    use crate::models::EventType;

    #[test]
    fn error_body_message_variants() {
        let e = error_from_body(404, r#"{"message":"Evento no encontrado","statusCode":404}"#);
        assert_eq!(e.message, "Evento no encontrado");
        assert_eq!(e.kind(), ApiErrorKind::NotFound);

        let e = error_from_body(400, r#"{"message":["titulo must be a string","area is invalid"]}"#);
        assert_eq!(e.message, "titulo must be a string, area is invalid");

        let e = error_from_body(500, r#"{"error":"boom"}"#);
        assert_eq!(e.message, "Error en la solicitud");

        let e = error_from_body(502, "<html>Bad Gateway</html>");
        assert_eq!(e.message, "Error de conexión");
        assert_eq!(e.status_code, Some(502));
    }

    #[test]
    fn clones_share_the_token() {
        let api = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:3000/api/".to_string(),
            timeout_seconds: 1,
        })
        .unwrap();
        assert_eq!(api.base_url(), "http://localhost:3000/api");

        let clone = api.clone();
        tokio_test::block_on(api.set_token("abc"));
        assert!(tokio_test::block_on(clone.has_token()));

        tokio_test::block_on(clone.clear_token());
        assert!(!tokio_test::block_on(api.has_token()));
    }

    #[tokio::test]
    async fn bearer_token_is_injected_only_when_set() {
        let router = Router::new().route(
            "/api/users",
            get(|headers: HeaderMap| async move {
                match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                    Some("Bearer secret-token") => {
                        (StatusCode::OK, Json(json!([user_json("u1", "ADMIN")])))
                    }
                    _ => (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({"message": "Unauthorized", "statusCode": 401})),
                    ),
                }
            }),
        );
        let api = spawn(router).await;

        let err = api.get_users().await.unwrap_err();
        assert_eq!(err.kind(), Some(ApiErrorKind::Unauthorized));
        assert_eq!(err.user_message(), "Unauthorized");

        api.set_token("secret-token").await;
        let users = api.get_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert!(users[0].is_admin());

        api.clear_token().await;
        assert!(!api.has_token().await);
        assert!(api.get_users().await.is_err());
    }

    #[tokio::test]
    async fn empty_success_body_is_not_an_error() {
        let router = Router::new().route(
            "/api/events/:id",
            delete(|Path(_id): Path<String>| async { StatusCode::NO_CONTENT }),
        );
        let api = spawn(router).await;
        api.delete_event("e1").await.unwrap();
    }

    #[tokio::test]
    async fn conflict_keeps_status_and_message() {
        let router = Router::new().route(
            "/api/users",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({"message": "El email ya está registrado", "statusCode": 409})),
                )
            }),
        );
        let api = spawn(router).await;

        let dto = CreateUserDto {
            nombre: "Ana".to_string(),
            email: "ana@nodo.org".to_string(),
            password: "secreto".to_string(),
            rol: crate::models::UserRole::Veedor,
        };
        let err = api.create_user(&dto).await.unwrap_err();
        assert_eq!(err.status_code(), Some(409));
        assert_eq!(err.kind(), Some(ApiErrorKind::Conflict));
        assert_eq!(err.user_message(), "El email ya está registrado");
    }

    #[tokio::test]
    async fn event_filters_become_query_params() {
        let router = Router::new().route(
            "/api/events",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let matches = q.get("fechaDesde").map(String::as_str) == Some("2025-03-01")
                    && q.get("tipoEvento").map(String::as_str) == Some("MASIVO")
                    && !q.contains_key("fechaHasta");
                if matches {
                    Json(json!([event_json("e1", "2025-03-02", "2025-03-02")]))
                } else {
                    Json(json!([]))
                }
            }),
        );
        let api = spawn(router).await;

        let filters = EventFilters {
            fecha_desde: chrono::NaiveDate::from_ymd_opt(2025, 3, 1),
            fecha_hasta: None,
            tipo_evento: Some(EventType::Masivo),
        };
        let events = api.get_events(&filters).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "e1");
    }

    #[tokio::test]
    async fn calendar_and_upcoming_pass_parameters() {
        let router = Router::new()
            .route(
                "/api/calendar",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "year": q["year"].parse::<i32>().unwrap(),
                        "month": q["month"].parse::<u32>().unwrap(),
                        "startDate": "2025-02-01",
                        "endDate": "2025-02-28",
                        "events": [event_json("e1", "2025-02-03", "2025-02-04")],
                        "totalEvents": 1
                    }))
                }),
            )
            .route(
                "/api/calendar/upcoming",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "startDate": "2025-02-01",
                        "endDate": "2025-02-15",
                        "days": q["days"].parse::<u32>().unwrap(),
                        "events": [],
                        "totalEvents": 0
                    }))
                }),
            );
        let api = spawn(router).await;

        let calendar = api.get_calendar(2025, 2).await.unwrap();
        assert_eq!((calendar.year, calendar.month), (2025, 2));
        assert_eq!(calendar.total_events, 1);

        let upcoming = api.get_upcoming_events(14).await.unwrap();
        assert_eq!(upcoming.days, 14);
        assert!(upcoming.events.is_empty());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_connection_error() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let api = ApiClient::new(&ApiConfig {
            base_url: format!("http://{}/api", addr),
            timeout_seconds: 2,
        })
        .unwrap();

        let err = api.get_event("e1").await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert_eq!(err.status_code(), None);
        assert_eq!(err.user_message(), "Error de conexión");
    }
}
