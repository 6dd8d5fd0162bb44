use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ApiErrorKind;
use crate::forms::SubmitOutcome;
use crate::i18n;
use crate::models::{CreateUserDto, UpdateUserDto, User, UserRole};
use crate::pages::Route;
use crate::services::api::ApiClient;

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserField {
    Nombre,
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInput {
    pub nombre: String,
    pub email: String,
    pub password: String,
    pub rol: UserRole,
}

impl Default for UserInput {
    fn default() -> Self {
        Self {
            nombre: String::new(),
            email: String::new(),
            password: String::new(),
            rol: UserRole::Veedor,
        }
    }
}

impl UserInput {
    /// Password is never read back from the backend.
    pub fn from_user(user: &User) -> Self {
        Self {
            nombre: user.nombre.clone(),
            email: user.email.clone(),
            password: String::new(),
            rol: user.rol,
        }
    }
}

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

/// `local@domain.tld`: no whitespace, a single `@`, and a dot inside the domain.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
        .is_match(email)
}

pub struct UserForm {
    editing: Option<String>,
    values: UserInput,
    errors: BTreeMap<UserField, String>,
    is_loading: bool,
    submit_error: Option<String>,
}

impl UserForm {
    pub fn new(user: Option<&User>) -> Self {
        match user {
            Some(user) => Self::with_values(Some(user.id.clone()), UserInput::from_user(user)),
            None => Self::with_values(None, UserInput::default()),
        }
    }

    pub fn with_values(editing: Option<String>, values: UserInput) -> Self {
        Self {
            editing,
            values,
            errors: BTreeMap::new(),
            is_loading: false,
            submit_error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn values(&self) -> &UserInput {
        &self.values
    }

    pub fn error(&self, field: UserField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<UserField, String> {
        &self.errors
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn set_nombre(&mut self, value: impl Into<String>) {
        self.values.nombre = value.into();
        self.errors.remove(&UserField::Nombre);
    }

    pub fn set_email(&mut self, value: impl Into<String>) {
        self.values.email = value.into();
        self.errors.remove(&UserField::Email);
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.values.password = value.into();
        self.errors.remove(&UserField::Password);
    }

    pub fn set_rol(&mut self, value: UserRole) {
        self.values.rol = value;
    }

    pub fn validate(&mut self) -> bool {
        let mut errors = BTreeMap::new();
        let v = &self.values;

        if v.nombre.trim().is_empty() {
            errors.insert(UserField::Nombre, i18n::t("validation.nombre_required"));
        }

        if v.email.trim().is_empty() {
            errors.insert(UserField::Email, i18n::t("validation.email_required"));
        } else if !is_valid_email(&v.email) {
            errors.insert(UserField::Email, i18n::t("validation.email_invalid"));
        }

        // On edit an empty password leaves the current one unchanged
        if !self.is_editing() && v.password.is_empty() {
            errors.insert(UserField::Password, i18n::t("validation.password_required"));
        } else if !v.password.is_empty() && v.password.chars().count() < MIN_PASSWORD_LEN {
            errors.insert(
                UserField::Password,
                i18n::t_with(
                    "validation.password_too_short",
                    &[("min", &MIN_PASSWORD_LEN.to_string())],
                ),
            );
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    pub fn to_create_dto(&self) -> CreateUserDto {
        CreateUserDto {
            nombre: self.values.nombre.clone(),
            email: self.values.email.clone(),
            password: self.values.password.clone(),
            rol: self.values.rol,
        }
    }

    pub fn to_update_dto(&self) -> UpdateUserDto {
        UpdateUserDto {
            nombre: Some(self.values.nombre.clone()),
            email: Some(self.values.email.clone()),
            password: if self.values.password.is_empty() {
                None
            } else {
                Some(self.values.password.clone())
            },
            rol: Some(self.values.rol),
        }
    }

    pub async fn submit(&mut self, api: &ApiClient) -> SubmitOutcome {
        if self.is_loading {
            return SubmitOutcome::Busy;
        }
        self.submit_error = None;

        if !self.validate() {
            return SubmitOutcome::Invalid;
        }

        self.is_loading = true;
        let result = match &self.editing {
            Some(id) => api.update_user(id, &self.to_update_dto()).await,
            None => api.create_user(&self.to_create_dto()).await,
        };
        self.is_loading = false;

        match result {
            Ok(user) => {
                info!("Saved user {} ({})", user.id, user.email);
                SubmitOutcome::Saved(Route::Users)
            }
            Err(e) => {
                warn!("Failed to save user: {}", e);
                let message = if e.kind() == Some(ApiErrorKind::Conflict) {
                    i18n::t("error.duplicate_email")
                } else {
                    e.message_or(&i18n::t("error.save_user"))
                };
                self.submit_error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::{patch, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::services::api::test_server::{spawn, user_json};
    use crate::services::session::fixtures::user;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ana@nodo.org"));
        assert!(is_valid_email("a.b+c@sub.nodo.org.ar"));
        assert!(!is_valid_email("ana@nodo"));
        assert!(!is_valid_email("ana@.org"));
        assert!(!is_valid_email("ana@nodo."));
        assert!(!is_valid_email("@nodo.org"));
        assert!(!is_valid_email("ana@@nodo.org"));
        assert!(!is_valid_email("ana maria@nodo.org"));
        assert!(!is_valid_email("ana@nodo.org\n"));
        assert!(!is_valid_email(""));
        assert!(is_valid_email("a@b.c"));
    }

    #[test]
    fn password_required_only_on_create() {
        let mut form = UserForm::new(None);
        form.set_nombre("Ana");
        form.set_email("ana@nodo.org");
        assert!(!form.validate());
        assert_eq!(form.error(UserField::Password), Some("La contraseña es requerida"));

        form.set_password("12345");
        assert!(!form.validate());
        assert_eq!(
            form.error(UserField::Password),
            Some("La contraseña debe tener al menos 6 caracteres")
        );

        form.set_password("123456");
        assert!(form.validate());

        let existing = user("u1", UserRole::Admin);
        let mut edit = UserForm::new(Some(&existing));
        assert_eq!(edit.values().password, "");
        assert!(edit.validate());
        assert!(edit.to_update_dto().password.is_none());

        edit.set_password("abc");
        assert!(!edit.validate());
    }

    #[test]
    fn missing_name_and_bad_email() {
        let mut form = UserForm::new(None);
        form.set_email("ana");
        form.set_password("secreto");
        assert!(!form.validate());
        assert_eq!(form.error(UserField::Nombre), Some("El nombre es requerido"));
        assert_eq!(
            form.error(UserField::Email),
            Some("El formato del correo electrónico no es válido")
        );
        assert_eq!(form.values().rol, UserRole::Veedor);
    }

    #[tokio::test]
    async fn duplicate_email_stays_on_form() {
        let router = Router::new().route(
            "/api/users",
            post(|| async {
                (
                    StatusCode::CONFLICT,
                    Json(json!({"message": "Email already exists", "statusCode": 409})),
                )
            }),
        );
        let api = spawn(router).await;

        let mut form = UserForm::new(None);
        form.set_nombre("Ana");
        form.set_email("ana@nodo.org");
        form.set_password("secreto");

        let outcome = form.submit(&api).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed("Ya existe un usuario con este correo electrónico".to_string())
        );
        assert_eq!(
            form.submit_error(),
            Some("Ya existe un usuario con este correo electrónico")
        );
        assert!(!form.is_loading());
    }

    #[tokio::test]
    async fn edit_without_password_omits_it() {
        let router = Router::new().route(
            "/api/users/:id",
            patch(|Json(body): Json<serde_json::Value>| async move {
                if body.get("password").is_some() {
                    (StatusCode::BAD_REQUEST, Json(json!({"message": "unexpected password"})))
                } else {
                    (StatusCode::OK, Json(user_json("u1", "VEEDOR")))
                }
            }),
        );
        let api = spawn(router).await;

        let existing = user("u1", UserRole::Admin);
        let mut form = UserForm::new(Some(&existing));
        form.set_rol(UserRole::Veedor);
        assert_eq!(form.submit(&api).await, SubmitOutcome::Saved(Route::Users));
    }
}
