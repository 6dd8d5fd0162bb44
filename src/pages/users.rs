use tracing::{info, warn};

use crate::error::ApiErrorKind;
use crate::forms::UserForm;
use crate::i18n;
use crate::models::User;
use crate::pages::event_detail::EditorError;
use crate::pages::Route;
use crate::services::api::ApiClient;
use crate::services::session::SessionStore;

/// User administration. Admins only.
pub struct UsersPage {
    api: ApiClient,
    current_user_id: String,
    users: Vec<User>,
    is_loading: bool,
    deleting: Option<String>,
    error: Option<String>,
}

impl UsersPage {
    /// Non-admins are redirected to the dashboard, anonymous visitors to login.
    pub fn open(session: &SessionStore) -> Result<Self, Route> {
        let admin = session.require_admin()?;
        Ok(Self {
            api: session.api().clone(),
            current_user_id: admin.id.clone(),
            users: Vec::new(),
            is_loading: true,
            deleting: None,
            error: None,
        })
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.api.get_users().await {
            Ok(users) => self.users = users,
            Err(e) => {
                warn!("Failed to load users: {}", e);
                self.error = Some(e.message_or(&i18n::t("error.load_users")));
            }
        }
        self.is_loading = false;
    }

    /// Whether the delete control is offered for `user`.
    pub fn can_delete(&self, user: &User) -> bool {
        user.id != self.current_user_id
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        if id == self.current_user_id {
            self.error = Some(i18n::t("error.cannot_delete_self"));
            return false;
        }
        if self.deleting.is_some() {
            return false;
        }
        self.deleting = Some(id.to_string());

        let deleted = match self.api.delete_user(id).await {
            Ok(()) => {
                info!("Deleted user {}", id);
                self.users.retain(|u| u.id != id);
                true
            }
            Err(e) => {
                warn!("Failed to delete user {}: {}", id, e);
                self.error = Some(e.message_or(&i18n::t("error.delete_user")));
                false
            }
        };
        self.deleting = None;
        deleted
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

pub fn new_user_form(session: &SessionStore) -> Result<UserForm, Route> {
    session.require_admin()?;
    Ok(UserForm::new(None))
}

pub async fn edit_user_form(session: &SessionStore, id: &str) -> Result<UserForm, EditorError> {
    session.require_admin().map_err(EditorError::Redirect)?;

    match session.api().get_user(id).await {
        Ok(user) => Ok(UserForm::new(Some(&user))),
        Err(e) => {
            warn!("Failed to load user {} for editing: {}", id, e);
            let message = if e.kind() == Some(ApiErrorKind::NotFound) {
                i18n::t("not_found.user")
            } else {
                e.message_or(&i18n::t("error.load_user"))
            };
            Err(EditorError::Failed(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::Path;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::models::UserRole;
    use crate::services::api::test_server::{spawn, user_json};
    use crate::services::session::fixtures::{offline_api, signed_in, user};

    #[tokio::test]
    async fn non_admins_are_redirected() {
        let veedor = signed_in(offline_api(), user("v1", UserRole::Veedor)).await;
        assert_eq!(UsersPage::open(&veedor).err(), Some(Route::Dashboard));
        assert_eq!(new_user_form(&veedor).err(), Some(Route::Dashboard));
        assert_eq!(
            edit_user_form(&veedor, "u2").await.err(),
            Some(EditorError::Redirect(Route::Dashboard))
        );
    }

    #[tokio::test]
    async fn admin_cannot_delete_own_account() {
        let deletes = Arc::new(AtomicUsize::new(0));
        let counter = deletes.clone();
        let router = Router::new()
            .route(
                "/api/users",
                get(|| async { Json(json!([user_json("a1", "ADMIN"), user_json("u2", "VEEDOR")])) }),
            )
            .route(
                "/api/users/:id",
                get(|Path(id): Path<String>| async move {
                    if id == "u2" {
                        (StatusCode::OK, Json(user_json("u2", "VEEDOR")))
                    } else {
                        (StatusCode::NOT_FOUND, Json(json!({"message": "not found"})))
                    }
                })
                .delete(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        StatusCode::NO_CONTENT
                    }
                }),
            );
        let api = spawn(router).await;
        let admin = signed_in(api, user("a1", UserRole::Admin)).await;

        let mut page = UsersPage::open(&admin).unwrap();
        page.load().await;
        assert_eq!(page.users().len(), 2);
        assert!(!page.can_delete(&page.users()[0]));
        assert!(page.can_delete(&page.users()[1]));

        assert!(!page.delete("a1").await);
        assert_eq!(page.error(), Some("No puedes eliminar tu propio usuario"));
        assert_eq!(deletes.load(Ordering::SeqCst), 0);
        assert_eq!(page.users().len(), 2);

        assert!(page.delete("u2").await);
        assert_eq!(deletes.load(Ordering::SeqCst), 1);
        assert_eq!(page.users().len(), 1);

        let form = edit_user_form(&admin, "u2").await.unwrap();
        assert_eq!(form.values().email, "u2@nodo.org");
        assert_eq!(
            edit_user_form(&admin, "zz").await.err(),
            Some(EditorError::Failed("Usuario no encontrado".to_string()))
        );
    }
}
