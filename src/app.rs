use std::collections::BTreeMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::forms::{EventForm, EventInput, SubmitOutcome};
use crate::i18n;
use crate::pages::event_detail::{edit_event_form, EditorError};
use crate::pages::events::new_event_form;
use crate::pages::public_calendar::whatsapp_link;
use crate::pages::users::{edit_user_form, new_user_form};
use crate::pages::{
    CalendarPage, DashboardPage, EventDetailPage, EventsPage, PublicCalendarPage, Route,
    UpcomingPanel, UsersPage,
};
use crate::render;
use crate::services::api::ApiClient;
use crate::services::calendar::MonthCursor;
use crate::services::dates;
use crate::services::public_gate::PublicGate;
use crate::services::session::SessionStore;
use crate::services::storage::{FileStore, KeyValueStore, MemoryStore};

/// Error for a guard that redirected instead of rendering.
fn redirected(route: Route) -> AppError {
    debug!("Redirected to {}", route);
    let key = match route {
        Route::Login => "auth.not_signed_in",
        Route::PublicGate => "gate.locked",
        _ => "auth.forbidden",
    };
    AppError::Rejected(i18n::t(key))
}

fn editor_error(e: EditorError) -> AppError {
    match e {
        EditorError::Redirect(route) => redirected(route),
        EditorError::Failed(message) => AppError::Rejected(message),
    }
}

fn page_result(error: Option<&str>) -> AppResult<()> {
    match error {
        Some(message) => Err(AppError::Rejected(message.to_string())),
        None => Ok(()),
    }
}

fn finish_submit<K: Debug>(outcome: SubmitOutcome, errors: &BTreeMap<K, String>) -> AppResult<()> {
    match outcome {
        SubmitOutcome::Saved(route) => {
            debug!("Navigating to {}", route);
            println!("{}", i18n::t("form.saved"));
            Ok(())
        }
        SubmitOutcome::Invalid => Err(AppError::Rejected(format!(
            "{}\n{}",
            i18n::t("form.invalid"),
            render::field_errors(errors).trim_end()
        ))),
        SubmitOutcome::Failed(message) => Err(AppError::Rejected(message)),
        SubmitOutcome::Busy => Ok(()),
    }
}

/// Overlay the fields of a JSON object onto `base`.
pub fn merge_input(base: &EventInput, overrides: &str) -> AppResult<EventInput> {
    let Value::Object(overrides) = serde_json::from_str::<Value>(overrides)? else {
        return Err(AppError::Validation(
            "event file must contain a JSON object".to_string(),
        ));
    };
    let mut merged = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut merged {
        fields.extend(overrides);
    }
    Ok(serde_json::from_value(merged)?)
}

fn read_input(base: &EventInput, path: &Path) -> AppResult<EventInput> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Validation(format!("{}: {}", path.display(), e)))?;
    merge_input(base, &text)
}

/// Terminal front end: one command per invocation against a restored session.
pub struct App {
    config: Config,
    session: SessionStore,
    gate: PublicGate,
}

impl App {
    /// Restore the session persisted under `DATA_DIR`.
    pub async fn start(config: Config) -> AppResult<Self> {
        let storage = Arc::new(FileStore::in_dir(&config.storage.data_dir));
        Self::new(config, storage).await
    }

    pub async fn new(config: Config, storage: Arc<dyn KeyValueStore>) -> AppResult<Self> {
        let api = ApiClient::new(&config.api)?;
        let mut session = SessionStore::new(api, storage);
        if let Some(route) = session.init().await? {
            warn!("Stored session discarded, continuing at {}", route);
        }

        // The unlock flag only lives as long as the process
        let gate = PublicGate::new(config.public.lock_password.clone(), Arc::new(MemoryStore::new()));

        Ok(Self {
            config,
            session,
            gate,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    fn api(&self) -> ApiClient {
        self.session.api().clone()
    }

    pub async fn run(&mut self, command: Command) -> AppResult<()> {
        match command {
            Command::Login { email, password } => {
                self.session.login(&email, &password).await?;
                self.print_signed_in();
                Ok(())
            }
            Command::Register {
                nombre,
                email,
                password,
            } => {
                self.session.register(&nombre, &email, &password).await?;
                self.print_signed_in();
                Ok(())
            }
            Command::Logout => {
                self.session.logout().await;
                println!("{}", i18n::t("auth.logged_out"));
                Ok(())
            }
            Command::Whoami => {
                let user = self.session.require_authenticated().map_err(redirected)?;
                println!("{}", render::user_summary(user));
                Ok(())
            }
            Command::Dashboard => self.dashboard().await,
            Command::Upcoming { days } => self.upcoming(days).await,
            Command::Calendar { month } => self.calendar(month).await,
            Command::Events { filters } => {
                self.session.require_authenticated().map_err(redirected)?;
                let mut page = EventsPage::with_filters(self.api(), filters);
                page.load().await;
                page_result(page.error())?;
                print!("{}", render::event_list(page.events()));
                println!("{}", page.summary());
                Ok(())
            }
            Command::Event { id } => {
                self.session.require_authenticated().map_err(redirected)?;
                let mut page = EventDetailPage::new(self.api(), id);
                page.load().await;
                page_result(page.error())?;
                if let Some(event) = page.event() {
                    print!("{}", render::event_detail(event));
                }
                Ok(())
            }
            Command::CreateEvent { file, date } => {
                let form = new_event_form(&self.session, date).map_err(redirected)?;
                let input = read_input(form.values(), &file)?;
                let mut form = EventForm::with_values(None, input);
                let outcome = form.submit(self.session.api()).await;
                finish_submit(outcome, form.errors())
            }
            Command::EditEvent { id, file } => {
                let form = edit_event_form(&self.session, &id).await.map_err(editor_error)?;
                let input = read_input(form.values(), &file)?;
                let mut form = EventForm::with_values(Some(id), input);
                let outcome = form.submit(self.session.api()).await;
                finish_submit(outcome, form.errors())
            }
            Command::DeleteEvent { id } => {
                self.session.require_admin().map_err(redirected)?;
                let mut page = EventDetailPage::new(self.api(), id);
                match page.delete().await {
                    Some(route) => {
                        debug!("Navigating to {}", route);
                        println!("{}", i18n::t("events.deleted"));
                        Ok(())
                    }
                    None => page_result(page.error()),
                }
            }
            Command::Users => {
                let mut page = UsersPage::open(&self.session).map_err(redirected)?;
                page.load().await;
                page_result(page.error())?;
                let current = self.session.user().map(|u| u.id.as_str());
                print!("{}", render::user_list(page.users(), current));
                Ok(())
            }
            Command::CreateUser {
                nombre,
                email,
                password,
                rol,
            } => {
                let mut form = new_user_form(&self.session).map_err(redirected)?;
                form.set_nombre(nombre);
                form.set_email(email);
                form.set_password(password);
                if let Some(rol) = rol {
                    form.set_rol(rol);
                }
                let outcome = form.submit(self.session.api()).await;
                finish_submit(outcome, form.errors())
            }
            Command::EditUser {
                id,
                nombre,
                email,
                password,
                rol,
            } => {
                let mut form = edit_user_form(&self.session, &id).await.map_err(editor_error)?;
                if let Some(nombre) = nombre {
                    form.set_nombre(nombre);
                }
                if let Some(email) = email {
                    form.set_email(email);
                }
                if let Some(password) = password {
                    form.set_password(password);
                }
                if let Some(rol) = rol {
                    form.set_rol(rol);
                }
                let outcome = form.submit(self.session.api()).await;
                finish_submit(outcome, form.errors())
            }
            Command::DeleteUser { id } => {
                let mut page = UsersPage::open(&self.session).map_err(redirected)?;
                if page.delete(&id).await {
                    println!("{}", i18n::t("users.deleted"));
                    Ok(())
                } else {
                    page_result(page.error())
                }
            }
            Command::Public {
                password,
                month,
                event,
                whatsapp,
            } => self.public(password, month, event, whatsapp).await,
        }
    }

    fn print_signed_in(&self) {
        if let Some(user) = self.session.user() {
            println!(
                "{}",
                i18n::t_with("auth.signed_in", &[("nombre", &render::user_summary(user))])
            );
        }
    }

    async fn dashboard(&self) -> AppResult<()> {
        let user = self.session.require_authenticated().map_err(redirected)?;
        let mut page = DashboardPage::new(self.api(), dates::today());
        page.load().await;
        page_result(page.error())?;

        println!("{}", i18n::t_with("dashboard.welcome", &[("nombre", &user.nombre)]));
        println!("{}\n", render::stats(&page.stats()));
        println!("{}", i18n::t("dashboard.week"));
        let highlights = page.highlights();
        if highlights.is_empty() {
            println!("{}", i18n::t("dashboard.week_empty"));
        } else {
            print!("{}", render::labelled_events(&highlights));
        }
        Ok(())
    }

    async fn upcoming(&self, days: Option<u32>) -> AppResult<()> {
        self.session.require_authenticated().map_err(redirected)?;
        let days = days.unwrap_or(self.config.ui.upcoming_days);
        let mut panel = UpcomingPanel::new(self.api(), days, dates::today())?;
        panel.load().await;
        page_result(panel.error())?;

        println!("{}", i18n::t_with("upcoming.window", &[("days", &days.to_string())]));
        let entries = panel.entries();
        if entries.is_empty() {
            println!("{}", i18n::t("upcoming.empty"));
        } else {
            print!("{}", render::labelled_events(&entries));
        }
        Ok(())
    }

    async fn calendar(&self, month: Option<MonthCursor>) -> AppResult<()> {
        self.session.require_authenticated().map_err(redirected)?;
        let mut page = CalendarPage::new(self.api(), month.unwrap_or_else(MonthCursor::today));
        page.load().await;
        page_result(page.error())?;

        let grid = page.grid()?;
        print!("{}", render::month_grid(page.cursor(), &grid, dates::today()));
        println!(
            "{}",
            i18n::t_with("calendar.total", &[("count", &page.total_events().to_string())])
        );
        Ok(())
    }

    async fn public(
        &self,
        password: Option<String>,
        month: Option<MonthCursor>,
        event: Option<String>,
        whatsapp: bool,
    ) -> AppResult<()> {
        if let Some(password) = password {
            let route = self.gate.unlock(&password)?;
            info!("{}", i18n::t("gate.granted"));
            debug!("Navigating to {}", route);
        }

        let cursor = month.unwrap_or_else(MonthCursor::today);
        let mut page =
            PublicCalendarPage::open(&self.gate, self.api(), cursor).map_err(redirected)?;
        page.load().await;
        page_result(page.error())?;

        let grid = page.grid()?;
        print!("{}", render::month_grid(page.cursor(), &grid, dates::today()));

        if let Some(id) = event {
            if !page.select(&id) {
                return Err(AppError::Rejected(i18n::t("not_found.event")));
            }
            if let Some(selected) = page.selected() {
                println!();
                print!("{}", render::event_detail(selected));
                if whatsapp {
                    println!("{}: {}", i18n::t("whatsapp.link"), whatsapp_link(selected));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::config::ApiConfig;
    use crate::models::Area;
    use crate::services::api::test_server::{event_json, user_json};
    use crate::services::session::fixtures::token_for;
    use crate::services::storage::ACCESS_TOKEN_KEY;

    #[test]
    fn file_fields_override_form_defaults() {
        let base = EventInput::for_date(chrono::NaiveDate::from_ymd_opt(2025, 6, 1));
        let merged = merge_input(&base, r#"{"titulo": "Feria", "area": "EXPLANADA"}"#).unwrap();
        assert_eq!(merged.titulo, "Feria");
        assert_eq!(merged.area, Area::Explanada);
        assert_eq!(merged.fecha_desde, "2025-06-01");
        assert_eq!(merged.hora_desde, "09:00");

        assert!(merge_input(&base, "[1, 2]").is_err());
        assert!(merge_input(&base, r#"{"area": "SOTANO"}"#).is_err());
    }

    #[test]
    fn guards_map_to_messages() {
        assert_eq!(redirected(Route::Login).user_message(), "No has iniciado sesión");
        assert_eq!(
            redirected(Route::PublicGate).user_message(),
            "Ingresa la contraseña para acceder al calendario"
        );
        assert_eq!(
            redirected(Route::Dashboard).user_message(),
            "No tienes permisos para esta acción"
        );
    }

    async fn app_for(router: Router) -> (App, Arc<dyn KeyValueStore>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = Config {
            api: ApiConfig {
                base_url: format!("http://{}/api", addr),
                timeout_seconds: 5,
            },
            ..Config::default()
        };
        let storage: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        (App::new(config, storage.clone()).await.unwrap(), storage)
    }

    #[tokio::test]
    async fn commands_require_a_session() {
        let (mut app, _) = app_for(Router::new()).await;
        let err = app.run(Command::Dashboard).await.unwrap_err();
        assert_eq!(err.user_message(), "No has iniciado sesión");
    }

    #[tokio::test]
    async fn corrupt_session_file_still_starts() {
        let dir = std::env::temp_dir().join(format!(
            "nodo-calendar-app-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("session.json"), r#"{"access_token": "abc"#).unwrap();

        let mut config = Config::default();
        config.storage.data_dir = dir.clone();
        let mut app = App::start(config).await.unwrap();
        assert!(!app.session().is_authenticated());

        app.run(Command::Logout).await.unwrap();
        let text = std::fs::read_to_string(dir.join("session.json")).unwrap();
        assert!(serde_json::from_str::<Value>(&text).is_ok());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn login_then_list_events() {
        let router = Router::new()
            .route(
                "/api/auth/login",
                post(|| async {
                    Json(json!({
                        "user": user_json("u1", "VEEDOR"),
                        "access_token": token_for("u1", "VEEDOR")
                    }))
                }),
            )
            .route(
                "/api/events",
                get(|| async { Json(json!([event_json("e1", "2025-01-01", "2025-01-01")])) }),
            );
        let (mut app, storage) = app_for(router).await;

        app.run(Command::Login {
            email: "u1@nodo.org".into(),
            password: "secreto".into(),
        })
        .await
        .unwrap();
        assert!(storage.get(ACCESS_TOKEN_KEY).unwrap().is_some());

        app.run(Command::Events {
            filters: Default::default(),
        })
        .await
        .unwrap();

        // Veedores cannot manage users
        let err = app.run(Command::Users).await.unwrap_err();
        assert_eq!(err.user_message(), "No tienes permisos para esta acción");
    }

    #[tokio::test]
    async fn public_calendar_needs_the_password() {
        let router = Router::new().route(
            "/api/calendar",
            get(|| async {
                (
                    StatusCode::OK,
                    Json(json!({
                        "year": 2025, "month": 1, "startDate": "", "endDate": "",
                        "events": [], "totalEvents": 0
                    })),
                )
            }),
        );
        let (mut app, _) = app_for(router).await;
        let month = MonthCursor::new(2025, 1).ok();

        let err = app
            .run(Command::Public {
                password: None,
                month,
                event: None,
                whatsapp: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Ingresa la contraseña para acceder al calendario");

        let err = app
            .run(Command::Public {
                password: Some("999".into()),
                month,
                event: None,
                whatsapp: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Contraseña incorrecta");

        app.run(Command::Public {
            password: Some("123".into()),
            month,
            event: None,
            whatsapp: false,
        })
        .await
        .unwrap();
    }
}
