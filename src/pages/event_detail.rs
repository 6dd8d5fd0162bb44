use tracing::{info, warn};

use crate::error::{AppError, ApiErrorKind};
use crate::forms::EventForm;
use crate::i18n;
use crate::models::Event;
use crate::pages::Route;
use crate::services::api::ApiClient;
use crate::services::session::SessionStore;

fn load_error(e: &AppError) -> String {
    if e.kind() == Some(ApiErrorKind::NotFound) {
        i18n::t("not_found.event")
    } else {
        e.message_or(&i18n::t("error.load_event"))
    }
}

pub struct EventDetailPage {
    api: ApiClient,
    id: String,
    event: Option<Event>,
    is_loading: bool,
    is_deleting: bool,
    error: Option<String>,
}

impl EventDetailPage {
    pub fn new(api: ApiClient, id: impl Into<String>) -> Self {
        Self {
            api,
            id: id.into(),
            event: None,
            is_loading: true,
            is_deleting: false,
            error: None,
        }
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.api.get_event(&self.id).await {
            Ok(event) => self.event = Some(event),
            Err(e) => {
                warn!("Failed to load event {}: {}", self.id, e);
                self.error = Some(load_error(&e));
            }
        }
        self.is_loading = false;
    }

    /// Delete the event. Success navigates to the event list; failure keeps
    /// the page and re-enables the control.
    pub async fn delete(&mut self) -> Option<Route> {
        if self.is_deleting {
            return None;
        }
        self.is_deleting = true;
        let result = self.api.delete_event(&self.id).await;
        self.is_deleting = false;

        match result {
            Ok(()) => {
                info!("Deleted event {}", self.id);
                Some(Route::Events)
            }
            Err(e) => {
                warn!("Failed to delete event {}: {}", self.id, e);
                self.error = Some(e.message_or(&i18n::t("error.delete_event")));
                None
            }
        }
    }

    pub fn edit_route(&self) -> Route {
        Route::EditEvent(self.id.clone())
    }

    pub fn event(&self) -> Option<&Event> {
        self.event.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_deleting(&self) -> bool {
        self.is_deleting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// Edit form prefilled with event `id`. Non-admins are sent to the event
/// list; a load failure yields the message to display.
pub async fn edit_event_form(session: &SessionStore, id: &str) -> Result<EventForm, EditorError> {
    if !session.is_admin() {
        return Err(EditorError::Redirect(Route::Events));
    }
    match session.api().get_event(id).await {
        Ok(event) => Ok(EventForm::new(Some(&event), None)),
        Err(e) => {
            warn!("Failed to load event {} for editing: {}", id, e);
            Err(EditorError::Failed(load_error(&e)))
        }
    }
}

/// Why an edit form could not be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    Redirect(Route),
    Failed(String),
}
