use chrono::NaiveDate;
use tracing::{info, warn};

use crate::forms::EventForm;
use crate::i18n;
use crate::models::{Event, EventFilters, EventType};
use crate::pages::Route;
use crate::services::api::ApiClient;
use crate::services::session::SessionStore;

/// Filterable list of every event.
pub struct EventsPage {
    api: ApiClient,
    filters: EventFilters,
    events: Vec<Event>,
    is_loading: bool,
    deleting: Option<String>,
    error: Option<String>,
}

impl EventsPage {
    pub fn new(api: ApiClient) -> Self {
        Self::with_filters(api, EventFilters::default())
    }

    pub fn with_filters(api: ApiClient, filters: EventFilters) -> Self {
        Self {
            api,
            filters,
            events: Vec::new(),
            is_loading: true,
            deleting: None,
            error: None,
        }
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.api.get_events(&self.filters).await {
            Ok(events) => self.events = events,
            Err(e) => {
                warn!("Failed to load events: {}", e);
                self.error = Some(e.message_or(&i18n::t("error.load_events")));
            }
        }
        self.is_loading = false;
    }

    /// Replace the filters, reloading only when they actually changed.
    pub async fn set_filters(&mut self, filters: EventFilters) {
        if filters != self.filters {
            self.filters = filters;
            self.load().await;
        }
    }

    pub async fn set_fecha_desde(&mut self, date: Option<NaiveDate>) {
        let filters = EventFilters {
            fecha_desde: date,
            ..self.filters.clone()
        };
        self.set_filters(filters).await;
    }

    pub async fn set_fecha_hasta(&mut self, date: Option<NaiveDate>) {
        let filters = EventFilters {
            fecha_hasta: date,
            ..self.filters.clone()
        };
        self.set_filters(filters).await;
    }

    pub async fn set_tipo_evento(&mut self, tipo: Option<EventType>) {
        let filters = EventFilters {
            tipo_evento: tipo,
            ..self.filters.clone()
        };
        self.set_filters(filters).await;
    }

    pub async fn clear_filters(&mut self) {
        self.set_filters(EventFilters::default()).await;
    }

    pub fn filters(&self) -> &EventFilters {
        &self.filters
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.active_count()
    }

    /// Delete `id`. On success the event disappears from the list right away;
    /// on failure the list is left untouched and the error is kept.
    pub async fn delete(&mut self, id: &str) -> bool {
        if self.deleting.is_some() {
            return false;
        }
        self.deleting = Some(id.to_string());

        let deleted = match self.api.delete_event(id).await {
            Ok(()) => {
                info!("Deleted event {}", id);
                self.events.retain(|e| e.id != id);
                true
            }
            Err(e) => {
                warn!("Failed to delete event {}: {}", id, e);
                self.error = Some(e.message_or(&i18n::t("error.delete_event")));
                false
            }
        };
        self.deleting = None;
        deleted
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting.is_some()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// "3 eventos encontrados"
    pub fn summary(&self) -> String {
        match self.events.len() {
            0 => i18n::t("events.empty"),
            1 => i18n::t_with("events.found_one", &[("count", "1")]),
            n => i18n::t_with("events.found_many", &[("count", &n.to_string())]),
        }
    }
}

/// Blank event form for admins; other roles are sent back to the list.
pub fn new_event_form(session: &SessionStore, date: Option<NaiveDate>) -> Result<EventForm, Route> {
    if session.is_admin() {
        Ok(EventForm::new(None, date))
    } else {
        Err(Route::Events)
    }
}
