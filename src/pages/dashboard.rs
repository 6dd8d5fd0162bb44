use chrono::NaiveDate;
use tracing::warn;

use crate::i18n;
use crate::models::{Event, EventFilters, EventType, UpcomingEventsResponse};
use crate::services::api::ApiClient;
use crate::services::dates;

/// Window of the dashboard's "this week" panel.
pub const DASHBOARD_WINDOW_DAYS: u32 = 7;
pub const HIGHLIGHT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total: usize,
    pub pendientes: usize,
    pub en_curso: usize,
    pub finalizados: usize,
}

impl DashboardStats {
    pub fn from_events(events: &[Event]) -> Self {
        let count = |t: EventType| events.iter().filter(|e| e.tipo_evento == t).count();
        Self {
            total: events.len(),
            pendientes: count(EventType::Pendiente),
            en_curso: count(EventType::EnCurso),
            finalizados: count(EventType::Finalizado),
        }
    }
}

pub struct DashboardPage {
    api: ApiClient,
    today: NaiveDate,
    upcoming: Option<UpcomingEventsResponse>,
    events: Vec<Event>,
    is_loading: bool,
    error: Option<String>,
}

impl DashboardPage {
    pub fn new(api: ApiClient, today: NaiveDate) -> Self {
        Self {
            api,
            today,
            upcoming: None,
            events: Vec::new(),
            is_loading: true,
            error: None,
        }
    }

    /// Fetch the week's events and the full event list together. Both must
    /// succeed; on failure neither is replaced.
    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        let no_filters = EventFilters::default();
        let result = futures::try_join!(
            self.api.get_upcoming_events(DASHBOARD_WINDOW_DAYS),
            self.api.get_events(&no_filters),
        );

        match result {
            Ok((upcoming, events)) => {
                self.upcoming = Some(upcoming);
                self.events = events;
            }
            Err(e) => {
                warn!("Failed to load dashboard: {}", e);
                self.error = Some(e.message_or(&i18n::t("error.load_data")));
            }
        }
        self.is_loading = false;
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_events(&self.events)
    }

    /// Up to five of this week's events, each with its relative day label
    /// ("Hoy", "Mañana", "En 3 días").
    pub fn highlights(&self) -> Vec<(&Event, String)> {
        let Some(upcoming) = &self.upcoming else {
            return Vec::new();
        };

        upcoming
            .events
            .iter()
            .filter_map(|e| {
                let days = dates::days_until(&e.fecha_desde, self.today).ok()?;
                (0..=DASHBOARD_WINDOW_DAYS as i64)
                    .contains(&days)
                    .then(|| (e, dates::relative_day_label(days)))
            })
            .take(HIGHLIGHT_LIMIT)
            .collect()
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
}
