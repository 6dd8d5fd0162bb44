use tracing::{error, info};

use crate::error::AppResult;
use crate::i18n;
use crate::models::Event;
use crate::pages::Route;
use crate::services::api::ApiClient;
use crate::services::calendar::{build_month_grid, CalendarCell, MonthCursor};
use crate::services::dates::{self, DateStyle};
use crate::services::public_gate::PublicGate;

/// Characters of the event information quoted in a reminder.
const REMINDER_INFO_CHARS: usize = 100;

/// Read-only calendar behind the public password screen.
pub struct PublicCalendarPage {
    api: ApiClient,
    cursor: MonthCursor,
    events: Vec<Event>,
    selected: Option<String>,
    is_loading: bool,
    error: Option<String>,
}

impl PublicCalendarPage {
    /// Visitors who have not unlocked the gate are sent back to it.
    pub fn open(gate: &PublicGate, api: ApiClient, cursor: MonthCursor) -> Result<Self, Route> {
        if !gate.is_unlocked() {
            return Err(Route::PublicGate);
        }
        Ok(Self {
            api,
            cursor,
            events: Vec::new(),
            selected: None,
            is_loading: true,
            error: None,
        })
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.api.get_calendar(self.cursor.year, self.cursor.month).await {
            Ok(data) => self.events = data.events,
            Err(e) => {
                error!("Error loading public calendar: {}", e);
                self.error = Some(e.message_or(&i18n::t("error.load_calendar")));
            }
        }
        self.is_loading = false;
    }

    pub async fn previous_month(&mut self) {
        self.cursor = self.cursor.previous();
        self.selected = None;
        self.load().await;
    }

    pub async fn next_month(&mut self) {
        self.cursor = self.cursor.next();
        self.selected = None;
        self.load().await;
    }

    pub async fn go_to_today(&mut self) {
        self.cursor = MonthCursor::today();
        self.selected = None;
        self.load().await;
    }

    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    pub fn grid(&self) -> AppResult<Vec<CalendarCell<'_>>> {
        build_month_grid(self.cursor.year, self.cursor.month, &self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Select an event of the loaded month for the detail dialog.
    pub fn select(&mut self, id: &str) -> bool {
        if self.events.iter().any(|e| e.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Event> {
        let id = self.selected.as_deref()?;
        self.events.iter().find(|e| e.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// `wa.me` link that opens a reminder message to the event's formal contact.
pub fn whatsapp_link(event: &Event) -> String {
    let phone: String = event
        .contacto_formal
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    let fecha = dates::format_date(&event.fecha_desde, DateStyle::Long)
        .unwrap_or_else(|_| event.fecha_desde.clone());
    let informacion: String = event.informacion.chars().take(REMINDER_INFO_CHARS).collect();

    let message = i18n::t_with(
        "whatsapp.reminder",
        &[
            ("titulo", &event.titulo),
            ("area", &event.area.label()),
            ("fecha", &fecha),
            ("hora_desde", &event.hora_desde),
            ("hora_hasta", &event.hora_hasta),
            ("informacion", &informacion),
        ],
    );

    info!("Built WhatsApp reminder for event {}", event.id);
    format!("https://wa.me/{}?text={}", phone, urlencoding::encode(&message))
}
