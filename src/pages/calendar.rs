use chrono::NaiveDate;
use tracing::warn;

use crate::error::AppResult;
use crate::i18n;
use crate::models::CalendarResponse;
use crate::pages::Route;
use crate::services::api::ApiClient;
use crate::services::calendar::{build_month_grid, CalendarCell, MonthCursor};
use crate::services::session::SessionStore;

/// Month view for signed-in users.
pub struct CalendarPage {
    api: ApiClient,
    cursor: MonthCursor,
    data: Option<CalendarResponse>,
    is_loading: bool,
    error: Option<String>,
}

impl CalendarPage {
    pub fn new(api: ApiClient, cursor: MonthCursor) -> Self {
        Self {
            api,
            cursor,
            data: None,
            is_loading: true,
            error: None,
        }
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.api.get_calendar(self.cursor.year, self.cursor.month).await {
            Ok(data) => self.data = Some(data),
            Err(e) => {
                warn!(
                    "Failed to load calendar {}-{}: {}",
                    self.cursor.year, self.cursor.month, e
                );
                self.data = None;
                self.error = Some(e.message_or(&i18n::t("error.load_calendar")));
            }
        }
        self.is_loading = false;
    }

    pub async fn previous_month(&mut self) {
        self.go_to(self.cursor.previous()).await;
    }

    pub async fn next_month(&mut self) {
        self.go_to(self.cursor.next()).await;
    }

    pub async fn go_to_today(&mut self) {
        self.go_to(MonthCursor::today()).await;
    }

    pub async fn go_to(&mut self, cursor: MonthCursor) {
        if cursor != self.cursor || self.data.is_none() {
            self.cursor = cursor;
            self.load().await;
        }
    }

    pub fn cursor(&self) -> MonthCursor {
        self.cursor
    }

    /// 42-cell grid of the loaded month (empty cells before the first load).
    pub fn grid(&self) -> AppResult<Vec<CalendarCell<'_>>> {
        let events = self.data.as_ref().map(|d| d.events.as_slice()).unwrap_or(&[]);
        build_month_grid(self.cursor.year, self.cursor.month, events)
    }

    pub fn total_events(&self) -> usize {
        self.data.as_ref().map(|d| d.total_events).unwrap_or(0)
    }

    /// Double-clicking a day of the displayed month opens a new event on that
    /// date. Only admins may do so.
    pub fn open_day(&self, session: &SessionStore, cell: &CalendarCell<'_>) -> Option<Route> {
        if !session.is_admin() {
            return None;
        }
        let date: NaiveDate = cell.date(self.cursor)?;
        Some(Route::NewEvent(Some(date)))
    }

    pub fn open_event(&self, id: &str) -> Route {
        Route::EventDetail(id.to_string())
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
