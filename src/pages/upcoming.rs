use chrono::NaiveDate;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::models::{Event, UpcomingEventsResponse};
use crate::services::api::ApiClient;
use crate::services::dates;

/// Windows offered by the panel's selector.
pub const DAY_WINDOWS: [u32; 3] = [7, 14, 30];

/// "Próximos eventos" panel with a selectable window.
pub struct UpcomingPanel {
    api: ApiClient,
    today: NaiveDate,
    days: u32,
    data: Option<UpcomingEventsResponse>,
    is_loading: bool,
    error: Option<String>,
}

impl UpcomingPanel {
    pub fn new(api: ApiClient, days: u32, today: NaiveDate) -> AppResult<Self> {
        check_window(days)?;
        Ok(Self {
            api,
            today,
            days,
            data: None,
            is_loading: true,
            error: None,
        })
    }

    pub async fn load(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.api.get_upcoming_events(self.days).await {
            Ok(data) => self.data = Some(data),
            Err(e) => {
                warn!("Failed to load upcoming events: {}", e);
                self.error = Some(e.message_or(&i18n::t("error.load_events")));
            }
        }
        self.is_loading = false;
    }

    /// Change the window and reload. Selecting the current window is a no-op.
    pub async fn set_days(&mut self, days: u32) -> AppResult<()> {
        check_window(days)?;
        if days != self.days {
            self.days = days;
            self.load().await;
        }
        Ok(())
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Events with a relative label computed from their start date.
    pub fn entries(&self) -> Vec<(&Event, String)> {
        let Some(data) = &self.data else {
            return Vec::new();
        };
        data.events
            .iter()
            .map(|e| {
                let label = match dates::days_until(&e.fecha_desde, self.today) {
                    Ok(days) => dates::relative_day_label(days),
                    Err(_) => e.fecha_desde.clone(),
                };
                (e, label)
            })
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

fn check_window(days: u32) -> AppResult<()> {
    if DAY_WINDOWS.contains(&days) {
        Ok(())
    } else {
        Err(AppError::Validation(i18n::t_with(
            "upcoming.invalid_window",
            &[("days", &days.to_string())],
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::services::api::test_server::{event_json, spawn};

    #[test]
    fn only_offered_windows_are_accepted() {
        let api = crate::services::session::fixtures::offline_api();
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(UpcomingPanel::new(api.clone(), 14, today).is_ok());
        let err = UpcomingPanel::new(api, 10, today).err().unwrap();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn changing_window_reloads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let router = Router::new().route(
            "/api/calendar/upcoming",
            get(move |Query(q): Query<std::collections::HashMap<String, String>>| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    let days: u32 = q["days"].parse().unwrap();
                    Json(json!({
                        "startDate": "2025-03-10",
                        "endDate": "2025-04-09",
                        "days": days,
                        "events": [event_json("e1", "2025-03-12", "2025-03-12")],
                        "totalEvents": 1
                    }))
                }
            }),
        );
        let api = spawn(router).await;
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let mut panel = UpcomingPanel::new(api, 7, today).unwrap();
        panel.load().await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        panel.set_days(7).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        panel.set_days(30).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(panel.days(), 30);

        let entries = panel.entries();
        assert_eq!(entries[0].1, "En 2 días");
    }
}
