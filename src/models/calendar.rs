use serde::Deserialize;

use crate::models::Event;

/// `GET /calendar?year&month`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub start_date: String,
    pub end_date: String,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub total_events: usize,
}

/// `GET /calendar/upcoming?days`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEventsResponse {
    pub start_date: String,
    pub end_date: String,
    pub days: u32,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub total_events: usize,
}
