//! Page controllers. Each page owns its view state and exposes explicit
//! async `load` / mutation operations; navigation is expressed as a [`Route`].

use chrono::NaiveDate;

use crate::services::dates;

pub mod calendar;
pub mod dashboard;
pub mod event_detail;
pub mod events;
pub mod public_calendar;
pub mod upcoming;
pub mod users;

pub use calendar::CalendarPage;
pub use dashboard::DashboardPage;
pub use event_detail::EventDetailPage;
pub use events::EventsPage;
pub use public_calendar::PublicCalendarPage;
pub use upcoming::UpcomingPanel;
pub use users::UsersPage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    PublicGate,
    PublicCalendar,
    Dashboard,
    Calendar,
    Events,
    NewEvent(Option<NaiveDate>),
    EventDetail(String),
    EditEvent(String),
    Users,
    NewUser,
    EditUser(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::PublicGate => "/".to_string(),
            Route::PublicCalendar => "/calendar".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Calendar => "/dashboard/calendar".to_string(),
            Route::Events => "/dashboard/events".to_string(),
            Route::NewEvent(None) => "/dashboard/events/new".to_string(),
            Route::NewEvent(Some(date)) => {
                format!("/dashboard/events/new?date={}", dates::to_iso(*date))
            }
            Route::EventDetail(id) => format!("/dashboard/events/{}", id),
            Route::EditEvent(id) => format!("/dashboard/events/{}/edit", id),
            Route::Users => "/dashboard/users".to_string(),
            Route::NewUser => "/dashboard/users/new".to_string(),
            Route::EditUser(id) => format!("/dashboard/users/{}/edit", id),
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
