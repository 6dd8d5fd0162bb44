use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::models::Event;
use crate::services::dates;

/// Cells in a month grid: 6 rows of 7 days, Sunday first.
pub const GRID_CELLS: usize = 42;
pub const WEEK_DAYS: usize = 7;
/// Events rendered per cell before the "+N" overflow marker.
pub const MAX_VISIBLE_EVENTS: usize = 3;

/// One day of the month grid.
///
/// Leading and trailing cells (previous / next month) never carry events:
/// only the target month's events are fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell<'a> {
    pub day: u32,
    pub is_current_month: bool,
    /// In the order the backend returned them.
    pub events: Vec<&'a Event>,
}

impl<'a> CalendarCell<'a> {
    pub fn visible_events(&self) -> &[&'a Event] {
        let end = self.events.len().min(MAX_VISIBLE_EVENTS);
        &self.events[..end]
    }

    /// How many events are hidden behind the "+N" marker.
    pub fn overflow_count(&self) -> usize {
        self.events.len().saturating_sub(MAX_VISIBLE_EVENTS)
    }

    pub fn overflow_label(&self) -> Option<String> {
        match self.overflow_count() {
            0 => None,
            n => Some(i18n::t_with("calendar.more", &[("count", &n.to_string())])),
        }
    }

    /// A cell is "today" only when it belongs to the displayed month; same-numbered
    /// days of the adjacent months are never highlighted.
    pub fn is_today(&self, cursor: MonthCursor, today: NaiveDate) -> bool {
        self.is_current_month
            && today.year() == cursor.year
            && today.month() == cursor.month
            && today.day() == self.day
    }

    /// Calendar date of a current-month cell.
    pub fn date(&self, cursor: MonthCursor) -> Option<NaiveDate> {
        if !self.is_current_month {
            return None;
        }
        NaiveDate::from_ymd_opt(cursor.year, cursor.month, self.day)
    }
}

/// Build the 42-cell grid for `month` (1-12) of `year`.
pub fn build_month_grid(year: i32, month: u32, events: &[Event]) -> AppResult<Vec<CalendarCell<'_>>> {
    let invalid = || AppError::InvalidDate(i18n::t_with("error.invalid_month", &[("month", &month.to_string())]));

    let days_in_month = dates::days_in_month(year, month).ok_or_else(invalid)?;
    let first_weekday = dates::first_weekday_of_month(year, month).ok_or_else(invalid)?;

    let (prev_year, prev_month) = dates::previous_month(year, month);
    let days_in_prev = dates::days_in_month(prev_year, prev_month).ok_or_else(invalid)?;

    // Parse each event's range once instead of once per day
    let ranges: Vec<(&Event, NaiveDate, NaiveDate)> = events
        .iter()
        .filter_map(|e| match e.date_range() {
            Some((start, end)) => Some((e, start, end)),
            None => {
                debug!("Skipping event {} with unparseable dates", e.id);
                None
            }
        })
        .collect();

    let mut cells = Vec::with_capacity(GRID_CELLS);

    for i in (0..first_weekday).rev() {
        cells.push(CalendarCell {
            day: days_in_prev - i,
            is_current_month: false,
            events: Vec::new(),
        });
    }

    for day in 1..=days_in_month {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;
        let day_events = ranges
            .iter()
            .filter(|(_, start, end)| *start <= date && date <= *end)
            .map(|(e, _, _)| *e)
            .collect();

        cells.push(CalendarCell {
            day,
            is_current_month: true,
            events: day_events,
        });
    }

    let remaining = GRID_CELLS - cells.len();
    for day in 1..=remaining as u32 {
        cells.push(CalendarCell {
            day,
            is_current_month: false,
            events: Vec::new(),
        });
    }

    Ok(cells)
}

/// Sunday-first weekday header (`Dom Lun Mar ...`).
pub fn weekday_header() -> Vec<String> {
    (0..WEEK_DAYS)
        .map(|i| {
            let name = i18n::t(&format!("weekday_short.{}", i));
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => name,
            }
        })
        .collect()
}

/// The month currently displayed by a calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(AppError::InvalidDate(i18n::t_with(
                "error.invalid_month",
                &[("month", &month.to_string())],
            )));
        }
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn today() -> Self {
        Self::containing(dates::today())
    }

    pub fn previous(self) -> Self {
        let (year, month) = dates::previous_month(self.year, self.month);
        Self { year, month }
    }

    pub fn next(self) -> Self {
        let (year, month) = dates::next_month(self.year, self.month);
        Self { year, month }
    }

    /// `Enero 2025`
    pub fn label(&self) -> String {
        let name = dates::month_name(self.month);
        let mut chars = name.chars();
        let capitalized: String = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => name,
        };
        format!("{} {}", capitalized, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::fixtures::event;

    #[test]
    fn every_month_has_42_cells_with_ordered_current_days() {
        for year in [2023, 2024, 2025] {
            for month in 1..=12 {
                let grid = build_month_grid(year, month, &[]).unwrap();
                assert_eq!(grid.len(), GRID_CELLS);

                let current: Vec<u32> = grid
                    .iter()
                    .filter(|c| c.is_current_month)
                    .map(|c| c.day)
                    .collect();
                let expected: Vec<u32> =
                    (1..=dates::days_in_month(year, month).unwrap()).collect();
                assert_eq!(current, expected, "{}-{}", year, month);
            }
        }
    }

    #[test]
    fn leading_cells_are_tail_of_previous_month() {
        // January 2025 starts on Wednesday: 29, 30, 31 of December lead
        let grid = build_month_grid(2025, 1, &[]).unwrap();
        let leading: Vec<u32> = grid.iter().take_while(|c| !c.is_current_month).map(|c| c.day).collect();
        assert_eq!(leading, vec![29, 30, 31]);

        // March 2024 leads with Feb 25..29 (leap year)
        let grid = build_month_grid(2024, 3, &[]).unwrap();
        let leading: Vec<u32> = grid.iter().take_while(|c| !c.is_current_month).map(|c| c.day).collect();
        assert_eq!(leading, vec![25, 26, 27, 28, 29]);

        // June 2025 starts on Sunday: no leading cells, trailing restart at 1
        let grid = build_month_grid(2025, 6, &[]).unwrap();
        assert!(grid[0].is_current_month);
        let trailing: Vec<u32> = grid.iter().skip(30).map(|c| c.day).collect();
        assert_eq!(trailing, (1..=12).collect::<Vec<_>>());
    }

    #[test]
    fn events_land_on_every_day_of_their_range() {
        let events = vec![
            event("a", "2025-01-30", "2025-02-02"),
            event("b", "2025-02-10T00:00:00.000Z", "2025-02-10"),
            event("c", "2025-01-01", "2025-01-05"),
        ];
        let grid = build_month_grid(2025, 2, &events).unwrap();
        let cursor = MonthCursor::new(2025, 2).unwrap();

        for cell in grid.iter().filter(|c| c.is_current_month) {
            let date = cell.date(cursor).unwrap();
            for e in &events {
                let listed = cell.events.iter().any(|x| x.id == e.id);
                assert_eq!(listed, e.occurs_on(date), "{} on {}", e.id, date);
            }
        }

        let day1 = grid.iter().find(|c| c.is_current_month && c.day == 1).unwrap();
        assert_eq!(day1.events.len(), 1);
        assert_eq!(day1.events[0].id, "a");
    }

    #[test]
    fn adjacent_month_cells_never_carry_events() {
        // Event spans the whole visible range, including leading/trailing cells
        let events = vec![event("long", "2024-12-01", "2025-02-28")];
        let grid = build_month_grid(2025, 1, &events).unwrap();
        for cell in &grid {
            if cell.is_current_month {
                assert_eq!(cell.events.len(), 1);
            } else {
                assert!(cell.events.is_empty());
            }
        }
    }

    #[test]
    fn cell_events_keep_backend_order_and_cap_at_three() {
        let events: Vec<Event> = ["z", "y", "x", "w", "v"]
            .iter()
            .map(|id| event(id, "2025-05-14", "2025-05-14"))
            .collect();
        let grid = build_month_grid(2025, 5, &events).unwrap();
        let cell = grid.iter().find(|c| c.is_current_month && c.day == 14).unwrap();

        let ids: Vec<&str> = cell.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "y", "x", "w", "v"]);
        assert_eq!(cell.visible_events().len(), 3);
        assert_eq!(cell.overflow_count(), 2);
        assert_eq!(cell.overflow_label().as_deref(), Some("+2 más"));
    }

    #[test]
    fn today_is_only_highlighted_in_current_month() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 30).unwrap();
        let cursor = MonthCursor::new(2025, 1).unwrap();
        let grid = build_month_grid(2025, 1, &[]).unwrap();

        let highlighted: Vec<(u32, bool)> = grid
            .iter()
            .filter(|c| c.is_today(cursor, today))
            .map(|c| (c.day, c.is_current_month))
            .collect();
        // The leading "30" from December must not be highlighted
        assert_eq!(highlighted, vec![(30, true)]);

        let other = MonthCursor::new(2025, 2).unwrap();
        let grid = build_month_grid(2025, 2, &[]).unwrap();
        assert!(grid.iter().all(|c| !c.is_today(other, today)));
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(build_month_grid(2025, 0, &[]).is_err());
        assert!(build_month_grid(2025, 13, &[]).is_err());
        assert!(MonthCursor::new(2025, 13).is_err());
    }

    #[test]
    fn cursor_navigation_wraps_years() {
        let jan = MonthCursor::new(2025, 1).unwrap();
        assert_eq!(jan.previous(), MonthCursor { year: 2024, month: 12 });
        assert_eq!(jan.previous().next(), jan);
        assert_eq!(MonthCursor::new(2025, 12).unwrap().next(), MonthCursor { year: 2026, month: 1 });
        assert_eq!(jan.label(), "Enero 2025");
    }

    #[test]
    fn header_is_sunday_first() {
        assert_eq!(
            weekday_header(),
            vec!["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"]
        );
    }
}
