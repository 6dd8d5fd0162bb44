//! Plain-text rendering of page state for the terminal.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::i18n;
use crate::models::{Event, User};
use crate::pages::dashboard::DashboardStats;
use crate::services::calendar::{weekday_header, CalendarCell, MonthCursor, WEEK_DAYS};
use crate::services::dates::{self, DateStyle};

/// Width of one day column in the month grid.
const CELL_WIDTH: usize = 16;

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{}{}", text, " ".repeat(width.saturating_sub(len)))
}

fn short_date(value: &str) -> String {
    dates::format_date(value, DateStyle::Short).unwrap_or_else(|_| value.to_string())
}

/// Month grid: header, then one block of lines per week. Today is marked
/// with `*`, days of adjacent months are bracketed.
pub fn month_grid(cursor: MonthCursor, cells: &[CalendarCell<'_>], today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", cursor.label());

    let header: Vec<String> = weekday_header().iter().map(|d| pad(d, CELL_WIDTH)).collect();
    let _ = writeln!(out, "{}", header.join("|").trim_end());

    for week in cells.chunks(WEEK_DAYS) {
        let mut lines = vec![Vec::with_capacity(WEEK_DAYS); 1 + crate::services::calendar::MAX_VISIBLE_EVENTS + 1];
        for cell in week {
            let day = if !cell.is_current_month {
                format!("({})", cell.day)
            } else if cell.is_today(cursor, today) {
                format!("{}*", cell.day)
            } else {
                cell.day.to_string()
            };
            lines[0].push(pad(&day, CELL_WIDTH));

            let visible = cell.visible_events();
            for (row, line) in lines.iter_mut().skip(1).enumerate() {
                let text = match visible.get(row) {
                    Some(e) => format!("· {}", truncate(&e.titulo, CELL_WIDTH - 2)),
                    None if row == visible.len() => cell.overflow_label().unwrap_or_default(),
                    None => String::new(),
                };
                line.push(pad(&text, CELL_WIDTH));
            }
        }
        for line in lines {
            let joined = line.join("|");
            if !joined.trim().chars().all(|c| c == '|' || c == ' ') {
                let _ = writeln!(out, "{}", joined.trim_end());
            }
        }
        let _ = writeln!(out, "{}", "-".repeat(WEEK_DAYS * (CELL_WIDTH + 1) - 1));
    }
    out
}

/// One line per event: dates, hours, type, area, title and id.
pub fn event_list(events: &[Event]) -> String {
    let mut out = String::new();
    for e in events {
        let range = if e.is_multi_day() {
            format!("{} - {}", short_date(&e.fecha_desde), short_date(&e.fecha_hasta))
        } else {
            short_date(&e.fecha_desde)
        };
        let _ = writeln!(
            out,
            "{}  {}-{}  {:<11} {:<17} {}  [{}]",
            pad(&range, 25),
            e.hora_desde,
            e.hora_hasta,
            e.tipo_evento.label(),
            e.area.label(),
            e.titulo,
            e.id
        );
    }
    out
}

/// Events with a relative day label ("Hoy", "En 3 días").
pub fn labelled_events(entries: &[(&Event, String)]) -> String {
    let mut out = String::new();
    for (e, label) in entries {
        let weekday = dates::format_date(&e.fecha_desde, DateStyle::WeekdayShort).unwrap_or_default();
        let day = dates::parse_local_date(&e.fecha_desde)
            .map(|d| d.format("%d").to_string())
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {}  {}  {}-{}  {} ({})  [{}]",
            weekday,
            day,
            pad(label, 12),
            e.hora_desde,
            e.hora_hasta,
            e.titulo,
            e.tipo_evento.label(),
            e.id
        );
    }
    out
}

pub fn event_detail(e: &Event) -> String {
    let mut out = String::new();
    let full = |v: &str| dates::format_date(v, DateStyle::Full).unwrap_or_else(|_| v.to_string());
    let yes_no = |b: bool| i18n::t(if b { "label.yes" } else { "label.no" });

    let _ = writeln!(out, "{}", e.titulo);
    let _ = writeln!(out, "{} · {}", e.tipo_evento.label(), e.area.label());
    if let Some(descripcion) = e.descripcion.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(out, "\n{}", descripcion);
    }
    let _ = writeln!(out, "\n{}: {}", i18n::t("label.information"), e.informacion);

    let _ = write!(out, "{}: {}", i18n::t("label.dates"), full(&e.fecha_desde));
    if e.is_multi_day() {
        let _ = write!(out, " {} {}", i18n::t("label.until"), full(&e.fecha_hasta));
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}: {} - {}", i18n::t("label.hours"), e.hora_desde, e.hora_hasta);
    let _ = writeln!(out, "{}: {}", i18n::t("label.organizer"), e.organizador_solicitante);
    let _ = writeln!(out, "{}: {}", i18n::t("label.convocatoria"), e.convocatoria);
    let _ = writeln!(out, "{}: {}", i18n::t("label.press"), yes_no(e.cobertura_prensa_bol));
    let _ = writeln!(out, "{}: {}", i18n::t("label.contact_formal"), e.contacto_formal);
    if let Some(informal) = e.contacto_informal.as_deref().filter(|c| !c.trim().is_empty()) {
        let _ = writeln!(out, "{}: {}", i18n::t("label.contact_informal"), informal);
    }
    if !e.anexos.is_empty() {
        let _ = writeln!(out, "{}:", i18n::t("label.anexos"));
        for (i, anexo) in e.anexos.iter().enumerate() {
            let n = (i + 1).to_string();
            let _ = writeln!(out, "  {}: {}", i18n::t_with("label.anexo", &[("n", &n)]), anexo);
        }
    }
    if let Some(creator) = &e.created_by {
        let _ = writeln!(out, "{}: {}", i18n::t("label.created_by"), creator.nombre);
    }
    out
}

pub fn user_list(users: &[User], current_user_id: Option<&str>) -> String {
    let mut out = String::new();
    for u in users {
        let you = if Some(u.id.as_str()) == current_user_id {
            format!(" {}", i18n::t("users.you"))
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "{}  {}  {:<14} [{}]{}",
            pad(&u.nombre, 24),
            pad(&u.email, 30),
            u.rol.label(),
            u.id,
            you
        );
    }
    out
}

pub fn user_summary(user: &User) -> String {
    format!("{} <{}> · {}", user.nombre, user.email, user.rol.label())
}

pub fn stats(stats: &DashboardStats) -> String {
    format!(
        "{}: {}  {}: {}  {}: {}  {}: {}",
        i18n::t("stats.total"),
        stats.total,
        i18n::t("stats.pendientes"),
        stats.pendientes,
        i18n::t("stats.en_curso"),
        stats.en_curso,
        i18n::t("stats.finalizados"),
        stats.finalizados
    )
}

/// `field: message` lines for a rejected form.
pub fn field_errors<'a, K: std::fmt::Debug + 'a>(errors: impl IntoIterator<Item = (&'a K, &'a String)>) -> String {
    let mut out = String::new();
    for (field, message) in errors {
        let _ = writeln!(out, "  {:?}: {}", field, message);
    }
    out
}
