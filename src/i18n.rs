/*
Simple i18n helper for the calendar client.

This module provides:
- A tiny embedded translations store for ES/EN (compile-time embedded JSON).
- A simple `tr` function to lookup translations by key + optional params.
- A `t` convenience wrapper using the active language (`init_language`, else DEFAULT_LANG).

Usage:
    use crate::i18n;
    let msg = i18n::t("validation.titulo_required");
    let msg_with = i18n::t_with("relative.in_days", &[("days", "3")]);

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Default language is `es`. If a key is missing for the requested language,
  the fallback language will be used.
- Enum labels are keyed by their wire name (`event_type.EN_CURSO`, `area.AULA_1`).
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "es";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();
static ACTIVE_LANG: OnceLock<String> = OnceLock::new();

const ES_JSON: &str = r#"
{
  "app.name": "Calendario NODO",
  "error.connection": "Error de conexión",
  "error.request_failed": "Error en la solicitud",
  "error.invalid_session": "La sesión no es válida. Inicia sesión nuevamente.",
  "error.load_events": "Error al cargar eventos",
  "error.load_event": "Error al cargar el evento",
  "error.load_calendar": "Error al cargar el calendario",
  "error.load_users": "Error al cargar usuarios",
  "error.load_user": "Error al cargar el usuario",
  "error.load_data": "Error al cargar datos",
  "error.delete_event": "Error al eliminar el evento",
  "error.delete_user": "Error al eliminar el usuario",
  "error.save_event": "Error al guardar el evento",
  "error.save_user": "Error al guardar el usuario",
  "error.duplicate_email": "Ya existe un usuario con este correo electrónico",
  "error.cannot_delete_self": "No puedes eliminar tu propio usuario",
  "error.invalid_month": "Mes inválido: {month}",
  "not_found.event": "Evento no encontrado",
  "not_found.user": "Usuario no encontrado",
  "validation.titulo_required": "El título es requerido",
  "validation.informacion_required": "La información es requerida",
  "validation.fecha_desde_required": "La fecha de inicio es requerida",
  "validation.fecha_hasta_required": "La fecha de fin es requerida",
  "validation.fecha_hasta_before_start": "La fecha de fin debe ser igual o posterior a la fecha de inicio",
  "validation.hora_desde_required": "La hora de inicio es requerida",
  "validation.hora_hasta_required": "La hora de fin es requerida",
  "validation.hora_hasta_not_after": "La hora de fin debe ser posterior a la hora de inicio",
  "validation.organizador_required": "El organizador es requerido",
  "validation.contacto_formal_required": "El contacto formal es requerido",
  "validation.convocatoria_negative": "La convocatoria debe ser mayor o igual a 0",
  "validation.anexos_invalid_url": "Todos los anexos deben ser URLs válidas",
  "validation.anexos_limit": "Máximo {max} anexos",
  "validation.invalid_date": "La fecha no es válida",
  "validation.invalid_time": "La hora no es válida",
  "validation.nombre_required": "El nombre es requerido",
  "validation.email_required": "El correo electrónico es requerido",
  "validation.email_invalid": "El formato del correo electrónico no es válido",
  "validation.password_required": "La contraseña es requerida",
  "validation.password_too_short": "La contraseña debe tener al menos {min} caracteres",
  "gate.password_required": "Por favor ingresa la contraseña",
  "gate.wrong_password": "Contraseña incorrecta",
  "gate.granted": "Acceso concedido",
  "auth.logged_out": "Sesión cerrada",
  "relative.today": "Hoy",
  "relative.tomorrow": "Mañana",
  "relative.yesterday": "Ayer",
  "relative.in_days": "En {days} días",
  "relative.days_ago": "Hace {days} días",
  "events.found_one": "{count} evento encontrado",
  "events.found_many": "{count} eventos encontrados",
  "events.empty": "No se encontraron eventos",
  "upcoming.empty": "No hay eventos próximos",
  "calendar.more": "+{count} más",
  "calendar.total": "Total de eventos este mes: {count}",
  "event_type.PENDIENTE": "Pendiente",
  "event_type.EN_CURSO": "En Curso",
  "event_type.FINALIZADO": "Finalizado",
  "event_type.CANCELADO": "Cancelado",
  "event_type.MASIVO": "Masivo",
  "event_type.ESCOLAR": "Escolar",
  "area.COWORKING": "Coworking",
  "area.AUDITORIO": "Auditorio",
  "area.LABORATORIO": "Laboratorio",
  "area.AULA_1": "Aula 1",
  "area.AULA_2": "Aula 2",
  "area.AULA_3": "Aula 3",
  "area.AULA_4": "Aula 4",
  "area.AULA_5": "Aula 5",
  "area.AULA_6": "Aula 6",
  "area.RECEPCION_ESTE": "Recepción Este",
  "area.RECEPCION_OESTE": "Recepción Oeste",
  "area.EXPLANADA": "Explanada",
  "area.PLAZA": "Plaza",
  "area.SALA_REUNIONES": "Sala de Reuniones",
  "role.ADMIN": "Administrador",
  "role.VEEDOR": "Veedor",
  "month.1": "enero",
  "month.2": "febrero",
  "month.3": "marzo",
  "month.4": "abril",
  "month.5": "mayo",
  "month.6": "junio",
  "month.7": "julio",
  "month.8": "agosto",
  "month.9": "septiembre",
  "month.10": "octubre",
  "month.11": "noviembre",
  "month.12": "diciembre",
  "month_short.1": "ene",
  "month_short.2": "feb",
  "month_short.3": "mar",
  "month_short.4": "abr",
  "month_short.5": "may",
  "month_short.6": "jun",
  "month_short.7": "jul",
  "month_short.8": "ago",
  "month_short.9": "sept",
  "month_short.10": "oct",
  "month_short.11": "nov",
  "month_short.12": "dic",
  "weekday.0": "domingo",
  "weekday.1": "lunes",
  "weekday.2": "martes",
  "weekday.3": "miércoles",
  "weekday.4": "jueves",
  "weekday.5": "viernes",
  "weekday.6": "sábado",
  "weekday_short.0": "dom",
  "weekday_short.1": "lun",
  "weekday_short.2": "mar",
  "weekday_short.3": "mié",
  "weekday_short.4": "jue",
  "weekday_short.5": "vie",
  "weekday_short.6": "sáb",
  "upcoming.window": "Eventos en los próximos {days} días",
  "upcoming.invalid_window": "Ventana no válida: {days} días (usa 7, 14 o 30)",
  "dashboard.welcome": "Bienvenido, {nombre}",
  "dashboard.week": "Eventos de esta semana",
  "dashboard.week_empty": "No hay eventos en los próximos 7 días",
  "stats.total": "Total Eventos",
  "stats.pendientes": "Pendientes",
  "stats.en_curso": "En Curso",
  "stats.finalizados": "Finalizados",
  "label.information": "Información",
  "label.dates": "Fechas",
  "label.until": "hasta",
  "label.hours": "Horario",
  "label.organizer": "Organizador",
  "label.convocatoria": "Convocatoria",
  "label.press": "Cobertura de prensa",
  "label.contact_formal": "Contacto formal",
  "label.contact_informal": "Contacto informal",
  "label.anexos": "Anexos",
  "label.anexo": "Anexo {n}",
  "label.created_by": "Creado por",
  "label.yes": "Sí",
  "label.no": "No",
  "users.you": "(tú)",
  "users.deleted": "Usuario eliminado",
  "events.deleted": "Evento eliminado",
  "form.saved": "Guardado correctamente",
  "form.invalid": "Revisa los campos marcados",
  "auth.signed_in": "Sesión iniciada como {nombre}",
  "auth.not_signed_in": "No has iniciado sesión",
  "auth.forbidden": "No tienes permisos para esta acción",
  "gate.locked": "Ingresa la contraseña para acceder al calendario",
  "whatsapp.link": "Recordatorio por WhatsApp",
  "date.long": "{day} de {month} de {year}",
  "date.full": "{weekday}, {day} de {month} de {year}",
  "whatsapp.reminder": "Hola, le recordamos que tiene un evento programado:\n\n📅 {titulo}\n📍 {area}\n🗓️ {fecha}\n⏰ {hora_desde} - {hora_hasta}\n\nMás información:\n{informacion}..."
}
"#;

const EN_JSON: &str = r#"
{
  "app.name": "NODO Calendar",
  "error.connection": "Connection error",
  "error.request_failed": "Request failed",
  "error.invalid_session": "Your session is not valid. Please log in again.",
  "error.load_events": "Failed to load events",
  "error.load_event": "Failed to load the event",
  "error.load_calendar": "Failed to load the calendar",
  "error.load_users": "Failed to load users",
  "error.load_user": "Failed to load the user",
  "error.load_data": "Failed to load data",
  "error.delete_event": "Failed to delete the event",
  "error.delete_user": "Failed to delete the user",
  "error.save_event": "Failed to save the event",
  "error.save_user": "Failed to save the user",
  "error.duplicate_email": "A user with this email already exists",
  "error.cannot_delete_self": "You cannot delete your own account",
  "error.invalid_month": "Invalid month: {month}",
  "not_found.event": "Event not found",
  "not_found.user": "User not found",
  "validation.titulo_required": "Title is required",
  "validation.informacion_required": "Information is required",
  "validation.fecha_desde_required": "Start date is required",
  "validation.fecha_hasta_required": "End date is required",
  "validation.fecha_hasta_before_start": "End date must be on or after the start date",
  "validation.hora_desde_required": "Start time is required",
  "validation.hora_hasta_required": "End time is required",
  "validation.hora_hasta_not_after": "End time must be after the start time",
  "validation.organizador_required": "Organizer is required",
  "validation.contacto_formal_required": "Formal contact is required",
  "validation.convocatoria_negative": "Attendance must be greater than or equal to 0",
  "validation.anexos_invalid_url": "All attachments must be valid URLs",
  "validation.anexos_limit": "At most {max} attachments",
  "validation.invalid_date": "The date is not valid",
  "validation.invalid_time": "The time is not valid",
  "validation.nombre_required": "Name is required",
  "validation.email_required": "Email is required",
  "validation.email_invalid": "Email format is not valid",
  "validation.password_required": "Password is required",
  "validation.password_too_short": "Password must have at least {min} characters",
  "gate.password_required": "Please enter the password",
  "gate.wrong_password": "Wrong password",
  "gate.granted": "Access granted",
  "auth.logged_out": "Logged out",
  "relative.today": "Today",
  "relative.tomorrow": "Tomorrow",
  "relative.yesterday": "Yesterday",
  "relative.in_days": "In {days} days",
  "relative.days_ago": "{days} days ago",
  "events.found_one": "{count} event found",
  "events.found_many": "{count} events found",
  "events.empty": "No events found",
  "upcoming.empty": "No upcoming events",
  "calendar.more": "+{count} more",
  "calendar.total": "Total events this month: {count}",
  "event_type.PENDIENTE": "Pending",
  "event_type.EN_CURSO": "In Progress",
  "event_type.FINALIZADO": "Finished",
  "event_type.CANCELADO": "Cancelled",
  "event_type.MASIVO": "Mass",
  "event_type.ESCOLAR": "School",
  "role.ADMIN": "Administrator",
  "role.VEEDOR": "Observer",
  "month.1": "January",
  "month.2": "February",
  "month.3": "March",
  "month.4": "April",
  "month.5": "May",
  "month.6": "June",
  "month.7": "July",
  "month.8": "August",
  "month.9": "September",
  "month.10": "October",
  "month.11": "November",
  "month.12": "December",
  "month_short.1": "Jan",
  "month_short.2": "Feb",
  "month_short.3": "Mar",
  "month_short.4": "Apr",
  "month_short.5": "May",
  "month_short.6": "Jun",
  "month_short.7": "Jul",
  "month_short.8": "Aug",
  "month_short.9": "Sep",
  "month_short.10": "Oct",
  "month_short.11": "Nov",
  "month_short.12": "Dec",
  "weekday.0": "Sunday",
  "weekday.1": "Monday",
  "weekday.2": "Tuesday",
  "weekday.3": "Wednesday",
  "weekday.4": "Thursday",
  "weekday.5": "Friday",
  "weekday.6": "Saturday",
  "weekday_short.0": "Sun",
  "weekday_short.1": "Mon",
  "weekday_short.2": "Tue",
  "weekday_short.3": "Wed",
  "weekday_short.4": "Thu",
  "weekday_short.5": "Fri",
  "weekday_short.6": "Sat",
  "upcoming.window": "Events in the next {days} days",
  "upcoming.invalid_window": "Invalid window: {days} days (use 7, 14 or 30)",
  "dashboard.welcome": "Welcome, {nombre}",
  "dashboard.week": "This week's events",
  "dashboard.week_empty": "No events in the next 7 days",
  "stats.total": "Total events",
  "stats.pendientes": "Pending",
  "stats.en_curso": "In progress",
  "stats.finalizados": "Finished",
  "label.information": "Information",
  "label.dates": "Dates",
  "label.until": "until",
  "label.hours": "Time",
  "label.organizer": "Organizer",
  "label.convocatoria": "Expected attendance",
  "label.press": "Press coverage",
  "label.contact_formal": "Formal contact",
  "label.contact_informal": "Informal contact",
  "label.anexos": "Attachments",
  "label.anexo": "Attachment {n}",
  "label.created_by": "Created by",
  "label.yes": "Yes",
  "label.no": "No",
  "users.you": "(you)",
  "users.deleted": "User deleted",
  "events.deleted": "Event deleted",
  "form.saved": "Saved successfully",
  "form.invalid": "Check the highlighted fields",
  "auth.signed_in": "Signed in as {nombre}",
  "auth.not_signed_in": "You are not signed in",
  "auth.forbidden": "You are not allowed to do this",
  "gate.locked": "Enter the password to access the calendar",
  "whatsapp.link": "WhatsApp reminder",
  "date.long": "{month} {day}, {year}",
  "date.full": "{weekday}, {month} {day}, {year}",
  "whatsapp.reminder": "Hello, this is a reminder of your scheduled event:\n\n📅 {titulo}\n📍 {area}\n🗓️ {fecha}\n⏰ {hora_desde} - {hora_hasta}\n\nMore information:\n{informacion}..."
}
"#;

const TABLES: [(&str, &str); 2] = [("es", ES_JSON), ("en", EN_JSON)];

fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(|| {
        TABLES
            .iter()
            .map(|(lang, json)| {
                let table = serde_json::from_str(json).unwrap_or_else(|e| {
                    panic!("embedded {} translations are not valid JSON: {}", lang, e)
                });
                (lang.to_string(), table)
            })
            .collect()
    })
}

/// Normalize a language tag into a short, lowercase code (e.g. "es-AR" -> "es").
pub fn normalize_language(lang: &str) -> String {
    lang.split('-').next().unwrap_or(lang).to_lowercase()
}

/// Returns true if the given language code has an embedded translation table.
pub fn is_supported_language(lang: &str) -> bool {
    translations().contains_key(lang)
}

/// Select the process-wide language used by `t` / `t_with`. Only the first
/// call takes effect; unsupported languages are ignored.
pub fn init_language(lang: &str) {
    let lang = normalize_language(lang);
    if is_supported_language(&lang) {
        let _ = ACTIVE_LANG.set(lang);
    } else {
        tracing::warn!("Unsupported language {}, using {}", lang, DEFAULT_LANG);
    }
}

/// The language selected with `init_language`, or DEFAULT_LANG.
pub fn current_language() -> &'static str {
    ACTIVE_LANG.get().map(String::as_str).unwrap_or(DEFAULT_LANG)
}

fn lookup(lang: &str, key: &str) -> Option<&'static String> {
    translations().get(lang).and_then(|table| table.get(key))
}

/// Message for `key` in `lang` (DEFAULT_LANG when None), with `{name}`
/// placeholders replaced from `params`. Missing keys fall back to
/// DEFAULT_LANG, then to the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let mut message = lookup(lang.unwrap_or(DEFAULT_LANG), key)
        .or_else(|| lookup(DEFAULT_LANG, key))
        .cloned()
        .unwrap_or_else(|| key.to_string());

    for (name, value) in params.unwrap_or_default() {
        message = message.replace(&format!("{{{}}}", name), value);
    }
    message
}

/// Convenience wrapper: translate using the active language.
pub fn t(key: &str) -> String {
    tr(Some(current_language()), key, None)
}

/// Convenience wrapper with params (active language).
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(Some(current_language()), key, Some(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_message_is_spanish() {
        assert_eq!(
            tr(Some("es"), "error.duplicate_email", None),
            "Ya existe un usuario con este correo electrónico"
        );
        assert_eq!(
            tr(Some("en"), "error.duplicate_email", None),
            "A user with this email already exists"
        );
    }

    #[test]
    fn relative_day_placeholder_is_filled() {
        assert_eq!(t_with("relative.in_days", &[("days", "5")]), "En 5 días");
        assert_eq!(
            tr(Some("en"), "calendar.more", Some(&[("count", "2")])),
            "+2 more"
        );
    }

    #[test]
    fn area_labels_fall_back_to_spanish() {
        assert_eq!(tr(Some("fr"), "gate.wrong_password", None), "Contraseña incorrecta");
        assert_eq!(tr(Some("en"), "area.AULA_1", None), "Aula 1");
    }

    #[test]
    fn unknown_key_is_echoed() {
        assert_eq!(t("gate.unknown"), "gate.unknown");
    }

    #[test]
    fn app_lang_values_are_normalized() {
        assert!(is_supported_language("es"));
        assert!(is_supported_language("en"));
        assert!(!is_supported_language("fr"));
        assert_eq!(normalize_language("es-AR"), "es");
        assert_eq!(normalize_language("EN-us"), "en");
    }
}
