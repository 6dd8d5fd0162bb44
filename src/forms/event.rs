use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::forms::SubmitOutcome;
use crate::i18n;
use crate::models::{Area, CreateEventDto, Event, EventType, UpdateEventDto, MAX_ANEXOS};
use crate::pages::Route;
use crate::services::api::ApiClient;
use crate::services::dates;

/// Fields that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventField {
    Titulo,
    Informacion,
    FechaDesde,
    FechaHasta,
    HoraDesde,
    HoraHasta,
    OrganizadorSolicitante,
    ContactoFormal,
    Convocatoria,
    Anexos,
}

/// Raw form values, as typed by the user. Also the shape of the JSON file
/// accepted by `create-event` / `edit-event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventInput {
    pub titulo: String,
    pub descripcion: String,
    pub informacion: String,
    pub fecha_desde: String,
    pub fecha_hasta: String,
    pub hora_desde: String,
    pub hora_hasta: String,
    pub tipo_evento: EventType,
    pub area: Area,
    pub organizador_solicitante: String,
    pub cobertura_prensa_bol: bool,
    pub contacto_formal: String,
    pub contacto_informal: String,
    pub convocatoria: i64,
    pub anexos: Vec<String>,
}

impl Default for EventInput {
    fn default() -> Self {
        Self {
            titulo: String::new(),
            descripcion: String::new(),
            informacion: String::new(),
            fecha_desde: String::new(),
            fecha_hasta: String::new(),
            hora_desde: "09:00".to_string(),
            hora_hasta: "10:00".to_string(),
            tipo_evento: EventType::Pendiente,
            area: Area::Coworking,
            organizador_solicitante: String::new(),
            cobertura_prensa_bol: false,
            contacto_formal: String::new(),
            contacto_informal: String::new(),
            convocatoria: 0,
            anexos: vec![String::new()],
        }
    }
}

impl EventInput {
    /// Prefill for a new event, optionally on a preselected day.
    pub fn for_date(date: Option<NaiveDate>) -> Self {
        let day = date.map(dates::to_iso).unwrap_or_default();
        Self {
            fecha_desde: day.clone(),
            fecha_hasta: day,
            ..Self::default()
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self {
            titulo: event.titulo.clone(),
            descripcion: event.descripcion.clone().unwrap_or_default(),
            informacion: event.informacion.clone(),
            fecha_desde: dates::date_part(&event.fecha_desde).to_string(),
            fecha_hasta: dates::date_part(&event.fecha_hasta).to_string(),
            hora_desde: event.hora_desde.clone(),
            hora_hasta: event.hora_hasta.clone(),
            tipo_evento: event.tipo_evento,
            area: event.area,
            organizador_solicitante: event.organizador_solicitante.clone(),
            cobertura_prensa_bol: event.cobertura_prensa_bol,
            contacto_formal: event.contacto_formal.clone(),
            contacto_informal: event.contacto_informal.clone().unwrap_or_default(),
            convocatoria: event.convocatoria,
            anexos: event.anexos.clone(),
        }
    }

    fn filled_anexos(&self) -> Vec<String> {
        self.anexos
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Calendar date in ISO form; form values are validated before this runs.
fn iso_date(value: &str) -> String {
    dates::parse_local_date(value)
        .map(dates::to_iso)
        .unwrap_or_else(|_| value.to_string())
}

pub struct EventForm {
    editing: Option<String>,
    values: EventInput,
    errors: BTreeMap<EventField, String>,
    is_loading: bool,
    submit_error: Option<String>,
}

impl EventForm {
    /// Form for editing `event`, or for a new event defaulting to `default_date`.
    pub fn new(event: Option<&Event>, default_date: Option<NaiveDate>) -> Self {
        match event {
            Some(event) => Self::with_values(Some(event.id.clone()), EventInput::from_event(event)),
            None => Self::with_values(None, EventInput::for_date(default_date)),
        }
    }

    pub fn with_values(editing: Option<String>, values: EventInput) -> Self {
        Self {
            editing,
            values,
            errors: BTreeMap::new(),
            is_loading: false,
            submit_error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn values(&self) -> &EventInput {
        &self.values
    }

    pub fn errors(&self) -> &BTreeMap<EventField, String> {
        &self.errors
    }

    pub fn error(&self, field: EventField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    fn clear_error(&mut self, field: EventField) {
        self.errors.remove(&field);
    }

    pub fn set_titulo(&mut self, value: impl Into<String>) {
        self.values.titulo = value.into();
        self.clear_error(EventField::Titulo);
    }

    pub fn set_descripcion(&mut self, value: impl Into<String>) {
        self.values.descripcion = value.into();
    }

    pub fn set_informacion(&mut self, value: impl Into<String>) {
        self.values.informacion = value.into();
        self.clear_error(EventField::Informacion);
    }

    pub fn set_fecha_desde(&mut self, value: impl Into<String>) {
        self.values.fecha_desde = value.into();
        self.clear_error(EventField::FechaDesde);
    }

    pub fn set_fecha_hasta(&mut self, value: impl Into<String>) {
        self.values.fecha_hasta = value.into();
        self.clear_error(EventField::FechaHasta);
    }

    pub fn set_hora_desde(&mut self, value: impl Into<String>) {
        self.values.hora_desde = value.into();
        self.clear_error(EventField::HoraDesde);
    }

    pub fn set_hora_hasta(&mut self, value: impl Into<String>) {
        self.values.hora_hasta = value.into();
        self.clear_error(EventField::HoraHasta);
    }

    pub fn set_tipo_evento(&mut self, value: EventType) {
        self.values.tipo_evento = value;
    }

    pub fn set_area(&mut self, value: Area) {
        self.values.area = value;
    }

    pub fn set_organizador(&mut self, value: impl Into<String>) {
        self.values.organizador_solicitante = value.into();
        self.clear_error(EventField::OrganizadorSolicitante);
    }

    pub fn set_cobertura_prensa(&mut self, value: bool) {
        self.values.cobertura_prensa_bol = value;
    }

    pub fn set_contacto_formal(&mut self, value: impl Into<String>) {
        self.values.contacto_formal = value.into();
        self.clear_error(EventField::ContactoFormal);
    }

    pub fn set_contacto_informal(&mut self, value: impl Into<String>) {
        self.values.contacto_informal = value.into();
    }

    pub fn set_convocatoria(&mut self, value: i64) {
        self.values.convocatoria = value;
        self.clear_error(EventField::Convocatoria);
    }

    pub fn anexos(&self) -> &[String] {
        &self.values.anexos
    }

    /// Append an empty attachment slot. Refused once four slots exist.
    pub fn add_anexo(&mut self) -> bool {
        if self.values.anexos.len() >= MAX_ANEXOS {
            return false;
        }
        self.values.anexos.push(String::new());
        true
    }

    pub fn remove_anexo(&mut self, index: usize) {
        if index < self.values.anexos.len() {
            self.values.anexos.remove(index);
            self.clear_error(EventField::Anexos);
        }
    }

    pub fn update_anexo(&mut self, index: usize, value: impl Into<String>) {
        if let Some(slot) = self.values.anexos.get_mut(index) {
            *slot = value.into();
            self.clear_error(EventField::Anexos);
        }
    }

    /// Recompute every field error. Returns true when the form may be submitted.
    pub fn validate(&mut self) -> bool {
        let mut errors = BTreeMap::new();
        let v = &self.values;

        if v.titulo.trim().is_empty() {
            errors.insert(EventField::Titulo, i18n::t("validation.titulo_required"));
        }
        if v.informacion.trim().is_empty() {
            errors.insert(EventField::Informacion, i18n::t("validation.informacion_required"));
        }

        let desde = parse_date_field(&v.fecha_desde, EventField::FechaDesde, "validation.fecha_desde_required", &mut errors);
        let hasta = parse_date_field(&v.fecha_hasta, EventField::FechaHasta, "validation.fecha_hasta_required", &mut errors);
        if let (Some(desde), Some(hasta)) = (desde, hasta) {
            if hasta < desde {
                errors.insert(EventField::FechaHasta, i18n::t("validation.fecha_hasta_before_start"));
            }
        }

        let hora_desde = parse_time_field(&v.hora_desde, EventField::HoraDesde, "validation.hora_desde_required", &mut errors);
        let hora_hasta = parse_time_field(&v.hora_hasta, EventField::HoraHasta, "validation.hora_hasta_required", &mut errors);
        let same_day = desde.is_some() && desde == hasta;
        if let (true, Some(start), Some(end)) = (same_day, hora_desde, hora_hasta) {
            if end <= start {
                errors.insert(EventField::HoraHasta, i18n::t("validation.hora_hasta_not_after"));
            }
        }

        if v.organizador_solicitante.trim().is_empty() {
            errors.insert(
                EventField::OrganizadorSolicitante,
                i18n::t("validation.organizador_required"),
            );
        }
        if v.contacto_formal.trim().is_empty() {
            errors.insert(EventField::ContactoFormal, i18n::t("validation.contacto_formal_required"));
        }
        if v.convocatoria < 0 {
            errors.insert(EventField::Convocatoria, i18n::t("validation.convocatoria_negative"));
        }

        let anexos = v.filled_anexos();
        if anexos.iter().any(|a| url::Url::parse(a).is_err()) {
            errors.insert(EventField::Anexos, i18n::t("validation.anexos_invalid_url"));
        } else if v.anexos.len() > MAX_ANEXOS {
            errors.insert(
                EventField::Anexos,
                i18n::t_with("validation.anexos_limit", &[("max", &MAX_ANEXOS.to_string())]),
            );
        }

        self.errors = errors;
        self.errors.is_empty()
    }

    pub fn to_create_dto(&self) -> CreateEventDto {
        let v = &self.values;
        CreateEventDto {
            titulo: v.titulo.clone(),
            descripcion: non_empty(&v.descripcion),
            informacion: v.informacion.clone(),
            fecha_desde: iso_date(&v.fecha_desde),
            fecha_hasta: iso_date(&v.fecha_hasta),
            hora_desde: v.hora_desde.trim().to_string(),
            hora_hasta: v.hora_hasta.trim().to_string(),
            tipo_evento: v.tipo_evento,
            area: v.area,
            organizador_solicitante: v.organizador_solicitante.clone(),
            cobertura_prensa_bol: v.cobertura_prensa_bol,
            anexos: v.filled_anexos(),
            contacto_formal: v.contacto_formal.clone(),
            contacto_informal: non_empty(&v.contacto_informal),
            convocatoria: v.convocatoria,
        }
    }

    pub fn to_update_dto(&self) -> UpdateEventDto {
        let dto = self.to_create_dto();
        UpdateEventDto {
            titulo: Some(dto.titulo),
            descripcion: dto.descripcion,
            informacion: Some(dto.informacion),
            fecha_desde: Some(dto.fecha_desde),
            fecha_hasta: Some(dto.fecha_hasta),
            hora_desde: Some(dto.hora_desde),
            hora_hasta: Some(dto.hora_hasta),
            tipo_evento: Some(dto.tipo_evento),
            area: Some(dto.area),
            organizador_solicitante: Some(dto.organizador_solicitante),
            cobertura_prensa_bol: Some(dto.cobertura_prensa_bol),
            anexos: Some(dto.anexos),
            contacto_formal: Some(dto.contacto_formal),
            contacto_informal: dto.contacto_informal,
            convocatoria: Some(dto.convocatoria),
        }
    }

    pub async fn submit(&mut self, api: &ApiClient) -> SubmitOutcome {
        if self.is_loading {
            return SubmitOutcome::Busy;
        }
        self.submit_error = None;

        if !self.validate() {
            return SubmitOutcome::Invalid;
        }

        self.is_loading = true;
        let result = match &self.editing {
            Some(id) => api.update_event(id, &self.to_update_dto()).await,
            None => api.create_event(&self.to_create_dto()).await,
        };
        self.is_loading = false;

        match result {
            Ok(event) => {
                info!("Saved event {} ({})", event.id, event.titulo);
                SubmitOutcome::Saved(Route::Events)
            }
            Err(e) => {
                warn!("Failed to save event: {}", e);
                let message = e.message_or(&i18n::t("error.save_event"));
                self.submit_error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}

fn parse_date_field(
    value: &str,
    field: EventField,
    required_key: &str,
    errors: &mut BTreeMap<EventField, String>,
) -> Option<NaiveDate> {
    if value.trim().is_empty() {
        errors.insert(field, i18n::t(required_key));
        return None;
    }
    match dates::parse_local_date(value) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.insert(field, i18n::t("validation.invalid_date"));
            None
        }
    }
}

fn parse_time_field(
    value: &str,
    field: EventField,
    required_key: &str,
    errors: &mut BTreeMap<EventField, String>,
) -> Option<chrono::NaiveTime> {
    if value.trim().is_empty() {
        errors.insert(field, i18n::t(required_key));
        return None;
    }
    let parsed = dates::parse_time(value);
    if parsed.is_none() {
        errors.insert(field, i18n::t("validation.invalid_time"));
    }
    parsed
}
