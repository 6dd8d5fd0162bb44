use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::i18n;
use crate::models::User;
use crate::services::dates;

/// Maximum number of attachment URLs an event may carry.
pub const MAX_ANEXOS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Pendiente,
    EnCurso,
    Finalizado,
    Cancelado,
    Masivo,
    Escolar,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Pendiente,
        EventType::EnCurso,
        EventType::Finalizado,
        EventType::Cancelado,
        EventType::Masivo,
        EventType::Escolar,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Pendiente => "PENDIENTE",
            EventType::EnCurso => "EN_CURSO",
            EventType::Finalizado => "FINALIZADO",
            EventType::Cancelado => "CANCELADO",
            EventType::Masivo => "MASIVO",
            EventType::Escolar => "ESCOLAR",
        }
    }

    pub fn label(&self) -> String {
        i18n::t(&format!("event_type.{}", self.as_str()))
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("unknown event type: {}", s))
    }
}

/// Physical room or space an event takes place in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Area {
    #[serde(rename = "COWORKING")]
    Coworking,
    #[serde(rename = "AUDITORIO")]
    Auditorio,
    #[serde(rename = "LABORATORIO")]
    Laboratorio,
    #[serde(rename = "AULA_1")]
    Aula1,
    #[serde(rename = "AULA_2")]
    Aula2,
    #[serde(rename = "AULA_3")]
    Aula3,
    #[serde(rename = "AULA_4")]
    Aula4,
    #[serde(rename = "AULA_5")]
    Aula5,
    #[serde(rename = "AULA_6")]
    Aula6,
    #[serde(rename = "RECEPCION_ESTE")]
    RecepcionEste,
    #[serde(rename = "RECEPCION_OESTE")]
    RecepcionOeste,
    #[serde(rename = "EXPLANADA")]
    Explanada,
    #[serde(rename = "PLAZA")]
    Plaza,
    #[serde(rename = "SALA_REUNIONES")]
    SalaReuniones,
}

impl Area {
    pub const ALL: [Area; 14] = [
        Area::Coworking,
        Area::Auditorio,
        Area::Laboratorio,
        Area::Aula1,
        Area::Aula2,
        Area::Aula3,
        Area::Aula4,
        Area::Aula5,
        Area::Aula6,
        Area::RecepcionEste,
        Area::RecepcionOeste,
        Area::Explanada,
        Area::Plaza,
        Area::SalaReuniones,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Area::Coworking => "COWORKING",
            Area::Auditorio => "AUDITORIO",
            Area::Laboratorio => "LABORATORIO",
            Area::Aula1 => "AULA_1",
            Area::Aula2 => "AULA_2",
            Area::Aula3 => "AULA_3",
            Area::Aula4 => "AULA_4",
            Area::Aula5 => "AULA_5",
            Area::Aula6 => "AULA_6",
            Area::RecepcionEste => "RECEPCION_ESTE",
            Area::RecepcionOeste => "RECEPCION_OESTE",
            Area::Explanada => "EXPLANADA",
            Area::Plaza => "PLAZA",
            Area::SalaReuniones => "SALA_REUNIONES",
        }
    }

    pub fn label(&self) -> String {
        i18n::t(&format!("area.{}", self.as_str()))
    }
}

impl std::str::FromStr for Area {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        Area::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| format!("unknown area: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub titulo: String,
    #[serde(default)]
    pub descripcion: Option<String>,
    pub informacion: String,
    /// `YYYY-MM-DD`, possibly followed by a time component.
    pub fecha_desde: String,
    pub fecha_hasta: String,
    /// `HH:MM`
    pub hora_desde: String,
    pub hora_hasta: String,
    pub tipo_evento: EventType,
    pub area: Area,
    pub organizador_solicitante: String,
    #[serde(default)]
    pub cobertura_prensa_bol: bool,
    #[serde(default)]
    pub anexos: Vec<String>,
    pub contacto_formal: String,
    #[serde(default)]
    pub contacto_informal: Option<String>,
    #[serde(default)]
    pub convocatoria: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    pub created_by: Option<User>,
}

impl Event {
    /// Inclusive date-only range of the event, or `None` when either bound
    /// does not parse.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = dates::parse_local_date(&self.fecha_desde).ok()?;
        let end = dates::parse_local_date(&self.fecha_hasta).ok()?;
        Some((start, end))
    }

    pub fn occurs_on(&self, day: NaiveDate) -> bool {
        match self.date_range() {
            Some((start, end)) => start <= day && day <= end,
            None => false,
        }
    }

    pub fn is_multi_day(&self) -> bool {
        dates::date_part(&self.fecha_desde) != dates::date_part(&self.fecha_hasta)
    }
}

/// Query filters accepted by `GET /events`. Empty filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilters {
    pub fecha_desde: Option<NaiveDate>,
    pub fecha_hasta: Option<NaiveDate>,
    pub tipo_evento: Option<EventType>,
}

impl EventFilters {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(d) = self.fecha_desde {
            pairs.push(("fechaDesde", dates::to_iso(d)));
        }
        if let Some(d) = self.fecha_hasta {
            pairs.push(("fechaHasta", dates::to_iso(d)));
        }
        if let Some(t) = self.tipo_evento {
            pairs.push(("tipoEvento", t.as_str().to_string()));
        }
        pairs
    }

    pub fn active_count(&self) -> usize {
        [
            self.fecha_desde.is_some(),
            self.fecha_hasta.is_some(),
            self.tipo_evento.is_some(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_count() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventDto {
    pub titulo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    pub informacion: String,
    pub fecha_desde: String,
    pub fecha_hasta: String,
    pub hora_desde: String,
    pub hora_hasta: String,
    pub tipo_evento: EventType,
    pub area: Area,
    pub organizador_solicitante: String,
    pub cobertura_prensa_bol: bool,
    pub anexos: Vec<String>,
    pub contacto_formal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto_informal: Option<String>,
    pub convocatoria: i64,
}

/// Partial update; absent fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titulo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub informacion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_desde: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_hasta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_desde: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora_hasta: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_evento: Option<EventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<Area>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizador_solicitante: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cobertura_prensa_bol: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anexos: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto_formal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contacto_informal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convocatoria: Option<i64>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn event(id: &str, desde: &str, hasta: &str) -> Event {
        Event {
            id: id.to_string(),
            titulo: format!("Evento {}", id),
            descripcion: None,
            informacion: "Detalles".to_string(),
            fecha_desde: desde.to_string(),
            fecha_hasta: hasta.to_string(),
            hora_desde: "09:00".to_string(),
            hora_hasta: "10:00".to_string(),
            tipo_evento: EventType::Pendiente,
            area: Area::Coworking,
            organizador_solicitante: "Juan Pérez".to_string(),
            cobertura_prensa_bol: false,
            anexos: Vec::new(),
            contacto_formal: "+54 11 1234-5678".to_string(),
            contacto_informal: None,
            convocatoria: 20,
            created_at: None,
            updated_at: None,
            created_by: None,
        }
    }
}
