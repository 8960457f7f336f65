//! Modelo de Schedule
//!
//! Entrada de calendario visible para el usuario, distinta de la ruta pero
//! vinculable a ella mediante una relación explícita. La invariante de
//! fechas coincidentes se comprueba en el momento de escribir el vínculo.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::route::RouteKind;

/// Entrada de calendario de un usuario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub kind: RouteKind,
    pub created_at: DateTime<Utc>,
}

impl Schedule {
    pub fn new(user_id: Uuid, date: NaiveDate, kind: RouteKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date,
            kind,
            created_at: Utc::now(),
        }
    }
}

/// Vínculo entre una entrada de calendario y una ruta
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleRouteLink {
    pub schedule_id: Uuid,
    pub route_id: Uuid,
}
