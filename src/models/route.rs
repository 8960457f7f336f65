//! Modelo de Route
//!
//! Este módulo contiene el struct Route, su ciclo de vida y las variantes
//! de request/response para las operaciones del planificador.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::destination::{Destination, DestinationProduct};

/// Tipo de ruta: colecta de donaciones o distribución de stock
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RouteKind {
    Collect,
    Distribute,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Collect => "collect",
            RouteKind::Distribute => "distribute",
        }
    }
}

/// Estado de la ruta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RouteStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Planned => "planned",
            RouteStatus::InProgress => "in_progress",
            RouteStatus::Completed => "completed",
            RouteStatus::Cancelled => "cancelled",
        }
    }

    /// Estados terminales: no admiten más transiciones
    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteStatus::Completed | RouteStatus::Cancelled)
    }

    /// Una ruta activa ocupa el slot (camión, fecha) y (usuario, fecha)
    pub fn is_active(&self) -> bool {
        !matches!(self, RouteStatus::Cancelled)
    }
}

/// Ruta de colecta o distribución de un día, con camión y conductor asignados
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: Uuid,
    pub date: NaiveDate,
    pub kind: RouteKind,
    pub status: RouteStatus,
    pub user_id: Uuid,
    pub truck_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Route {
    pub fn new(date: NaiveDate, kind: RouteKind, truck_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            kind,
            status: RouteStatus::Planned,
            user_id,
            truck_id,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

/// Request para crear una nueva ruta
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRouteRequest {
    pub date: NaiveDate,
    pub kind: RouteKind,
    pub truck_id: Uuid,
    pub user_id: Uuid,
}

/// Filtros para búsqueda de rutas
#[derive(Debug, Default, Deserialize)]
pub struct RouteFilters {
    pub date: Option<NaiveDate>,
    pub status: Option<RouteStatus>,
    pub kind: Option<RouteKind>,
    pub user_id: Option<Uuid>,
    pub truck_id: Option<Uuid>,
}

/// Destino con sus productos, para resúmenes de ruta
#[derive(Debug, Clone, Serialize)]
pub struct DestinationSummary {
    pub destination: Destination,
    pub products: Vec<DestinationProduct>,
}

/// Resumen de ruta consumido por el resto de la aplicación
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub route: Route,
    pub destinations: Vec<DestinationSummary>,
    /// Carga total asignada en unidades
    pub total_quantity: i64,
    /// Capacidad del camión asignado
    pub capacity: i64,
    pub remaining_capacity: i64,
}

/// Resultado de completar una ruta
///
/// Para rutas de colecta incluye los fallos de reconciliación por donación;
/// la completación de la ruta en sí ya quedó confirmada.
#[derive(Debug, Clone, Serialize)]
pub struct RouteCompletion {
    pub route: Route,
    pub reconciliation_failures: Vec<crate::models::donation::ReconciliationFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminal_and_active() {
        assert!(RouteStatus::Completed.is_terminal());
        assert!(RouteStatus::Cancelled.is_terminal());
        assert!(!RouteStatus::Planned.is_terminal());
        assert!(!RouteStatus::InProgress.is_terminal());

        assert!(RouteStatus::Planned.is_active());
        assert!(RouteStatus::InProgress.is_active());
        assert!(RouteStatus::Completed.is_active());
        assert!(!RouteStatus::Cancelled.is_active());
    }

    #[test]
    fn test_kind_and_status_serialization() {
        // El resto de la aplicación consume estos tags tal cual
        assert_eq!(serde_json::to_string(&RouteKind::Collect).unwrap(), "\"Collect\"");
        assert_eq!(serde_json::to_string(&RouteKind::Distribute).unwrap(), "\"Distribute\"");
        assert_eq!(serde_json::to_string(&RouteStatus::InProgress).unwrap(), "\"InProgress\"");

        let parsed: RouteKind = serde_json::from_str("\"Collect\"").unwrap();
        assert_eq!(parsed, RouteKind::Collect);
    }

    #[test]
    fn test_new_route_starts_planned() {
        let route = Route::new(
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            RouteKind::Distribute,
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        assert_eq!(route.status, RouteStatus::Planned);
        assert!(route.completed_at.is_none());
    }
}
