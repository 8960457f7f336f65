//! Servicio de planificación de capacidad
//!
//! Valida que la carga total asignada a una ruta (suma de cantidades de
//! todos sus destinos) quepa en la capacidad del camión asignado. Se invoca
//! antes de persistir cada mutación de productos, contra el total
//! hipotético post-mutación, y al reasignar camión.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::clients::fleet_client::FleetClient;
use crate::models::route::Route;
use crate::models::truck::Truck;
use crate::repositories::route_repository::RouteRepository;
use crate::utils::errors::{CoreError, CoreResult};

/// Planificador de capacidad de camiones
pub struct CapacityPlannerService {
    routes: Arc<dyn RouteRepository>,
    fleet: Arc<dyn FleetClient>,
}

impl CapacityPlannerService {
    pub fn new(routes: Arc<dyn RouteRepository>, fleet: Arc<dyn FleetClient>) -> Self {
        Self { routes, fleet }
    }

    /// Carga total actual de una ruta en unidades
    pub async fn current_load(&self, route_id: Uuid) -> CoreResult<i64> {
        let products = self.routes.list_route_products(route_id).await?;
        Ok(products.iter().map(|p| p.quantity).sum())
    }

    /// Camión asignado a una ruta, vía el colaborador de flota
    pub async fn truck_for_route(&self, route: &Route) -> CoreResult<Truck> {
        self.fleet.get_truck(route.truck_id).await
    }

    /// Validar el total hipotético post-mutación contra la capacidad
    ///
    /// `additional` puede ser negativo (retirada o reducción de cantidad).
    /// Devuelve la carga proyectada si cabe; `CapacityExceeded` si no, sin
    /// mutar nada. Un fallo del colaborador de flota se propaga como
    /// `Unavailable` antes de cualquier efecto.
    pub async fn check_capacity(&self, route: &Route, additional: i64) -> CoreResult<i64> {
        let truck = self.fleet.get_truck(route.truck_id).await?;
        let current = self.current_load(route.id).await?;
        let proposed = current + additional;

        if proposed > truck.capacity {
            warn!(
                "🚛 Capacidad excedida en ruta {}: {} uds sobre límite {}",
                route.id, proposed, truck.capacity
            );
            return Err(CoreError::CapacityExceeded {
                current: proposed,
                limit: truck.capacity,
            });
        }

        Ok(proposed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fleet_client::InMemoryFleetClient;
    use crate::models::destination::{Destination, DestinationProduct};
    use crate::models::route::{CreateRouteRequest, RouteKind};
    use crate::repositories::route_repository::InMemoryRouteRepository;
    use chrono::NaiveDate;

    async fn setup() -> (CapacityPlannerService, Arc<InMemoryRouteRepository>, Arc<InMemoryFleetClient>, Route) {
        let routes = Arc::new(InMemoryRouteRepository::new());
        let fleet = Arc::new(InMemoryFleetClient::new());

        let truck = Truck::new("AB-123-CD".to_string(), 10, 1);
        let truck_id = truck.id;
        fleet.upsert_truck(truck).await;

        let request = CreateRouteRequest {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            kind: RouteKind::Distribute,
            truck_id,
            user_id: Uuid::new_v4(),
        };
        let route = Route::new(request.date, request.kind, request.truck_id, request.user_id);
        routes.create_route(route.clone()).await.unwrap();

        let planner = CapacityPlannerService::new(routes.clone(), fleet.clone());
        (planner, routes, fleet, route)
    }

    #[tokio::test]
    async fn test_check_capacity_within_limit() {
        let (planner, routes, _fleet, route) = setup().await;

        let destination = Destination::new(route.id, "Calle Mayor 1, Madrid".to_string(), route.kind);
        routes.create_destination(destination.clone()).await.unwrap();
        routes
            .create_destination_product(DestinationProduct::new(destination.id, Uuid::new_v4(), 6))
            .await
            .unwrap();

        assert_eq!(planner.check_capacity(&route, 4).await.unwrap(), 10);
        assert_eq!(planner.current_load(route.id).await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_check_capacity_exceeded() {
        let (planner, routes, _fleet, route) = setup().await;

        let destination = Destination::new(route.id, "Calle Mayor 1, Madrid".to_string(), route.kind);
        routes.create_destination(destination.clone()).await.unwrap();
        routes
            .create_destination_product(DestinationProduct::new(destination.id, Uuid::new_v4(), 6))
            .await
            .unwrap();

        let err = planner.check_capacity(&route, 5).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::CapacityExceeded { current: 11, limit: 10 }
        ));
    }

    #[tokio::test]
    async fn test_fleet_outage_propagates_unavailable() {
        let (planner, _routes, fleet, route) = setup().await;
        fleet.set_unavailable(true).await;

        assert!(matches!(
            planner.check_capacity(&route, 1).await,
            Err(CoreError::Unavailable(_))
        ));
    }
}
