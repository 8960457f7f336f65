//! Servicio de planificación de rutas
//!
//! Este módulo es el dueño del ciclo de vida de una ruta: creación con
//! control de doble reserva de camión y conductor, alta de destinos y
//! productos validada contra capacidad y stock, transiciones de estado y
//! cancelación con liberación de reservas.
//!
//! Las mutaciones sobre una misma ruta se serializan bajo su lock; la
//! completación y la cancelación son mutuamente excluyentes por esa vía.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::clients::fleet_client::FleetClient;
use crate::models::destination::{
    AddDestinationRequest, AddProductRequest, Destination, DestinationProduct,
    UpdateProductQuantityRequest,
};
use crate::models::route::{
    CreateRouteRequest, DestinationSummary, Route, RouteCompletion, RouteFilters, RouteKind,
    RouteStatus, RouteSummary,
};
use crate::models::schedule::{Schedule, ScheduleRouteLink};
use crate::repositories::route_repository::RouteRepository;
use crate::repositories::schedule_repository::ScheduleRepository;
use crate::services::capacity_planner_service::CapacityPlannerService;
use crate::services::donation_reconciler_service::DonationReconcilerService;
use crate::services::stock_ledger_service::StockLedgerService;
use crate::utils::errors::{
    conflict_error, invalid_argument_error, invalid_state_error, not_found_error, CoreError,
    CoreResult,
};
use crate::utils::locks::{route_key, truck_slot_key, user_slot_key, LockMap, RetryPolicy};

/// Planificador de rutas de colecta y distribución
pub struct RouteSchedulerService {
    routes: Arc<dyn RouteRepository>,
    schedules: Arc<dyn ScheduleRepository>,
    fleet: Arc<dyn FleetClient>,
    ledger: Arc<StockLedgerService>,
    capacity: Arc<CapacityPlannerService>,
    reconciler: Arc<DonationReconcilerService>,
    locks: LockMap,
    retry: RetryPolicy,
}

impl RouteSchedulerService {
    pub fn new(
        routes: Arc<dyn RouteRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        fleet: Arc<dyn FleetClient>,
        ledger: Arc<StockLedgerService>,
        capacity: Arc<CapacityPlannerService>,
        reconciler: Arc<DonationReconcilerService>,
        locks: LockMap,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            routes,
            schedules,
            fleet,
            ledger,
            capacity,
            reconciler,
            locks,
            retry,
        }
    }

    /// Crear una ruta planificada
    ///
    /// Falla con `Conflict` si el camión o el conductor ya tienen una ruta
    /// no cancelada en esa fecha.
    pub async fn create_route(&self, request: CreateRouteRequest) -> CoreResult<Route> {
        // Verificar que el camión existe antes de ocupar slots de agenda
        self.fleet.get_truck(request.truck_id).await?;

        self.retry.run(|| self.try_create_route(&request)).await
    }

    async fn try_create_route(&self, request: &CreateRouteRequest) -> CoreResult<Route> {
        // Slots de agenda en orden fijo camión-usuario para evitar deadlocks
        let keys = vec![
            truck_slot_key(&request.truck_id, &request.date),
            user_slot_key(&request.user_id, &request.date),
        ];
        let _guards = self.locks.acquire_many(&keys).await?;

        if self
            .routes
            .find_active_for_truck(request.truck_id, request.date)
            .await?
            .is_some()
        {
            return Err(conflict_error(
                "Truck",
                "date",
                &request.date.to_string(),
            ));
        }

        if self
            .routes
            .find_active_for_user(request.user_id, request.date)
            .await?
            .is_some()
        {
            return Err(conflict_error("User", "date", &request.date.to_string()));
        }

        let route = Route::new(request.date, request.kind, request.truck_id, request.user_id);
        let route = self.routes.create_route(route).await?;

        info!(
            "🚚 Ruta {} creada: {} el {} (camión {}, conductor {})",
            route.id,
            route.kind.as_str(),
            route.date,
            route.truck_id,
            route.user_id
        );
        Ok(route)
    }

    /// Añadir un destino a una ruta
    ///
    /// El tipo del destino debe coincidir con el de la ruta.
    pub async fn add_destination(
        &self,
        route_id: Uuid,
        request: AddDestinationRequest,
    ) -> CoreResult<Destination> {
        request.validate()?;

        self.retry
            .run(|| self.try_add_destination(route_id, &request))
            .await
    }

    async fn try_add_destination(
        &self,
        route_id: Uuid,
        request: &AddDestinationRequest,
    ) -> CoreResult<Destination> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        let route = self.find_route_or_not_found(route_id).await?;
        if route.status.is_terminal() {
            return Err(invalid_state_error("add destination", route.status.as_str()));
        }

        if request.kind != route.kind {
            return Err(CoreError::TypeMismatch(format!(
                "destination kind '{}' does not match route kind '{}'",
                request.kind.as_str(),
                route.kind.as_str()
            )));
        }

        let destination = Destination::new(route_id, request.address.clone(), request.kind);
        let destination = self.routes.create_destination(destination).await?;

        info!("📍 Destino {} añadido a ruta {}", destination.id, route_id);
        Ok(destination)
    }

    /// Quitar un destino de una ruta, liberando las reservas de sus productos
    pub async fn remove_destination(&self, destination_id: Uuid) -> CoreResult<()> {
        let destination = self
            .routes
            .find_destination(destination_id)
            .await?
            .ok_or_else(|| not_found_error("Destination", &destination_id.to_string()))?;

        self.retry
            .run(|| self.try_remove_destination(destination.route_id, destination_id))
            .await
    }

    async fn try_remove_destination(&self, route_id: Uuid, destination_id: Uuid) -> CoreResult<()> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        if self
            .routes
            .find_destination(destination_id)
            .await?
            .is_none()
        {
            return Err(not_found_error("Destination", &destination_id.to_string()));
        }

        let route = self.find_route_or_not_found(route_id).await?;
        if route.status.is_terminal() {
            return Err(invalid_state_error("remove destination", route.status.as_str()));
        }

        for product in self.routes.list_destination_products(destination_id).await? {
            self.release_handles(&product.reservation_ids).await?;
        }

        self.routes.delete_destination(destination_id).await?;
        info!("🗑️ Destino {} retirado de ruta {}", destination_id, route_id);
        Ok(())
    }

    /// Asignar un producto a un destino
    ///
    /// En rutas de distribución primero se reserva stock (repartiendo entre
    /// zonas en orden ascendente si hace falta); después se valida capacidad.
    /// Si la capacidad no alcanza, las reservas recién tomadas se liberan y
    /// no queda ninguna mutación.
    pub async fn add_product(
        &self,
        destination_id: Uuid,
        request: AddProductRequest,
    ) -> CoreResult<DestinationProduct> {
        request.validate()?;

        let destination = self
            .routes
            .find_destination(destination_id)
            .await?
            .ok_or_else(|| not_found_error("Destination", &destination_id.to_string()))?;

        self.retry
            .run(|| self.try_add_product(destination.route_id, destination_id, &request))
            .await
    }

    async fn try_add_product(
        &self,
        route_id: Uuid,
        destination_id: Uuid,
        request: &AddProductRequest,
    ) -> CoreResult<DestinationProduct> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        // Revalidar bajo el lock: el destino pudo borrarse mientras esperábamos
        if self
            .routes
            .find_destination(destination_id)
            .await?
            .is_none()
        {
            return Err(not_found_error("Destination", &destination_id.to_string()));
        }

        let route = self.find_route_or_not_found(route_id).await?;
        if route.status.is_terminal() {
            return Err(invalid_state_error("add product", route.status.as_str()));
        }

        let mut product = DestinationProduct::new(destination_id, request.product_id, request.quantity);

        if route.kind == RouteKind::Distribute {
            product.reservation_ids = self
                .allocate_stock(request.product_id, request.quantity)
                .await?;
        }

        if let Err(err) = self.capacity.check_capacity(&route, request.quantity).await {
            self.rollback_reservations(&product.reservation_ids).await;
            return Err(err);
        }

        let product = self.routes.create_destination_product(product).await?;
        info!(
            "➕ Producto {} asignado al destino {}: {} uds",
            request.product_id, destination_id, request.quantity
        );
        Ok(product)
    }

    /// Actualizar la cantidad de un producto ya asignado
    ///
    /// Se valida contra el total hipotético post-mutación. En distribución
    /// las reservas nuevas se toman antes de liberar las antiguas; si algo
    /// falla, las antiguas quedan intactas.
    pub async fn update_product_quantity(
        &self,
        destination_product_id: Uuid,
        request: UpdateProductQuantityRequest,
    ) -> CoreResult<DestinationProduct> {
        request.validate()?;

        let product = self
            .routes
            .find_destination_product(destination_product_id)
            .await?
            .ok_or_else(|| {
                not_found_error("DestinationProduct", &destination_product_id.to_string())
            })?;
        let destination = self
            .routes
            .find_destination(product.destination_id)
            .await?
            .ok_or_else(|| not_found_error("Destination", &product.destination_id.to_string()))?;

        self.retry
            .run(|| {
                self.try_update_quantity(destination.route_id, destination_product_id, request.quantity)
            })
            .await
    }

    async fn try_update_quantity(
        &self,
        route_id: Uuid,
        destination_product_id: Uuid,
        quantity: i64,
    ) -> CoreResult<DestinationProduct> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        let mut product = self
            .routes
            .find_destination_product(destination_product_id)
            .await?
            .ok_or_else(|| {
                not_found_error("DestinationProduct", &destination_product_id.to_string())
            })?;

        let route = self.find_route_or_not_found(route_id).await?;
        if route.status.is_terminal() {
            return Err(invalid_state_error("update product", route.status.as_str()));
        }

        let delta = quantity - product.quantity;

        let new_handles = if route.kind == RouteKind::Distribute {
            self.allocate_stock(product.product_id, quantity).await?
        } else {
            Vec::new()
        };

        if let Err(err) = self.capacity.check_capacity(&route, delta).await {
            self.rollback_reservations(&new_handles).await;
            return Err(err);
        }

        if let Err(err) = self.release_handles(&product.reservation_ids).await {
            self.rollback_reservations(&new_handles).await;
            return Err(err);
        }

        product.quantity = quantity;
        product.reservation_ids = new_handles;
        let product = self.routes.update_destination_product(product).await?;

        info!(
            "✏️ Producto {} actualizado a {} uds",
            destination_product_id, quantity
        );
        Ok(product)
    }

    /// Retirar un producto de un destino, liberando sus reservas
    pub async fn remove_product(&self, destination_product_id: Uuid) -> CoreResult<()> {
        let product = self
            .routes
            .find_destination_product(destination_product_id)
            .await?
            .ok_or_else(|| {
                not_found_error("DestinationProduct", &destination_product_id.to_string())
            })?;
        let destination = self
            .routes
            .find_destination(product.destination_id)
            .await?
            .ok_or_else(|| not_found_error("Destination", &product.destination_id.to_string()))?;

        self.retry
            .run(|| self.try_remove_product(destination.route_id, destination_product_id))
            .await
    }

    async fn try_remove_product(
        &self,
        route_id: Uuid,
        destination_product_id: Uuid,
    ) -> CoreResult<()> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        let product = self
            .routes
            .find_destination_product(destination_product_id)
            .await?
            .ok_or_else(|| {
                not_found_error("DestinationProduct", &destination_product_id.to_string())
            })?;

        let route = self.find_route_or_not_found(route_id).await?;
        if route.status.is_terminal() {
            return Err(invalid_state_error("remove product", route.status.as_str()));
        }

        self.release_handles(&product.reservation_ids).await?;
        self.routes
            .delete_destination_product(destination_product_id)
            .await?;

        info!("➖ Producto {} retirado", destination_product_id);
        Ok(())
    }

    /// Reasignar el camión de una ruta
    ///
    /// Revalida conflicto de agenda y capacidad contra el camión nuevo; si
    /// algo falla, el camión original sigue asignado.
    pub async fn reassign_truck(&self, route_id: Uuid, truck_id: Uuid) -> CoreResult<Route> {
        self.retry
            .run(|| self.try_reassign_truck(route_id, truck_id))
            .await
    }

    async fn try_reassign_truck(&self, route_id: Uuid, truck_id: Uuid) -> CoreResult<Route> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        let mut route = self.find_route_or_not_found(route_id).await?;
        if route.status.is_terminal() {
            return Err(invalid_state_error("reassign truck", route.status.as_str()));
        }

        if route.truck_id == truck_id {
            return Ok(route);
        }

        let _slot = self
            .locks
            .acquire(&truck_slot_key(&truck_id, &route.date))
            .await?;

        if self
            .routes
            .find_active_for_truck(truck_id, route.date)
            .await?
            .is_some()
        {
            return Err(conflict_error("Truck", "date", &route.date.to_string()));
        }

        // Validar la carga actual contra la capacidad del camión candidato
        let candidate = Route {
            truck_id,
            ..route.clone()
        };
        self.capacity.check_capacity(&candidate, 0).await?;

        route.truck_id = truck_id;
        let route = self.routes.update_route(route).await?;

        info!("🔄 Ruta {} reasignada al camión {}", route_id, truck_id);
        Ok(route)
    }

    /// Iniciar una ruta planificada
    pub async fn start(&self, route_id: Uuid) -> CoreResult<Route> {
        self.retry.run(|| self.try_start(route_id)).await
    }

    async fn try_start(&self, route_id: Uuid) -> CoreResult<Route> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        let mut route = self.find_route_or_not_found(route_id).await?;
        if route.status != RouteStatus::Planned {
            return Err(invalid_state_error("start", route.status.as_str()));
        }

        route.status = RouteStatus::InProgress;
        let route = self.routes.update_route(route).await?;

        info!("▶️ Ruta {} en curso", route_id);
        Ok(route)
    }

    /// Completar una ruta en curso
    ///
    /// Distribución: compromete todas las reservas pendientes de la ruta.
    /// Colecta: reconcilia las donaciones vinculadas; los fallos por
    /// donación se devuelven en la lista sin bloquear la completación.
    pub async fn complete(&self, route_id: Uuid) -> CoreResult<RouteCompletion> {
        self.retry.run(|| self.try_complete(route_id)).await
    }

    async fn try_complete(&self, route_id: Uuid) -> CoreResult<RouteCompletion> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        let mut route = self.find_route_or_not_found(route_id).await?;
        if route.status != RouteStatus::InProgress {
            return Err(invalid_state_error("complete", route.status.as_str()));
        }

        let completed_at = Utc::now();
        let mut failures = Vec::new();

        match route.kind {
            RouteKind::Distribute => {
                // El commit es idempotente: si esta operación se reintenta
                // tras un fallo parcial, los ya comprometidos no descuentan
                // dos veces
                for product in self.routes.list_route_products(route_id).await? {
                    for handle in &product.reservation_ids {
                        self.ledger.commit(*handle).await?;
                    }
                }
            }
            RouteKind::Collect => {
                failures = self.reconciler.reconcile(route_id, completed_at).await?;
            }
        }

        route.status = RouteStatus::Completed;
        route.completed_at = Some(completed_at);
        let route = self.routes.update_route(route).await?;

        info!(
            "🏁 Ruta {} completada ({} fallos de reconciliación)",
            route_id,
            failures.len()
        );
        Ok(RouteCompletion {
            route,
            reconciliation_failures: failures,
        })
    }

    /// Cancelar una ruta planificada o en curso
    ///
    /// Libera todas las reservas, desvincula las donaciones (vuelven a
    /// pendientes) y desengancha los destinos.
    pub async fn cancel(&self, route_id: Uuid) -> CoreResult<Route> {
        self.retry.run(|| self.try_cancel(route_id)).await
    }

    async fn try_cancel(&self, route_id: Uuid) -> CoreResult<Route> {
        let _guard = self.locks.acquire(&route_key(&route_id)).await?;

        let mut route = self.find_route_or_not_found(route_id).await?;
        if route.status.is_terminal() {
            return Err(invalid_state_error("cancel", route.status.as_str()));
        }

        for product in self.routes.list_route_products(route_id).await? {
            self.release_handles(&product.reservation_ids).await?;
        }

        self.reconciler.unlink_for_route(route_id).await?;
        self.routes.delete_destinations_for_route(route_id).await?;

        route.status = RouteStatus::Cancelled;
        let route = self.routes.update_route(route).await?;

        info!("🛑 Ruta {} cancelada", route_id);
        Ok(route)
    }

    /// Crear una entrada de calendario para un usuario
    pub async fn create_schedule(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        kind: RouteKind,
    ) -> CoreResult<Schedule> {
        self.schedules.create(Schedule::new(user_id, date, kind)).await
    }

    /// Vincular una entrada de calendario a una ruta
    ///
    /// Invariante referencial comprobada en escritura: las fechas deben
    /// coincidir.
    pub async fn link_schedule(&self, schedule_id: Uuid, route_id: Uuid) -> CoreResult<()> {
        let schedule = self
            .schedules
            .find_by_id(schedule_id)
            .await?
            .ok_or_else(|| not_found_error("Schedule", &schedule_id.to_string()))?;
        let route = self.find_route_or_not_found(route_id).await?;

        if schedule.date != route.date {
            return Err(invalid_argument_error(&format!(
                "schedule date {} does not match route date {}",
                schedule.date, route.date
            )));
        }

        self.schedules
            .add_link(ScheduleRouteLink {
                schedule_id,
                route_id,
            })
            .await
    }

    /// Obtener una ruta por id
    pub async fn get_route(&self, route_id: Uuid) -> CoreResult<Route> {
        self.find_route_or_not_found(route_id).await
    }

    /// Resumen de una ruta: destinos, productos, carga y capacidad restante
    pub async fn get_summary(&self, route_id: Uuid) -> CoreResult<RouteSummary> {
        let route = self.find_route_or_not_found(route_id).await?;
        let truck = self.capacity.truck_for_route(&route).await?;

        let mut destinations = Vec::new();
        let mut total_quantity = 0;

        for destination in self.routes.list_destinations(route_id).await? {
            let products = self.routes.list_destination_products(destination.id).await?;
            total_quantity += products.iter().map(|p| p.quantity).sum::<i64>();
            destinations.push(DestinationSummary {
                destination,
                products,
            });
        }

        Ok(RouteSummary {
            route,
            destinations,
            total_quantity,
            capacity: truck.capacity,
            remaining_capacity: truck.capacity - total_quantity,
        })
    }

    /// Listar rutas por filtros
    pub async fn list_routes(&self, filters: &RouteFilters) -> CoreResult<Vec<Route>> {
        self.routes.list_routes(filters).await
    }

    async fn find_route_or_not_found(&self, route_id: Uuid) -> CoreResult<Route> {
        self.routes
            .find_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &route_id.to_string()))
    }

    /// Reservar una cantidad repartiéndola entre zonas en orden ascendente
    ///
    /// Si ninguna combinación de zonas cubre lo pedido, las reservas
    /// parciales se liberan y la asignación entera falla.
    async fn allocate_stock(&self, product_id: Uuid, quantity: i64) -> CoreResult<Vec<Uuid>> {
        let zones = self.ledger.zones_for_product(product_id).await?;
        let total_available: i64 = zones.iter().map(|(_, level)| level.available.max(0)).sum();

        let mut handles = Vec::new();
        let mut remaining = quantity;

        for (zone, level) in zones {
            if remaining == 0 {
                break;
            }
            if level.available <= 0 {
                continue;
            }

            let take = remaining.min(level.available);
            match self.ledger.reserve(product_id, &zone, take).await {
                Ok(handle) => {
                    handles.push(handle);
                    remaining -= take;
                }
                Err(err) => {
                    // Carrera con otra asignación: deshacer lo tomado
                    self.rollback_reservations(&handles).await;
                    return Err(err);
                }
            }
        }

        if remaining > 0 {
            self.rollback_reservations(&handles).await;
            return Err(CoreError::InsufficientStock {
                requested: quantity,
                available: total_available,
            });
        }

        Ok(handles)
    }

    async fn release_handles(&self, handles: &[Uuid]) -> CoreResult<()> {
        for handle in handles {
            self.ledger.release(*handle).await?;
        }
        Ok(())
    }

    /// Liberación best-effort al deshacer una operación fallida
    async fn rollback_reservations(&self, handles: &[Uuid]) {
        for handle in handles {
            if let Err(err) = self.ledger.release(*handle).await {
                warn!("⚠️ No se pudo liberar la reserva {} al deshacer: {}", handle, err);
            }
        }
    }
}
