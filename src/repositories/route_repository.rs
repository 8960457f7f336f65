use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::destination::{Destination, DestinationProduct};
use crate::models::route::{Route, RouteFilters};
use crate::utils::errors::{not_found_error, CoreResult};

/// Persistencia de rutas, destinos y productos por destino
///
/// La ruta es propietaria exclusiva de sus destinos y, transitivamente, de
/// sus productos: los borrados cascadean.
#[async_trait]
pub trait RouteRepository: Send + Sync {
    async fn create_route(&self, route: Route) -> CoreResult<Route>;
    async fn find_route(&self, id: Uuid) -> CoreResult<Option<Route>>;
    async fn update_route(&self, route: Route) -> CoreResult<Route>;
    async fn list_routes(&self, filters: &RouteFilters) -> CoreResult<Vec<Route>>;

    /// Ruta no cancelada de un camión en una fecha, si existe
    async fn find_active_for_truck(&self, truck_id: Uuid, date: NaiveDate) -> CoreResult<Option<Route>>;
    /// Ruta no cancelada de un usuario en una fecha, si existe
    async fn find_active_for_user(&self, user_id: Uuid, date: NaiveDate) -> CoreResult<Option<Route>>;

    async fn create_destination(&self, destination: Destination) -> CoreResult<Destination>;
    async fn find_destination(&self, id: Uuid) -> CoreResult<Option<Destination>>;
    async fn list_destinations(&self, route_id: Uuid) -> CoreResult<Vec<Destination>>;
    /// Borra el destino y sus productos
    async fn delete_destination(&self, id: Uuid) -> CoreResult<()>;
    /// Borra todos los destinos de una ruta con sus productos
    async fn delete_destinations_for_route(&self, route_id: Uuid) -> CoreResult<()>;

    async fn create_destination_product(&self, product: DestinationProduct) -> CoreResult<DestinationProduct>;
    async fn find_destination_product(&self, id: Uuid) -> CoreResult<Option<DestinationProduct>>;
    async fn update_destination_product(&self, product: DestinationProduct) -> CoreResult<DestinationProduct>;
    async fn delete_destination_product(&self, id: Uuid) -> CoreResult<()>;
    async fn list_destination_products(&self, destination_id: Uuid) -> CoreResult<Vec<DestinationProduct>>;
    /// Todos los productos de todos los destinos de una ruta
    async fn list_route_products(&self, route_id: Uuid) -> CoreResult<Vec<DestinationProduct>>;
}

/// Implementación en memoria del repositorio de rutas
#[derive(Clone, Default)]
pub struct InMemoryRouteRepository {
    routes: Arc<RwLock<HashMap<Uuid, Route>>>,
    destinations: Arc<RwLock<HashMap<Uuid, Destination>>>,
    products: Arc<RwLock<HashMap<Uuid, DestinationProduct>>>,
}

impl InMemoryRouteRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RouteRepository for InMemoryRouteRepository {
    async fn create_route(&self, route: Route) -> CoreResult<Route> {
        let mut routes = self.routes.write().await;
        routes.insert(route.id, route.clone());
        Ok(route)
    }

    async fn find_route(&self, id: Uuid) -> CoreResult<Option<Route>> {
        Ok(self.routes.read().await.get(&id).cloned())
    }

    async fn update_route(&self, route: Route) -> CoreResult<Route> {
        let mut routes = self.routes.write().await;
        if !routes.contains_key(&route.id) {
            return Err(not_found_error("Route", &route.id.to_string()));
        }
        routes.insert(route.id, route.clone());
        Ok(route)
    }

    async fn list_routes(&self, filters: &RouteFilters) -> CoreResult<Vec<Route>> {
        let routes = self.routes.read().await;
        let mut result: Vec<Route> = routes
            .values()
            .filter(|r| filters.date.map_or(true, |d| r.date == d))
            .filter(|r| filters.status.map_or(true, |s| r.status == s))
            .filter(|r| filters.kind.map_or(true, |k| r.kind == k))
            .filter(|r| filters.user_id.map_or(true, |u| r.user_id == u))
            .filter(|r| filters.truck_id.map_or(true, |t| r.truck_id == t))
            .cloned()
            .collect();
        result.sort_by_key(|r| r.created_at);
        Ok(result)
    }

    async fn find_active_for_truck(&self, truck_id: Uuid, date: NaiveDate) -> CoreResult<Option<Route>> {
        let routes = self.routes.read().await;
        Ok(routes
            .values()
            .find(|r| r.truck_id == truck_id && r.date == date && r.status.is_active())
            .cloned())
    }

    async fn find_active_for_user(&self, user_id: Uuid, date: NaiveDate) -> CoreResult<Option<Route>> {
        let routes = self.routes.read().await;
        Ok(routes
            .values()
            .find(|r| r.user_id == user_id && r.date == date && r.status.is_active())
            .cloned())
    }

    async fn create_destination(&self, destination: Destination) -> CoreResult<Destination> {
        let mut destinations = self.destinations.write().await;
        destinations.insert(destination.id, destination.clone());
        Ok(destination)
    }

    async fn find_destination(&self, id: Uuid) -> CoreResult<Option<Destination>> {
        Ok(self.destinations.read().await.get(&id).cloned())
    }

    async fn list_destinations(&self, route_id: Uuid) -> CoreResult<Vec<Destination>> {
        let destinations = self.destinations.read().await;
        let mut result: Vec<Destination> = destinations
            .values()
            .filter(|d| d.route_id == route_id)
            .cloned()
            .collect();
        result.sort_by_key(|d| d.created_at);
        Ok(result)
    }

    async fn delete_destination(&self, id: Uuid) -> CoreResult<()> {
        let mut destinations = self.destinations.write().await;
        if destinations.remove(&id).is_none() {
            return Err(not_found_error("Destination", &id.to_string()));
        }
        drop(destinations);

        let mut products = self.products.write().await;
        products.retain(|_, p| p.destination_id != id);
        Ok(())
    }

    async fn delete_destinations_for_route(&self, route_id: Uuid) -> CoreResult<()> {
        let mut destinations = self.destinations.write().await;
        let removed: Vec<Uuid> = destinations
            .values()
            .filter(|d| d.route_id == route_id)
            .map(|d| d.id)
            .collect();
        destinations.retain(|_, d| d.route_id != route_id);
        drop(destinations);

        let mut products = self.products.write().await;
        products.retain(|_, p| !removed.contains(&p.destination_id));
        Ok(())
    }

    async fn create_destination_product(&self, product: DestinationProduct) -> CoreResult<DestinationProduct> {
        let mut products = self.products.write().await;
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_destination_product(&self, id: Uuid) -> CoreResult<Option<DestinationProduct>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn update_destination_product(&self, product: DestinationProduct) -> CoreResult<DestinationProduct> {
        let mut products = self.products.write().await;
        if !products.contains_key(&product.id) {
            return Err(not_found_error("DestinationProduct", &product.id.to_string()));
        }
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn delete_destination_product(&self, id: Uuid) -> CoreResult<()> {
        let mut products = self.products.write().await;
        if products.remove(&id).is_none() {
            return Err(not_found_error("DestinationProduct", &id.to_string()));
        }
        Ok(())
    }

    async fn list_destination_products(&self, destination_id: Uuid) -> CoreResult<Vec<DestinationProduct>> {
        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| p.destination_id == destination_id)
            .cloned()
            .collect())
    }

    async fn list_route_products(&self, route_id: Uuid) -> CoreResult<Vec<DestinationProduct>> {
        let destinations = self.destinations.read().await;
        let destination_ids: Vec<Uuid> = destinations
            .values()
            .filter(|d| d.route_id == route_id)
            .map(|d| d.id)
            .collect();
        drop(destinations);

        let products = self.products.read().await;
        Ok(products
            .values()
            .filter(|p| destination_ids.contains(&p.destination_id))
            .cloned()
            .collect())
    }
}
