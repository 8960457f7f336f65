//! Modelo de Destination
//!
//! Un destino es una parada de una ruta, ligada a una dirección. Pertenece
//! exactamente a una ruta y su tipo debe coincidir con el de la ruta padre.
//! Los productos asignados al destino cuelgan de él (borrado en cascada).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::route::RouteKind;

/// Parada de una ruta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    pub id: Uuid,
    pub route_id: Uuid,
    pub address: String,
    pub kind: RouteKind,
    pub created_at: DateTime<Utc>,
}

impl Destination {
    pub fn new(route_id: Uuid, address: String, kind: RouteKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            route_id,
            address,
            kind,
            created_at: Utc::now(),
        }
    }
}

/// Par (producto, cantidad) asignado a un destino
///
/// Para rutas de distribución lleva además las reservas de stock que lo
/// respaldan, repartidas entre una o varias zonas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationProduct {
    pub id: Uuid,
    pub destination_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i64,
    pub reservation_ids: Vec<Uuid>,
}

impl DestinationProduct {
    pub fn new(destination_id: Uuid, product_id: Uuid, quantity: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            destination_id,
            product_id,
            quantity,
            reservation_ids: Vec::new(),
        }
    }
}

/// Request para añadir un destino a una ruta
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddDestinationRequest {
    #[validate(length(min = 5, max = 500))]
    pub address: String,

    pub kind: RouteKind,
}

/// Request para asignar un producto a un destino
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddProductRequest {
    pub product_id: Uuid,

    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// Request para actualizar la cantidad de un producto ya asignado
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateProductQuantityRequest {
    #[validate(range(min = 1))]
    pub quantity: i64,
}
