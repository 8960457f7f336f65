//! Cliente de flota
//!
//! El mantenimiento de camiones (altas, bajas, código de condición) vive en
//! el colaborador externo de flota; el núcleo solo consulta camiones por id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::truck::Truck;
use crate::utils::errors::{not_found_error, CoreError, CoreResult};

/// Contrato de consulta de camiones
#[async_trait]
pub trait FleetClient: Send + Sync {
    /// Obtener un camión por id
    async fn get_truck(&self, truck_id: Uuid) -> CoreResult<Truck>;
}

/// Implementación en memoria del cliente de flota
#[derive(Clone, Default)]
pub struct InMemoryFleetClient {
    trucks: Arc<RwLock<HashMap<Uuid, Truck>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl InMemoryFleetClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar o actualizar un camión
    pub async fn upsert_truck(&self, truck: Truck) {
        let mut trucks = self.trucks.write().await;
        trucks.insert(truck.id, truck);
    }

    /// Actualizar el código de condición de un camión
    pub async fn set_condition(&self, truck_id: Uuid, condition_code: i16) {
        let mut trucks = self.trucks.write().await;
        if let Some(truck) = trucks.get_mut(&truck_id) {
            truck.condition_code = condition_code;
        }
    }

    /// Simular una caída transitoria del servicio de flota
    pub async fn set_unavailable(&self, down: bool) {
        *self.unavailable.write().await = down;
    }
}

#[async_trait]
impl FleetClient for InMemoryFleetClient {
    async fn get_truck(&self, truck_id: Uuid) -> CoreResult<Truck> {
        if *self.unavailable.read().await {
            return Err(CoreError::Unavailable("fleet service unreachable".to_string()));
        }

        let trucks = self.trucks.read().await;
        trucks
            .get(&truck_id)
            .cloned()
            .ok_or_else(|| not_found_error("Truck", &truck_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_condition_updates_are_visible() {
        let fleet = InMemoryFleetClient::new();
        let truck = Truck::new("AB-123-CD".to_string(), 10, 1);
        let truck_id = truck.id;
        fleet.upsert_truck(truck).await;

        fleet.set_condition(truck_id, 3).await;
        let truck = fleet.get_truck(truck_id).await.unwrap();
        assert_eq!(truck.condition_code, 3);
        assert_eq!(truck.capacity, 10);
    }

    #[tokio::test]
    async fn test_unknown_truck_is_not_found() {
        let fleet = InMemoryFleetClient::new();
        assert!(matches!(
            fleet.get_truck(Uuid::new_v4()).await,
            Err(CoreError::NotFound(_))
        ));
    }
}
