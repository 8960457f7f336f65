use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::stock::{Reservation, ReservationStatus, StockEntry};
use crate::utils::errors::{not_found_error, CoreResult};

/// Persistencia de entradas de stock y reservas
///
/// Las entradas se mutan únicamente desde el ledger, que serializa el acceso
/// por par (producto, zona).
#[async_trait]
pub trait StockRepository: Send + Sync {
    async fn get_entry(&self, product_id: Uuid, zone: &str) -> CoreResult<Option<StockEntry>>;
    async fn upsert_entry(&self, entry: StockEntry) -> CoreResult<StockEntry>;
    /// Entradas de un producto en todas sus zonas, orden ascendente de zona
    async fn zones_for_product(&self, product_id: Uuid) -> CoreResult<Vec<StockEntry>>;

    async fn create_reservation(&self, reservation: Reservation) -> CoreResult<Reservation>;
    async fn find_reservation(&self, id: Uuid) -> CoreResult<Option<Reservation>>;
    async fn update_reservation(&self, reservation: Reservation) -> CoreResult<Reservation>;
    /// Suma de reservas retenidas sobre un par (producto, zona)
    async fn held_quantity(&self, product_id: Uuid, zone: &str) -> CoreResult<i64>;
}

/// Implementación en memoria del repositorio de stock
#[derive(Clone, Default)]
pub struct InMemoryStockRepository {
    entries: Arc<RwLock<HashMap<(Uuid, String), StockEntry>>>,
    reservations: Arc<RwLock<HashMap<Uuid, Reservation>>>,
}

impl InMemoryStockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockRepository for InMemoryStockRepository {
    async fn get_entry(&self, product_id: Uuid, zone: &str) -> CoreResult<Option<StockEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(product_id, zone.to_string())).cloned())
    }

    async fn upsert_entry(&self, entry: StockEntry) -> CoreResult<StockEntry> {
        let mut entries = self.entries.write().await;
        entries.insert((entry.product_id, entry.zone.clone()), entry.clone());
        Ok(entry)
    }

    async fn zones_for_product(&self, product_id: Uuid) -> CoreResult<Vec<StockEntry>> {
        let entries = self.entries.read().await;
        let mut result: Vec<StockEntry> = entries
            .values()
            .filter(|e| e.product_id == product_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.zone.cmp(&b.zone));
        Ok(result)
    }

    async fn create_reservation(&self, reservation: Reservation) -> CoreResult<Reservation> {
        let mut reservations = self.reservations.write().await;
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn find_reservation(&self, id: Uuid) -> CoreResult<Option<Reservation>> {
        Ok(self.reservations.read().await.get(&id).cloned())
    }

    async fn update_reservation(&self, reservation: Reservation) -> CoreResult<Reservation> {
        let mut reservations = self.reservations.write().await;
        if !reservations.contains_key(&reservation.id) {
            return Err(not_found_error("Reservation", &reservation.id.to_string()));
        }
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }

    async fn held_quantity(&self, product_id: Uuid, zone: &str) -> CoreResult<i64> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .filter(|r| {
                r.product_id == product_id
                    && r.zone == zone
                    && r.status == ReservationStatus::Held
            })
            .map(|r| r.quantity)
            .sum())
    }
}
