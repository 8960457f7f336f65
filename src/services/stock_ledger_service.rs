//! Servicio de ledger de stock
//!
//! Este módulo mantiene las cantidades por (producto, zona) y el protocolo
//! de reservas: reserve retiene disponibilidad, commit descuenta el on-hand
//! de forma definitiva y release cancela la retención. Toda mutación corre
//! bajo el lock del par (producto, zona); la adquisición con espera acotada
//! se reintenta con backoff antes de propagar `Busy`.
//!
//! Invariantes: el on-hand nunca baja de cero y la disponibilidad
//! (on-hand menos reservas retenidas) nunca baja de cero.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::stock::{Reservation, ReservationStatus, StockEntry, StockLevel};
use crate::repositories::stock_repository::StockRepository;
use crate::utils::errors::{invalid_argument_error, not_found_error, CoreError, CoreResult};
use crate::utils::locks::{stock_key, LockMap, RetryPolicy};

/// Ledger de stock por zona con protocolo reserve/commit/release/credit
pub struct StockLedgerService {
    repo: Arc<dyn StockRepository>,
    locks: LockMap,
    retry: RetryPolicy,
}

impl StockLedgerService {
    pub fn new(repo: Arc<dyn StockRepository>, locks: LockMap, retry: RetryPolicy) -> Self {
        Self { repo, locks, retry }
    }

    /// Reservar cantidad de un producto en una zona
    ///
    /// Comprueba atómicamente `available = on_hand - retenido`; si no alcanza
    /// falla con `InsufficientStock` sin efectos secundarios.
    pub async fn reserve(&self, product_id: Uuid, zone: &str, quantity: i64) -> CoreResult<Uuid> {
        if quantity <= 0 {
            return Err(invalid_argument_error("reserve quantity must be positive"));
        }

        self.retry
            .run(|| self.try_reserve(product_id, zone, quantity))
            .await
    }

    async fn try_reserve(&self, product_id: Uuid, zone: &str, quantity: i64) -> CoreResult<Uuid> {
        let _guard = self.locks.acquire(&stock_key(&product_id, zone)).await?;

        let on_hand = self
            .repo
            .get_entry(product_id, zone)
            .await?
            .map_or(0, |e| e.on_hand);
        let held = self.repo.held_quantity(product_id, zone).await?;
        let available = on_hand - held;

        if quantity > available {
            warn!(
                "📉 Stock insuficiente para {} en zona '{}': pedido {}, disponible {}",
                product_id, zone, quantity, available
            );
            return Err(CoreError::InsufficientStock {
                requested: quantity,
                available,
            });
        }

        let reservation = Reservation::new(product_id, zone.to_string(), quantity);
        let reservation = self.repo.create_reservation(reservation).await?;

        info!(
            "📦 Reserva {} creada: {} uds de {} en zona '{}'",
            reservation.id, quantity, product_id, zone
        );
        Ok(reservation.id)
    }

    /// Convertir una reserva en descuento definitivo del on-hand
    ///
    /// Idempotente: commit sobre una reserva ya comprometida es no-op.
    /// Commit sobre una reserva liberada falla con `InvalidState`.
    pub async fn commit(&self, handle: Uuid) -> CoreResult<()> {
        self.retry.run(|| self.try_commit(handle)).await
    }

    async fn try_commit(&self, handle: Uuid) -> CoreResult<()> {
        let reservation = self
            .repo
            .find_reservation(handle)
            .await?
            .ok_or_else(|| not_found_error("Reservation", &handle.to_string()))?;

        let _guard = self
            .locks
            .acquire(&stock_key(&reservation.product_id, &reservation.zone))
            .await?;

        // Releer bajo el lock: el estado pudo cambiar mientras esperábamos
        let mut reservation = self
            .repo
            .find_reservation(handle)
            .await?
            .ok_or_else(|| not_found_error("Reservation", &handle.to_string()))?;

        match reservation.status {
            ReservationStatus::Committed => return Ok(()),
            ReservationStatus::Released => {
                return Err(CoreError::InvalidState(
                    "cannot commit a released reservation".to_string(),
                ));
            }
            ReservationStatus::Held => {}
        }

        let mut entry = self
            .repo
            .get_entry(reservation.product_id, &reservation.zone)
            .await?
            .ok_or_else(|| {
                not_found_error(
                    "StockEntry",
                    &format!("{}:{}", reservation.product_id, reservation.zone),
                )
            })?;

        if entry.on_hand < reservation.quantity {
            // No debería ocurrir: la reserva retuvo disponibilidad al crearse
            return Err(CoreError::InsufficientStock {
                requested: reservation.quantity,
                available: entry.on_hand,
            });
        }

        entry.on_hand -= reservation.quantity;
        self.repo.upsert_entry(entry).await?;

        reservation.status = ReservationStatus::Committed;
        self.repo.update_reservation(reservation.clone()).await?;

        info!(
            "✅ Reserva {} comprometida: -{} uds de {} en zona '{}'",
            handle, reservation.quantity, reservation.product_id, reservation.zone
        );
        Ok(())
    }

    /// Cancelar una reserva sin tocar el on-hand
    ///
    /// Idempotente: release sobre una reserva ya liberada es no-op.
    /// Release sobre una reserva comprometida falla con `InvalidState`.
    pub async fn release(&self, handle: Uuid) -> CoreResult<()> {
        self.retry.run(|| self.try_release(handle)).await
    }

    async fn try_release(&self, handle: Uuid) -> CoreResult<()> {
        let reservation = self
            .repo
            .find_reservation(handle)
            .await?
            .ok_or_else(|| not_found_error("Reservation", &handle.to_string()))?;

        let _guard = self
            .locks
            .acquire(&stock_key(&reservation.product_id, &reservation.zone))
            .await?;

        let mut reservation = self
            .repo
            .find_reservation(handle)
            .await?
            .ok_or_else(|| not_found_error("Reservation", &handle.to_string()))?;

        match reservation.status {
            ReservationStatus::Released => return Ok(()),
            ReservationStatus::Committed => {
                return Err(CoreError::InvalidState(
                    "cannot release a committed reservation".to_string(),
                ));
            }
            ReservationStatus::Held => {}
        }

        reservation.status = ReservationStatus::Released;
        self.repo.update_reservation(reservation.clone()).await?;

        info!(
            "↩️ Reserva {} liberada: {} uds de {} en zona '{}'",
            handle, reservation.quantity, reservation.product_id, reservation.zone
        );
        Ok(())
    }

    /// Acreditar cantidad al on-hand de una zona (entrada de donaciones)
    pub async fn credit(&self, product_id: Uuid, zone: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return Err(invalid_argument_error("credit quantity must be positive"));
        }

        self.retry
            .run(|| self.try_credit(product_id, zone, quantity))
            .await
    }

    async fn try_credit(&self, product_id: Uuid, zone: &str, quantity: i64) -> CoreResult<()> {
        let _guard = self.locks.acquire(&stock_key(&product_id, zone)).await?;

        let mut entry = self
            .repo
            .get_entry(product_id, zone)
            .await?
            .unwrap_or(StockEntry {
                product_id,
                zone: zone.to_string(),
                on_hand: 0,
            });

        entry.on_hand += quantity;
        self.repo.upsert_entry(entry).await?;

        info!(
            "📥 Acreditadas {} uds de {} en zona '{}'",
            quantity, product_id, zone
        );
        Ok(())
    }

    /// Nivel de stock de un par (producto, zona)
    pub async fn get_available(&self, product_id: Uuid, zone: &str) -> CoreResult<StockLevel> {
        let on_hand = self
            .repo
            .get_entry(product_id, zone)
            .await?
            .map_or(0, |e| e.on_hand);
        let reserved = self.repo.held_quantity(product_id, zone).await?;

        Ok(StockLevel {
            on_hand,
            reserved,
            available: on_hand - reserved,
        })
    }

    /// Niveles de un producto en todas sus zonas, orden ascendente de zona
    pub async fn zones_for_product(&self, product_id: Uuid) -> CoreResult<Vec<(String, StockLevel)>> {
        let entries = self.repo.zones_for_product(product_id).await?;
        let mut levels = Vec::with_capacity(entries.len());

        for entry in entries {
            let reserved = self.repo.held_quantity(product_id, &entry.zone).await?;
            levels.push((
                entry.zone.clone(),
                StockLevel {
                    on_hand: entry.on_hand,
                    reserved,
                    available: entry.on_hand - reserved,
                },
            ));
        }

        Ok(levels)
    }
}
