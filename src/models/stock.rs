//! Modelo de Stock
//!
//! Este módulo contiene las entradas de stock por (producto, zona) y las
//! reservas temporales que el ledger mantiene sobre ellas. Las entradas
//! solo se mutan a través del ledger, nunca directamente.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cantidad disponible de un producto en una zona de almacén
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub product_id: Uuid,
    pub zone: String,
    pub on_hand: i64,
}

/// Estado de una reserva de stock
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReservationStatus {
    /// Retiene disponibilidad a la espera de commit o release
    Held,
    /// Descontada definitivamente del on-hand
    Committed,
    /// Cancelada sin tocar el on-hand
    Released,
}

/// Reserva temporal sobre un par (producto, zona)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub product_id: Uuid,
    pub zone: String,
    pub quantity: i64,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(product_id: Uuid, zone: String, quantity: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            zone,
            quantity,
            status: ReservationStatus::Held,
            created_at: Utc::now(),
        }
    }
}

/// Nivel de stock de un par (producto, zona) para consultas
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StockLevel {
    pub on_hand: i64,
    pub reserved: i64,
    pub available: i64,
}
