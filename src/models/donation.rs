//! Modelo de Donation
//!
//! Una donación es una cantidad prometida de un producto por parte de un
//! donante. Puede vincularse a una ruta de colecta; pasa a "collected"
//! solo cuando esa ruta se completa y el ledger acredita la cantidad.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Donación prometida o recolectada
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donation {
    pub id: Uuid,
    pub donor: String,
    pub product_id: Uuid,
    pub quantity: i64,
    /// Ruta de colecta vinculada, si la hay
    pub route_id: Option<Uuid>,
    pub collected: bool,
    pub collection_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Donation {
    pub fn new(donor: String, product_id: Uuid, quantity: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            donor,
            product_id,
            quantity,
            route_id: None,
            collected: false,
            collection_date: None,
            created_at: Utc::now(),
        }
    }

    /// Pendiente: aún sin recolectar
    pub fn is_pending(&self) -> bool {
        !self.collected
    }
}

/// Request para registrar una donación prometida
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDonationRequest {
    #[validate(length(min = 2, max = 200))]
    pub donor: String,

    pub product_id: Uuid,

    #[validate(range(min = 1))]
    pub quantity: i64,
}

/// Fallo de reconciliación de una donación individual
///
/// Se reporta junto a la completación exitosa de la ruta; una donación
/// defectuosa no bloquea al resto.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationFailure {
    pub donation_id: Uuid,
    pub product_id: Uuid,
    pub reason: String,
}
