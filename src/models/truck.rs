//! Modelo de Truck
//!
//! Los camiones pertenecen al colaborador externo de flota; el núcleo
//! solo los lee para validar capacidad. La capacidad es un tope duro
//! en unidades de producto.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Camión de la flota
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Truck {
    pub id: Uuid,
    pub registration: String,
    /// Capacidad en unidades de producto
    pub capacity: i64,
    /// Código ordinal de estado de desgaste, mantenido por flota
    pub condition_code: i16,
}

impl Truck {
    pub fn new(registration: String, capacity: i64, condition_code: i16) -> Self {
        Self {
            id: Uuid::new_v4(),
            registration,
            capacity,
            condition_code,
        }
    }
}
