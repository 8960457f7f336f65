//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del núcleo logístico.
//! Cada fallo es un resultado tipado; el núcleo nunca hace panic.

use thiserror::Error;

/// Errores principales del núcleo
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("Capacity exceeded: load {current} over limit {limit}")]
    CapacityExceeded { current: i64, limit: i64 },

    #[error("Insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // Retryable: el lock no se pudo adquirir dentro del límite
    #[error("Busy: {0}")]
    Busy(String),

    // Retryable: dependencia externa no disponible
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

impl CoreError {
    /// Indica si el error es transitorio y reintentable por el caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Busy(_) | CoreError::Unavailable(_))
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type CoreResult<T> = Result<T, CoreError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> CoreError {
    CoreError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto de agenda
pub fn conflict_error(resource: &str, field: &str, value: &str) -> CoreError {
    CoreError::Conflict(format!("{} already booked for {} '{}'", resource, field, value))
}

/// Función helper para crear errores de transición de estado inválida
pub fn invalid_state_error(operation: &str, current: &str) -> CoreError {
    CoreError::InvalidState(format!("Cannot {} from state '{}'", operation, current))
}

/// Función helper para crear errores de argumento inválido
pub fn invalid_argument_error(message: &str) -> CoreError {
    CoreError::InvalidArgument(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CoreError::Busy("lock".to_string()).is_retryable());
        assert!(CoreError::Unavailable("fleet".to_string()).is_retryable());
        assert!(!CoreError::Conflict("truck".to_string()).is_retryable());
        assert!(!not_found_error("Route", "abc").is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = CoreError::CapacityExceeded { current: 12, limit: 10 };
        assert_eq!(err.to_string(), "Capacity exceeded: load 12 over limit 10");

        let err = CoreError::InsufficientStock { requested: 8, available: 5 };
        assert_eq!(err.to_string(), "Insufficient stock: requested 8, available 5");
    }
}
