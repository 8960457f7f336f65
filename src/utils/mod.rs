//! Utilidades del sistema
//!
//! Este módulo contiene el manejo de errores, los locks por recurso
//! y las funciones helper de validación.

pub mod errors;
pub mod locks;
pub mod validation;

pub use errors::*;
