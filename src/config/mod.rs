//! Configuración del proyecto
//!
//! Este módulo contiene las variables de entorno y otras configuraciones
//! del núcleo.

pub mod environment;

pub use environment::*;
