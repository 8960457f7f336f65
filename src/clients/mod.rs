//! Clientes de colaboradores externos
//!
//! Este módulo define los contratos hacia los servicios que el núcleo
//! consume: flota (camiones), skills validados de usuarios y catálogo de
//! productos. Cada contrato tiene una implementación en memoria usada en
//! tests y como cableado por defecto.

pub mod catalog_client;
pub mod fleet_client;
pub mod skills_client;

pub use catalog_client::*;
pub use fleet_client::*;
pub use skills_client::*;
