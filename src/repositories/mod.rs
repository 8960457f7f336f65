//! Repositorios de persistencia
//!
//! La persistencia real (rutas, destinos, stock, donaciones, agendas) es un
//! colaborador externo; el núcleo la consume a través de estos contratos.
//! Las implementaciones en memoria sirven de harness de tests y de cableado
//! por defecto.

pub mod donation_repository;
pub mod route_repository;
pub mod schedule_repository;
pub mod stock_repository;

pub use donation_repository::*;
pub use route_repository::*;
pub use schedule_repository::*;
pub use stock_repository::*;
