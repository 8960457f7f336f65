//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos del núcleo logístico:
//! camiones, rutas, destinos, stock, donaciones y agendas.

pub mod destination;
pub mod donation;
pub mod route;
pub mod schedule;
pub mod stock;
pub mod truck;

pub use destination::*;
pub use donation::*;
pub use route::*;
pub use schedule::*;
pub use stock::*;
pub use truck::*;
