//! Núcleo de logística de donaciones
//!
//! Este crate contiene el núcleo de planificación de rutas de colecta y
//! distribución: ledger de stock por zona, validación de capacidad de
//! camiones, ciclo de vida de rutas y reconciliación de donaciones.
//!
//! El resto de la aplicación (HTTP, autenticación, catálogo, ficheros)
//! consume estas operaciones y provee los colaboradores externos definidos
//! en `clients` y `repositories`.

pub mod config;
pub mod state;
pub mod services;
pub mod utils;
pub mod clients;
pub mod models;
pub mod repositories;

pub use state::CoreState;
pub use utils::errors::{CoreError, CoreResult};
