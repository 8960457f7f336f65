//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración
//! del núcleo logístico: límites de espera de locks, política de reintentos
//! y zona de entrada de donaciones.

use std::env;
use std::time::Duration;

/// Configuración del núcleo
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub environment: String,
    /// Espera máxima para adquirir un lock de recurso (ms)
    pub lock_wait_ms: u64,
    /// Número de intentos ante `Busy` antes de propagarlo
    pub lock_retry_attempts: u32,
    /// Base del backoff exponencial entre reintentos (ms)
    pub lock_retry_base_ms: u64,
    /// Tope del backoff entre reintentos (ms)
    pub lock_retry_max_ms: u64,
    /// Zona de almacén donde se acreditan las donaciones recolectadas
    pub intake_zone: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        // Cargar .env si existe; las variables ya presentes tienen prioridad
        dotenvy::dotenv().ok();

        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            lock_wait_ms: env::var("LOCK_WAIT_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
            lock_retry_attempts: env::var("LOCK_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .unwrap_or(3),
            lock_retry_base_ms: env::var("LOCK_RETRY_BASE_MS")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            lock_retry_max_ms: env::var("LOCK_RETRY_MAX_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            intake_zone: env::var("INTAKE_ZONE").unwrap_or_else(|_| "intake".to_string()),
        }
    }
}

impl CoreConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Espera máxima de adquisición de lock
    pub fn lock_wait(&self) -> Duration {
        Duration::from_millis(self.lock_wait_ms)
    }

    /// Base del backoff entre reintentos
    pub fn lock_retry_base(&self) -> Duration {
        Duration::from_millis(self.lock_retry_base_ms)
    }

    /// Tope del backoff entre reintentos
    pub fn lock_retry_max(&self) -> Duration {
        Duration::from_millis(self.lock_retry_max_ms)
    }
}
