//! Locks por recurso
//!
//! Este módulo implementa el mapa de locks exclusivos por clave que serializa
//! las mutaciones sobre una misma ruta o un mismo par (producto, zona).
//! La adquisición tiene espera acotada: si el lock no se obtiene dentro del
//! límite configurado la operación falla con `Busy`, y el helper de reintentos
//! aplica backoff exponencial con jitter antes de volver a intentar.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, warn};

use crate::utils::errors::{CoreError, CoreResult};

/// Mapa de locks exclusivos por clave de recurso
#[derive(Clone)]
pub struct LockMap {
    locks: Arc<RwLock<HashMap<String, Arc<Mutex<()>>>>>,
    wait: Duration,
}

impl LockMap {
    pub fn new(wait: Duration) -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
            wait,
        }
    }

    /// Obtener o crear el lock asociado a una clave
    async fn handle(&self, key: &str) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(key) {
                return lock.clone();
            }
        }

        let mut locks = self.locks.write().await;
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Adquirir el lock de una clave con espera acotada
    pub async fn acquire(&self, key: &str) -> CoreResult<OwnedMutexGuard<()>> {
        let lock = self.handle(key).await;

        match tokio::time::timeout(self.wait, lock.lock_owned()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!("⏳ Lock ocupado para clave '{}' tras {:?}", key, self.wait);
                Err(CoreError::Busy(format!(
                    "lock '{}' not acquired within {}ms",
                    key,
                    self.wait.as_millis()
                )))
            }
        }
    }

    /// Adquirir varios locks en el orden dado
    ///
    /// Los callers deben pasar las claves siempre en el mismo orden para
    /// evitar deadlocks entre operaciones concurrentes.
    pub async fn acquire_many(&self, keys: &[String]) -> CoreResult<Vec<OwnedMutexGuard<()>>> {
        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(key).await?);
        }
        Ok(guards)
    }
}

/// Clave de lock para una ruta
pub fn route_key(route_id: &uuid::Uuid) -> String {
    format!("route:{}", route_id)
}

/// Clave de lock para un par (producto, zona)
pub fn stock_key(product_id: &uuid::Uuid, zone: &str) -> String {
    format!("stock:{}:{}", product_id, zone)
}

/// Clave de lock para el slot de agenda de un camión en una fecha
pub fn truck_slot_key(truck_id: &uuid::Uuid, date: &chrono::NaiveDate) -> String {
    format!("slot:truck:{}:{}", truck_id, date)
}

/// Clave de lock para el slot de agenda de un usuario en una fecha
pub fn user_slot_key(user_id: &uuid::Uuid, date: &chrono::NaiveDate) -> String {
    format!("slot:user:{}:{}", user_id, date)
}

/// Política de reintentos con backoff exponencial y jitter
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
            max_delay,
        }
    }

    /// Calcular la espera para un intento dado
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);

        // Jitter aleatorio para desincronizar reintentos concurrentes
        let jitter_ms = if exp.as_millis() > 0 {
            rand::thread_rng().gen_range(0..=(exp.as_millis() as u64 / 2))
        } else {
            0
        };

        (exp + Duration::from_millis(jitter_ms)).min(self.max_delay)
    }

    /// Ejecutar una operación reintentando solo sobre `Busy`
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> CoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CoreResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Err(CoreError::Busy(reason)) if attempt + 1 < self.attempts => {
                    let delay = self.backoff_delay(attempt);
                    debug!(
                        "🔁 Reintento {}/{} tras Busy ({}), esperando {:?}",
                        attempt + 1,
                        self.attempts,
                        reason,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_acquire_times_out_as_busy() {
        let locks = LockMap::new(Duration::from_millis(20));
        let _held = locks.acquire("route:abc").await.unwrap();

        let result = locks.acquire("route:abc").await;
        assert!(matches!(result, Err(CoreError::Busy(_))));
    }

    #[tokio::test]
    async fn test_independent_keys_do_not_block() {
        let locks = LockMap::new(Duration::from_millis(20));
        let _held = locks.acquire("stock:p1:A").await.unwrap();

        assert!(locks.acquire("stock:p1:B").await.is_ok());
        assert!(locks.acquire("stock:p2:A").await.is_ok());
    }

    #[tokio::test]
    async fn test_retry_recovers_after_busy() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5));
        let calls = AtomicU32::new(0);

        let result = policy
            .run(|| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(CoreError::Busy("test".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_surfaces_busy_after_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(1), Duration::from_millis(2));
        let calls = AtomicU32::new(0);

        let result: CoreResult<()> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CoreError::Busy("still held".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(CoreError::Busy(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_does_not_retry_definitive_errors() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2));
        let calls = AtomicU32::new(0);

        let result: CoreResult<()> = policy
            .run(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CoreError::Conflict("double booking".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(CoreError::Conflict(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
