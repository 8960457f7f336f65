//! Cliente de catálogo de productos
//!
//! El catálogo (altas, categorías, fichas) es externo; el núcleo solo
//! necesita saber si un producto existe antes de acreditar stock.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::utils::errors::{CoreError, CoreResult};

/// Contrato de consulta de productos
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Verificar si un producto existe en el catálogo
    async fn product_exists(&self, product_id: Uuid) -> CoreResult<bool>;
}

/// Implementación en memoria del cliente de catálogo
#[derive(Clone, Default)]
pub struct InMemoryCatalogClient {
    products: Arc<RwLock<HashSet<Uuid>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl InMemoryCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dar de alta un producto
    pub async fn add_product(&self, product_id: Uuid) {
        self.products.write().await.insert(product_id);
    }

    /// Simular una caída transitoria del catálogo
    pub async fn set_unavailable(&self, down: bool) {
        *self.unavailable.write().await = down;
    }
}

#[async_trait]
impl CatalogClient for InMemoryCatalogClient {
    async fn product_exists(&self, product_id: Uuid) -> CoreResult<bool> {
        if *self.unavailable.read().await {
            return Err(CoreError::Unavailable("catalog service unreachable".to_string()));
        }

        Ok(self.products.read().await.contains(&product_id))
    }
}
