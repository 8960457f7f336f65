//! Cliente de skills validados
//!
//! Consulta al módulo externo de habilidades qué skills tiene validados un
//! usuario (fecha de validación presente). Un fallo transitorio del lookup
//! se propaga como `Unavailable`, nunca como un `false` definitivo.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::utils::errors::{CoreError, CoreResult};

/// Contrato de consulta de skills validados
#[async_trait]
pub trait SkillsClient: Send + Sync {
    /// Listar los skills validados de un usuario
    async fn validated_skills(&self, user_id: Uuid) -> CoreResult<HashSet<Uuid>>;
}

/// Implementación en memoria del cliente de skills
#[derive(Clone, Default)]
pub struct InMemorySkillsClient {
    skills: Arc<RwLock<HashMap<Uuid, HashSet<Uuid>>>>,
    unavailable: Arc<RwLock<bool>>,
}

impl InMemorySkillsClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marcar un skill como validado para un usuario
    pub async fn add_validated_skill(&self, user_id: Uuid, skill_id: Uuid) {
        let mut skills = self.skills.write().await;
        skills.entry(user_id).or_default().insert(skill_id);
    }

    /// Simular una caída transitoria del lookup de skills
    pub async fn set_unavailable(&self, down: bool) {
        *self.unavailable.write().await = down;
    }
}

#[async_trait]
impl SkillsClient for InMemorySkillsClient {
    async fn validated_skills(&self, user_id: Uuid) -> CoreResult<HashSet<Uuid>> {
        if *self.unavailable.read().await {
            return Err(CoreError::Unavailable("skills service unreachable".to_string()));
        }

        let skills = self.skills.read().await;
        Ok(skills.get(&user_id).cloned().unwrap_or_default())
    }
}
