//! Servicio de elegibilidad de voluntarios
//!
//! Predicado puro sobre el lookup externo de skills validados: decide si un
//! usuario puede asignarse a una ruta según el skill requerido, derivado del
//! mapeo categoría-skill cuando la asignación viene de un ticket. No muta
//! nada; un fallo transitorio del lookup se propaga como `Unavailable`,
//! distinto de un `false` definitivo.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::clients::skills_client::SkillsClient;
use crate::utils::errors::{not_found_error, CoreResult};

/// Puerta de elegibilidad por skills validados
pub struct EligibilityService {
    skills: Arc<dyn SkillsClient>,
    // Mapeo categoría -> skill requerido, mantenido por el catálogo externo
    category_skills: RwLock<HashMap<String, Uuid>>,
}

impl EligibilityService {
    pub fn new(skills: Arc<dyn SkillsClient>) -> Self {
        Self {
            skills,
            category_skills: RwLock::new(HashMap::new()),
        }
    }

    /// Registrar el skill requerido para una categoría
    pub async fn set_category_requirement(&self, category: &str, skill_id: Uuid) {
        let mut mapping = self.category_skills.write().await;
        mapping.insert(category.to_string(), skill_id);
    }

    /// ¿Tiene el usuario validado el skill requerido?
    pub async fn can_assign(&self, user_id: Uuid, required_skill: Uuid) -> CoreResult<bool> {
        let validated = self.skills.validated_skills(user_id).await?;
        Ok(validated.contains(&required_skill))
    }

    /// Variante dirigida por ticket: resuelve el skill desde la categoría
    pub async fn can_assign_for_category(
        &self,
        user_id: Uuid,
        category: &str,
    ) -> CoreResult<bool> {
        let required_skill = {
            let mapping = self.category_skills.read().await;
            mapping
                .get(category)
                .copied()
                .ok_or_else(|| not_found_error("Category", category))?
        };

        self.can_assign(user_id, required_skill).await
    }
}
