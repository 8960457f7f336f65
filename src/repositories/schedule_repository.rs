use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::schedule::{Schedule, ScheduleRouteLink};
use crate::utils::errors::CoreResult;

/// Persistencia de entradas de calendario y su relación con rutas
///
/// La relación Schedule-Route es derivada, no de propiedad: se guarda como
/// tabla de vínculos explícita y la invariante de fechas se comprueba en el
/// planificador al escribir.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn create(&self, schedule: Schedule) -> CoreResult<Schedule>;
    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Schedule>>;
    async fn add_link(&self, link: ScheduleRouteLink) -> CoreResult<()>;
    async fn links_for_route(&self, route_id: Uuid) -> CoreResult<Vec<ScheduleRouteLink>>;
    async fn links_for_schedule(&self, schedule_id: Uuid) -> CoreResult<Vec<ScheduleRouteLink>>;
}

/// Implementación en memoria del repositorio de agendas
#[derive(Clone, Default)]
pub struct InMemoryScheduleRepository {
    schedules: Arc<RwLock<HashMap<Uuid, Schedule>>>,
    links: Arc<RwLock<Vec<ScheduleRouteLink>>>,
}

impl InMemoryScheduleRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn create(&self, schedule: Schedule) -> CoreResult<Schedule> {
        let mut schedules = self.schedules.write().await;
        schedules.insert(schedule.id, schedule.clone());
        Ok(schedule)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Schedule>> {
        Ok(self.schedules.read().await.get(&id).cloned())
    }

    async fn add_link(&self, link: ScheduleRouteLink) -> CoreResult<()> {
        let mut links = self.links.write().await;
        if !links.contains(&link) {
            links.push(link);
        }
        Ok(())
    }

    async fn links_for_route(&self, route_id: Uuid) -> CoreResult<Vec<ScheduleRouteLink>> {
        let links = self.links.read().await;
        Ok(links.iter().filter(|l| l.route_id == route_id).cloned().collect())
    }

    async fn links_for_schedule(&self, schedule_id: Uuid) -> CoreResult<Vec<ScheduleRouteLink>> {
        let links = self.links.read().await;
        Ok(links
            .iter()
            .filter(|l| l.schedule_id == schedule_id)
            .cloned()
            .collect())
    }
}
