use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::donation::Donation;
use crate::utils::errors::{not_found_error, CoreResult};

/// Persistencia de donaciones
#[async_trait]
pub trait DonationRepository: Send + Sync {
    async fn create(&self, donation: Donation) -> CoreResult<Donation>;
    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Donation>>;
    async fn update(&self, donation: Donation) -> CoreResult<Donation>;
    async fn list_by_route(&self, route_id: Uuid) -> CoreResult<Vec<Donation>>;
    async fn list_pending(&self) -> CoreResult<Vec<Donation>>;
}

/// Implementación en memoria del repositorio de donaciones
#[derive(Clone, Default)]
pub struct InMemoryDonationRepository {
    donations: Arc<RwLock<HashMap<Uuid, Donation>>>,
}

impl InMemoryDonationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DonationRepository for InMemoryDonationRepository {
    async fn create(&self, donation: Donation) -> CoreResult<Donation> {
        let mut donations = self.donations.write().await;
        donations.insert(donation.id, donation.clone());
        Ok(donation)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<Donation>> {
        Ok(self.donations.read().await.get(&id).cloned())
    }

    async fn update(&self, donation: Donation) -> CoreResult<Donation> {
        let mut donations = self.donations.write().await;
        if !donations.contains_key(&donation.id) {
            return Err(not_found_error("Donation", &donation.id.to_string()));
        }
        donations.insert(donation.id, donation.clone());
        Ok(donation)
    }

    async fn list_by_route(&self, route_id: Uuid) -> CoreResult<Vec<Donation>> {
        let donations = self.donations.read().await;
        let mut result: Vec<Donation> = donations
            .values()
            .filter(|d| d.route_id == Some(route_id))
            .cloned()
            .collect();
        result.sort_by_key(|d| d.created_at);
        Ok(result)
    }

    async fn list_pending(&self) -> CoreResult<Vec<Donation>> {
        let donations = self.donations.read().await;
        let mut result: Vec<Donation> = donations
            .values()
            .filter(|d| d.is_pending())
            .cloned()
            .collect();
        result.sort_by_key(|d| d.created_at);
        Ok(result)
    }
}
