//! Shared core state
//!
//! Este módulo define el estado compartido del núcleo: configuración,
//! repositorios, clientes de colaboradores externos y servicios, cableados
//! una sola vez y clonables por referencia.

use std::sync::Arc;

use crate::clients::catalog_client::{CatalogClient, InMemoryCatalogClient};
use crate::clients::fleet_client::{FleetClient, InMemoryFleetClient};
use crate::clients::skills_client::{InMemorySkillsClient, SkillsClient};
use crate::config::environment::CoreConfig;
use crate::repositories::donation_repository::{DonationRepository, InMemoryDonationRepository};
use crate::repositories::route_repository::{InMemoryRouteRepository, RouteRepository};
use crate::repositories::schedule_repository::{InMemoryScheduleRepository, ScheduleRepository};
use crate::repositories::stock_repository::{InMemoryStockRepository, StockRepository};
use crate::services::capacity_planner_service::CapacityPlannerService;
use crate::services::donation_reconciler_service::DonationReconcilerService;
use crate::services::eligibility_service::EligibilityService;
use crate::services::route_scheduler_service::RouteSchedulerService;
use crate::services::stock_ledger_service::StockLedgerService;
use crate::utils::locks::{LockMap, RetryPolicy};

/// Estado compartido del núcleo logístico
#[derive(Clone)]
pub struct CoreState {
    pub config: CoreConfig,
    pub ledger: Arc<StockLedgerService>,
    pub capacity: Arc<CapacityPlannerService>,
    pub scheduler: Arc<RouteSchedulerService>,
    pub reconciler: Arc<DonationReconcilerService>,
    pub eligibility: Arc<EligibilityService>,
}

impl CoreState {
    /// Cablear el núcleo con repositorios y clientes arbitrarios
    pub fn new(
        config: CoreConfig,
        routes: Arc<dyn RouteRepository>,
        stock: Arc<dyn StockRepository>,
        donations: Arc<dyn DonationRepository>,
        schedules: Arc<dyn ScheduleRepository>,
        fleet: Arc<dyn FleetClient>,
        skills: Arc<dyn SkillsClient>,
        catalog: Arc<dyn CatalogClient>,
    ) -> Self {
        let locks = LockMap::new(config.lock_wait());
        let retry = RetryPolicy::new(
            config.lock_retry_attempts,
            config.lock_retry_base(),
            config.lock_retry_max(),
        );

        let ledger = Arc::new(StockLedgerService::new(
            stock,
            locks.clone(),
            retry.clone(),
        ));
        let capacity = Arc::new(CapacityPlannerService::new(routes.clone(), fleet.clone()));
        let reconciler = Arc::new(DonationReconcilerService::new(
            donations,
            routes.clone(),
            catalog,
            ledger.clone(),
            config.intake_zone.clone(),
        ));
        let scheduler = Arc::new(RouteSchedulerService::new(
            routes,
            schedules,
            fleet,
            ledger.clone(),
            capacity.clone(),
            reconciler.clone(),
            locks,
            retry,
        ));
        let eligibility = Arc::new(EligibilityService::new(skills));

        Self {
            config,
            ledger,
            capacity,
            scheduler,
            reconciler,
            eligibility,
        }
    }

    /// Cableado en memoria: harness de tests y default hasta enchufar
    /// la persistencia real
    pub fn in_memory(config: CoreConfig) -> (Self, InMemoryCollaborators) {
        let collaborators = InMemoryCollaborators {
            routes: Arc::new(InMemoryRouteRepository::new()),
            stock: Arc::new(InMemoryStockRepository::new()),
            donations: Arc::new(InMemoryDonationRepository::new()),
            schedules: Arc::new(InMemoryScheduleRepository::new()),
            fleet: Arc::new(InMemoryFleetClient::new()),
            skills: Arc::new(InMemorySkillsClient::new()),
            catalog: Arc::new(InMemoryCatalogClient::new()),
        };

        let state = Self::new(
            config,
            collaborators.routes.clone(),
            collaborators.stock.clone(),
            collaborators.donations.clone(),
            collaborators.schedules.clone(),
            collaborators.fleet.clone(),
            collaborators.skills.clone(),
            collaborators.catalog.clone(),
        );

        (state, collaborators)
    }
}

/// Adaptadores en memoria expuestos para seeding en tests
#[derive(Clone)]
pub struct InMemoryCollaborators {
    pub routes: Arc<InMemoryRouteRepository>,
    pub stock: Arc<InMemoryStockRepository>,
    pub donations: Arc<InMemoryDonationRepository>,
    pub schedules: Arc<InMemoryScheduleRepository>,
    pub fleet: Arc<InMemoryFleetClient>,
    pub skills: Arc<InMemorySkillsClient>,
    pub catalog: Arc<InMemoryCatalogClient>,
}
