//! Servicio de reconciliación de donaciones
//!
//! Vincula donaciones prometidas a rutas de colecta y, cuando la ruta se
//! completa, acredita las cantidades recolectadas en la zona de entrada del
//! almacén. La reconciliación es todo-o-nada por donación: un registro
//! defectuoso se anota como fallo y se salta, el resto se procesa y la
//! completación de la ruta no se bloquea.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::clients::catalog_client::CatalogClient;
use crate::models::donation::{CreateDonationRequest, Donation, ReconciliationFailure};
use crate::models::route::RouteKind;
use crate::repositories::donation_repository::DonationRepository;
use crate::repositories::route_repository::RouteRepository;
use crate::services::stock_ledger_service::StockLedgerService;
use crate::utils::errors::{not_found_error, CoreError, CoreResult};

/// Reconciliador de donaciones contra el ledger de stock
pub struct DonationReconcilerService {
    donations: Arc<dyn DonationRepository>,
    routes: Arc<dyn RouteRepository>,
    catalog: Arc<dyn CatalogClient>,
    ledger: Arc<StockLedgerService>,
    intake_zone: String,
}

impl DonationReconcilerService {
    pub fn new(
        donations: Arc<dyn DonationRepository>,
        routes: Arc<dyn RouteRepository>,
        catalog: Arc<dyn CatalogClient>,
        ledger: Arc<StockLedgerService>,
        intake_zone: String,
    ) -> Self {
        Self {
            donations,
            routes,
            catalog,
            ledger,
            intake_zone,
        }
    }

    /// Registrar una donación prometida (queda pendiente y sin vincular)
    pub async fn create_donation(&self, request: CreateDonationRequest) -> CoreResult<Donation> {
        request.validate()?;

        let donation = Donation::new(request.donor, request.product_id, request.quantity);
        let donation = self.donations.create(donation).await?;

        info!(
            "🎁 Donación {} registrada: {} uds de {} por '{}'",
            donation.id, donation.quantity, donation.product_id, donation.donor
        );
        Ok(donation)
    }

    /// Vincular una donación pendiente a una ruta de colecta
    pub async fn link_donation(&self, donation_id: Uuid, route_id: Uuid) -> CoreResult<Donation> {
        let mut donation = self
            .donations
            .find_by_id(donation_id)
            .await?
            .ok_or_else(|| not_found_error("Donation", &donation_id.to_string()))?;

        let route = self
            .routes
            .find_route(route_id)
            .await?
            .ok_or_else(|| not_found_error("Route", &route_id.to_string()))?;

        if route.kind != RouteKind::Collect {
            return Err(CoreError::TypeMismatch(format!(
                "donations can only be linked to collect routes, route {} is '{}'",
                route_id,
                route.kind.as_str()
            )));
        }

        if route.status.is_terminal() {
            return Err(CoreError::InvalidState(format!(
                "cannot link donation to a route in state '{}'",
                route.status.as_str()
            )));
        }

        if donation.collected {
            return Err(CoreError::InvalidState(
                "donation is already collected".to_string(),
            ));
        }

        if donation.route_id.is_some() {
            return Err(CoreError::InvalidState(
                "donation is already linked to a route".to_string(),
            ));
        }

        donation.route_id = Some(route_id);
        let donation = self.donations.update(donation).await?;

        info!("🔗 Donación {} vinculada a ruta {}", donation_id, route_id);
        Ok(donation)
    }

    /// Desvincular una donación no recolectada (vuelve a pendiente)
    pub async fn unlink_donation(&self, donation_id: Uuid) -> CoreResult<Donation> {
        let mut donation = self
            .donations
            .find_by_id(donation_id)
            .await?
            .ok_or_else(|| not_found_error("Donation", &donation_id.to_string()))?;

        if donation.collected {
            return Err(CoreError::InvalidState(
                "cannot unlink a collected donation".to_string(),
            ));
        }

        donation.route_id = None;
        self.donations.update(donation.clone()).await?;
        Ok(donation)
    }

    /// Desvincular todas las donaciones de una ruta (cancelación)
    pub async fn unlink_for_route(&self, route_id: Uuid) -> CoreResult<()> {
        for donation in self.donations.list_by_route(route_id).await? {
            if !donation.collected {
                let mut donation = donation;
                donation.route_id = None;
                self.donations.update(donation).await?;
            }
        }
        Ok(())
    }

    /// Donaciones aún pendientes de recolectar
    pub async fn list_pending(&self) -> CoreResult<Vec<Donation>> {
        self.donations.list_pending().await
    }

    /// Reconciliar las donaciones de una ruta de colecta completada
    ///
    /// Por cada donación vinculada: verifica el producto contra el catálogo,
    /// acredita la cantidad en la zona de entrada y la marca como recolectada
    /// con la fecha de completación. Los fallos individuales se devuelven en
    /// la lista sin abortar el resto.
    pub async fn reconcile(
        &self,
        route_id: Uuid,
        completion_date: DateTime<Utc>,
    ) -> CoreResult<Vec<ReconciliationFailure>> {
        let linked = self.donations.list_by_route(route_id).await?;
        let mut failures = Vec::new();
        let mut credited = 0usize;

        for donation in linked {
            if donation.collected {
                continue;
            }

            match self.reconcile_one(&donation, completion_date).await {
                Ok(()) => credited += 1,
                Err(err) => {
                    warn!(
                        "⚠️ Fallo reconciliando donación {} de ruta {}: {}",
                        donation.id, route_id, err
                    );
                    failures.push(ReconciliationFailure {
                        donation_id: donation.id,
                        product_id: donation.product_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            "📊 Reconciliación de ruta {} completada: {} acreditadas, {} fallos",
            route_id,
            credited,
            failures.len()
        );
        Ok(failures)
    }

    async fn reconcile_one(
        &self,
        donation: &Donation,
        completion_date: DateTime<Utc>,
    ) -> CoreResult<()> {
        if !self.catalog.product_exists(donation.product_id).await? {
            return Err(not_found_error("Product", &donation.product_id.to_string()));
        }

        self.ledger
            .credit(donation.product_id, &self.intake_zone, donation.quantity)
            .await?;

        let mut collected = donation.clone();
        collected.collected = true;
        collected.collection_date = Some(completion_date);
        self.donations.update(collected).await?;
        Ok(())
    }
}
