use anyhow::Result;
use chrono::NaiveDate;
use uuid::Uuid;

use donation_logistics::config::environment::CoreConfig;
use donation_logistics::models::donation::CreateDonationRequest;
use donation_logistics::models::route::{CreateRouteRequest, Route, RouteKind};
use donation_logistics::models::truck::Truck;
use donation_logistics::state::{CoreState, InMemoryCollaborators};
use donation_logistics::utils::errors::CoreError;

#[tokio::test]
async fn test_completed_collection_credits_intake() -> Result<()> {
    // Dos donaciones de 5 y 7 uds del mismo producto: al completar, la zona
    // de entrada sube 12 y ambas quedan recolectadas con la fecha de cierre
    let (state, ctx) = setup().await;
    let route = collect_route(&state, &ctx).await?;

    let product = Uuid::new_v4();
    ctx.catalog.add_product(product).await;

    for quantity in [5, 7] {
        let donation = state
            .reconciler
            .create_donation(CreateDonationRequest {
                donor: "Mercado Central".to_string(),
                product_id: product,
                quantity,
            })
            .await?;
        state.reconciler.link_donation(donation.id, route.id).await?;
    }

    state.scheduler.start(route.id).await?;
    let completion = state.scheduler.complete(route.id).await?;
    assert!(completion.reconciliation_failures.is_empty());

    let level = state.ledger.get_available(product, "intake").await?;
    assert_eq!(level.on_hand, 12);

    let completed_at = completion.route.completed_at.unwrap();
    let pending = state.reconciler.list_pending().await?;
    assert!(pending.is_empty());

    for donation in donations_for_route(&ctx, route.id).await? {
        assert!(donation.collected);
        assert_eq!(donation.collection_date, Some(completed_at));
    }

    Ok(())
}

#[tokio::test]
async fn test_bad_donation_does_not_block_completion() -> Result<()> {
    let (state, ctx) = setup().await;
    let route = collect_route(&state, &ctx).await?;

    let known = Uuid::new_v4();
    ctx.catalog.add_product(known).await;
    let unknown = Uuid::new_v4();

    let good = state
        .reconciler
        .create_donation(CreateDonationRequest {
            donor: "Panadería Sol".to_string(),
            product_id: known,
            quantity: 9,
        })
        .await?;
    let bad = state
        .reconciler
        .create_donation(CreateDonationRequest {
            donor: "Donante Anónimo".to_string(),
            product_id: unknown,
            quantity: 3,
        })
        .await?;

    state.reconciler.link_donation(good.id, route.id).await?;
    state.reconciler.link_donation(bad.id, route.id).await?;

    state.scheduler.start(route.id).await?;
    let completion = state.scheduler.complete(route.id).await?;

    // La ruta se completó igualmente; el fallo queda reportado
    assert_eq!(completion.reconciliation_failures.len(), 1);
    assert_eq!(completion.reconciliation_failures[0].donation_id, bad.id);

    let level = state.ledger.get_available(known, "intake").await?;
    assert_eq!(level.on_hand, 9);

    // La donación defectuosa sigue pendiente
    let pending = state.reconciler.list_pending().await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, bad.id);

    Ok(())
}

#[tokio::test]
async fn test_cancel_unlinks_donations_back_to_pending() -> Result<()> {
    let (state, ctx) = setup().await;
    let route = collect_route(&state, &ctx).await?;

    let product = Uuid::new_v4();
    ctx.catalog.add_product(product).await;

    let donation = state
        .reconciler
        .create_donation(CreateDonationRequest {
            donor: "Mercado Central".to_string(),
            product_id: product,
            quantity: 5,
        })
        .await?;
    state.reconciler.link_donation(donation.id, route.id).await?;

    state.scheduler.cancel(route.id).await?;

    // La donación vuelve a pendiente y sin ruta; el stock no se tocó
    let pending = state.reconciler.list_pending().await?;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, donation.id);
    assert!(pending[0].route_id.is_none());

    let level = state.ledger.get_available(product, "intake").await?;
    assert_eq!(level.on_hand, 0);

    Ok(())
}

#[tokio::test]
async fn test_donation_requires_positive_quantity() {
    let (state, _ctx) = setup().await;

    let err = state
        .reconciler
        .create_donation(CreateDonationRequest {
            donor: "Mercado Central".to_string(),
            product_id: Uuid::new_v4(),
            quantity: 0,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[tokio::test]
async fn test_catalog_outage_is_reported_per_donation() -> Result<()> {
    let (state, ctx) = setup().await;
    let route = collect_route(&state, &ctx).await?;

    let product = Uuid::new_v4();
    ctx.catalog.add_product(product).await;

    let donation = state
        .reconciler
        .create_donation(CreateDonationRequest {
            donor: "Mercado Central".to_string(),
            product_id: product,
            quantity: 5,
        })
        .await?;
    state.reconciler.link_donation(donation.id, route.id).await?;

    ctx.catalog.set_unavailable(true).await;

    state.scheduler.start(route.id).await?;
    let completion = state.scheduler.complete(route.id).await?;

    // La caída del catálogo no aborta la completación: queda como fallo
    assert_eq!(completion.reconciliation_failures.len(), 1);

    // Nada se acreditó a medias
    let level = state.ledger.get_available(product, "intake").await?;
    assert_eq!(level.on_hand, 0);

    Ok(())
}

// Helpers de setup

fn test_config() -> CoreConfig {
    CoreConfig {
        environment: "test".to_string(),
        lock_wait_ms: 2000,
        lock_retry_attempts: 3,
        lock_retry_base_ms: 5,
        lock_retry_max_ms: 50,
        intake_zone: "intake".to_string(),
    }
}

async fn setup() -> (CoreState, InMemoryCollaborators) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    CoreState::in_memory(test_config())
}

async fn donations_for_route(
    ctx: &InMemoryCollaborators,
    route_id: Uuid,
) -> Result<Vec<donation_logistics::models::donation::Donation>> {
    use donation_logistics::repositories::donation_repository::DonationRepository;
    Ok(ctx.donations.list_by_route(route_id).await?)
}

async fn collect_route(state: &CoreState, ctx: &InMemoryCollaborators) -> Result<Route> {
    let truck = Truck::new("COL-001-TR".to_string(), 50, 1);
    let truck_id = truck.id;
    ctx.fleet.upsert_truck(truck).await;

    let route = state
        .scheduler
        .create_route(CreateRouteRequest {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            kind: RouteKind::Collect,
            truck_id,
            user_id: Uuid::new_v4(),
        })
        .await?;
    Ok(route)
}
