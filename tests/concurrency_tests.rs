use chrono::NaiveDate;
use futures::future::join_all;
use rand::Rng;
use uuid::Uuid;

use donation_logistics::config::environment::CoreConfig;
use donation_logistics::models::destination::{AddDestinationRequest, AddProductRequest, UpdateProductQuantityRequest};
use donation_logistics::models::route::{CreateRouteRequest, Route, RouteKind};
use donation_logistics::models::truck::Truck;
use donation_logistics::state::{CoreState, InMemoryCollaborators};

#[tokio::test]
async fn test_concurrent_adds_never_exceed_capacity() {
    // Capacidad 10, diez tareas intentando 3 uds cada una: como mucho
    // entran tres
    let (state, ctx) = setup().await;
    let truck_id = seed_truck(&ctx, 10).await;
    let product = Uuid::new_v4();
    state.ledger.credit(product, "A", 100).await.unwrap();

    let route = distribute_route(&state, truck_id).await;
    let destination = state
        .scheduler
        .add_destination(
            route.id,
            AddDestinationRequest {
                address: "Calle Mayor 12, Madrid".to_string(),
                kind: RouteKind::Distribute,
            },
        )
        .await
        .unwrap();

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let state = state.clone();
            let destination_id = destination.id;
            tokio::spawn(async move {
                state
                    .scheduler
                    .add_product(
                        destination_id,
                        AddProductRequest {
                            product_id: product,
                            quantity: 3,
                        },
                    )
                    .await
            })
        })
        .collect();

    let results = join_all(tasks).await;
    let successes = results
        .into_iter()
        .filter(|r| r.as_ref().map(|inner| inner.is_ok()).unwrap_or(false))
        .count();

    assert_eq!(successes, 3);

    let summary = state.scheduler.get_summary(route.id).await.unwrap();
    assert_eq!(summary.total_quantity, 9);
    assert!(summary.total_quantity <= summary.capacity);
}

#[tokio::test]
async fn test_concurrent_reserves_never_oversell() {
    let (state, _ctx) = setup().await;
    let product = Uuid::new_v4();
    state.ledger.credit(product, "A", 20).await.unwrap();

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let ledger = state.ledger.clone();
            tokio::spawn(async move { ledger.reserve(product, "A", 5).await })
        })
        .collect();

    let results = join_all(tasks).await;
    let successes = results
        .into_iter()
        .filter(|r| r.as_ref().map(|inner| inner.is_ok()).unwrap_or(false))
        .count();

    // Exactamente cuatro reservas de 5 caben en 20
    assert_eq!(successes, 4);

    let level = state.ledger.get_available(product, "A").await.unwrap();
    assert_eq!(level.on_hand, 20);
    assert_eq!(level.reserved, 20);
    assert_eq!(level.available, 0);
}

#[tokio::test]
async fn test_complete_and_cancel_are_mutually_exclusive() {
    let (state, ctx) = setup().await;
    let truck_id = seed_truck(&ctx, 50).await;
    let product = Uuid::new_v4();
    state.ledger.credit(product, "A", 30).await.unwrap();

    let route = distribute_route(&state, truck_id).await;
    let destination = state
        .scheduler
        .add_destination(
            route.id,
            AddDestinationRequest {
                address: "Calle Mayor 12, Madrid".to_string(),
                kind: RouteKind::Distribute,
            },
        )
        .await
        .unwrap();
    state
        .scheduler
        .add_product(
            destination.id,
            AddProductRequest {
                product_id: product,
                quantity: 12,
            },
        )
        .await
        .unwrap();
    state.scheduler.start(route.id).await.unwrap();

    let complete_state = state.clone();
    let cancel_state = state.clone();
    let route_id = route.id;

    let (complete_result, cancel_result) = tokio::join!(
        tokio::spawn(async move { complete_state.scheduler.complete(route_id).await }),
        tokio::spawn(async move { cancel_state.scheduler.cancel(route_id).await }),
    );

    let complete_ok = complete_result.unwrap().is_ok();
    let cancel_ok = cancel_result.unwrap().is_ok();

    // Gana exactamente una de las dos
    assert!(complete_ok ^ cancel_ok);

    let level = state.ledger.get_available(product, "A").await.unwrap();
    assert_eq!(level.reserved, 0);

    if complete_ok {
        // Reservas comprometidas una sola vez
        assert_eq!(level.on_hand, 18);
    } else {
        // Reservas liberadas sin tocar el on-hand
        assert_eq!(level.on_hand, 30);
    }
}

#[tokio::test]
async fn test_random_mutations_preserve_invariants() {
    // Secuencia aleatoria de altas, bajas y cambios de cantidad: la carga
    // nunca supera la capacidad y el stock disponible nunca baja de cero
    let (state, ctx) = setup().await;
    let capacity = 25;
    let initial_stock = 200;
    let truck_id = seed_truck(&ctx, capacity).await;
    let product = Uuid::new_v4();
    state.ledger.credit(product, "A", initial_stock).await.unwrap();

    let route = distribute_route(&state, truck_id).await;
    let destination = state
        .scheduler
        .add_destination(
            route.id,
            AddDestinationRequest {
                address: "Calle Mayor 12, Madrid".to_string(),
                kind: RouteKind::Distribute,
            },
        )
        .await
        .unwrap();

    let mut rows: Vec<Uuid> = Vec::new();

    for _ in 0..100 {
        let action = rand::thread_rng().gen_range(0..3);
        match action {
            0 => {
                let quantity = rand::thread_rng().gen_range(1..=8);
                if let Ok(row) = state
                    .scheduler
                    .add_product(
                        destination.id,
                        AddProductRequest {
                            product_id: product,
                            quantity,
                        },
                    )
                    .await
                {
                    rows.push(row.id);
                }
            }
            1 => {
                if !rows.is_empty() {
                    let idx = rand::thread_rng().gen_range(0..rows.len());
                    let row_id = rows.swap_remove(idx);
                    state.scheduler.remove_product(row_id).await.unwrap();
                }
            }
            _ => {
                if !rows.is_empty() {
                    let idx = rand::thread_rng().gen_range(0..rows.len());
                    let quantity = rand::thread_rng().gen_range(1..=8);
                    let _ = state
                        .scheduler
                        .update_product_quantity(
                            rows[idx],
                            UpdateProductQuantityRequest { quantity },
                        )
                        .await;
                }
            }
        }

        let summary = state.scheduler.get_summary(route.id).await.unwrap();
        assert!(summary.total_quantity <= capacity);

        let level = state.ledger.get_available(product, "A").await.unwrap();
        assert!(level.on_hand >= 0);
        assert!(level.available >= 0);
        assert_eq!(level.reserved, summary.total_quantity);
    }

    // Conservación de reservas: al cancelar, todo vuelve al nivel inicial
    state.scheduler.cancel(route.id).await.unwrap();

    let level = state.ledger.get_available(product, "A").await.unwrap();
    assert_eq!(level.on_hand, initial_stock);
    assert_eq!(level.reserved, 0);
    assert_eq!(level.available, initial_stock);
}

#[tokio::test]
async fn test_operations_on_different_routes_run_in_parallel() {
    let (state, ctx) = setup().await;
    let product = Uuid::new_v4();
    state.ledger.credit(product, "A", 1000).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..4u64 {
        let truck_id = seed_truck(&ctx, 50).await;
        let state = state.clone();
        let date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap() + chrono::Days::new(i);

        handles.push(tokio::spawn(async move {
            let route = state
                .scheduler
                .create_route(CreateRouteRequest {
                    date,
                    kind: RouteKind::Distribute,
                    truck_id,
                    user_id: Uuid::new_v4(),
                })
                .await
                .unwrap();
            let destination = state
                .scheduler
                .add_destination(
                    route.id,
                    AddDestinationRequest {
                        address: "Calle Mayor 12, Madrid".to_string(),
                        kind: RouteKind::Distribute,
                    },
                )
                .await
                .unwrap();
            state
                .scheduler
                .add_product(
                    destination.id,
                    AddProductRequest {
                        product_id: product,
                        quantity: 10,
                    },
                )
                .await
                .unwrap();
            route.id
        }));
    }

    for handle in join_all(handles).await {
        let route_id = handle.unwrap();
        let summary = state.scheduler.get_summary(route_id).await.unwrap();
        assert_eq!(summary.total_quantity, 10);
    }

    let level = state.ledger.get_available(product, "A").await.unwrap();
    assert_eq!(level.reserved, 40);
}

// Helpers de setup

fn test_config() -> CoreConfig {
    CoreConfig {
        environment: "test".to_string(),
        lock_wait_ms: 5000,
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

async fn seed_truck(ctx: &InMemoryCollaborators, capacity: i64) -> Uuid {
    let truck = Truck::new(format!("TRK-{}", &Uuid::new_v4().to_string()[..8]), capacity, 1);
    let id = truck.id;
    ctx.fleet.upsert_truck(truck).await;
    id
}

async fn distribute_route(state: &CoreState, truck_id: Uuid) -> Route {
    state
        .scheduler
        .create_route(CreateRouteRequest {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            kind: RouteKind::Distribute,
            truck_id,
            user_id: Uuid::new_v4(),
        })
        .await
        .unwrap()
}
