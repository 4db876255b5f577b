//! API router with Swagger UI

use std::sync::Arc;

use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{BikeService, ReservationService};
use crate::interfaces::http::common::{ApiResponse, EmptyData};
use crate::interfaces::http::modules::bikes::{self, BikeAppState};
use crate::interfaces::http::modules::health::{self, HealthState};
use crate::interfaces::http::modules::metrics::{self, http_metrics_middleware, MetricsState};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::reservations::{self, ReservationAppState};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        bikes::list_bikes,
        bikes::get_bike,
        bikes::create_bike,
        bikes::update_bike,
        bikes::delete_bike,
        reservations::create_reservation,
        reservations::get_reservation,
        reservations::cancel_reservation,
        reservations::get_availability,
        reservations::list_reservations,
    ),
    components(
        schemas(
            ApiResponse<String>,
            EmptyData,
            health::HealthResponse,
            health::StorageHealth,
            bikes::BikeDto,
            bikes::BikeRequest,
            reservations::LocationDto,
            reservations::CustomerDataDto,
            reservations::CustomerDto,
            reservations::CreateReservationRequest,
            reservations::ReservationDto,
            reservations::ReservationOutcomeDto,
            reservations::AvailabilityDto,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and storage reachability"),
        (name = "Bikes", description = "Bike catalog management"),
        (name = "Reservations", description = "Booking, cancellation and availability"),
    ),
    info(
        title = "Bike Rental API",
        version = "1.0.0",
        description = "Conflict-free bike reservations with dynamic discounts",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Everything the HTTP surface needs from the rest of the service.
#[derive(Clone)]
pub struct ApiServices {
    pub bikes: Arc<BikeService>,
    pub reservations: Arc<ReservationService>,
    pub health: HealthState,
    /// `/metrics` is only mounted when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

pub fn create_api_router(services: ApiServices) -> Router {
    let api = Router::new()
        .merge(bikes::routes(BikeAppState {
            bikes: services.bikes,
        }))
        .merge(reservations::routes(ReservationAppState {
            reservations: services.reservations,
        }));

    let mut router = Router::new()
        .nest("/api/v1", api)
        .merge(health::routes(services.health));

    if let Some(handle) = services.metrics {
        router = router.merge(metrics::routes(MetricsState { handle }));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .route_layer(middleware::from_fn(http_metrics_middleware))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
}
