//! Reservation HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Router;

use crate::application::ReservationService;
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult, EmptyData, ValidatedJson};

use super::dto::*;

#[derive(Clone)]
pub struct ReservationAppState {
    pub reservations: Arc<ReservationService>,
}

pub fn routes(state: ReservationAppState) -> Router {
    Router::new()
        .route("/reservations", post(create_reservation))
        .route("/reservations/{id}", get(get_reservation))
        .route("/reservations/{id}/cancel", post(cancel_reservation))
        .route("/bikes/{id}/availability", get(get_availability))
        .route("/bikes/{id}/reservations", get(list_reservations))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 200, description = "Approved or rejected", body = ApiResponse<ReservationOutcomeDto>),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Customer not found"),
        (status = 500, description = "Store or signal provider failure"),
        (status = 504, description = "Deadline exceeded")
    )
)]
pub async fn create_reservation(
    State(state): State<ReservationAppState>,
    ValidatedJson(body): ValidatedJson<CreateReservationRequest>,
) -> ApiResult<ReservationOutcomeDto> {
    let outcome = state.reservations.make_reservation(body.into()).await?;
    ok(outcome.into())
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    params(("id" = String, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<ReservationAppState>,
    Path(id): Path<String>,
) -> ApiResult<ReservationDto> {
    ok(state.reservations.get_reservation(&id).await?.into())
}

/// Idempotent.
#[utoipa::path(
    post,
    path = "/api/v1/reservations/{id}/cancel",
    tag = "Reservations",
    params(("id" = String, Path, description = "Reservation id")),
    responses(
        (status = 200, description = "Reservation canceled", body = ApiResponse<EmptyData>),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn cancel_reservation(
    State(state): State<ReservationAppState>,
    Path(id): Path<String>,
) -> ApiResult<EmptyData> {
    state.reservations.cancel_reservation(&id).await?;
    ok(EmptyData {})
}

#[utoipa::path(
    get,
    path = "/api/v1/bikes/{id}/availability",
    tag = "Reservations",
    params(("id" = String, Path, description = "Bike id"), PeriodQuery),
    responses(
        (status = 200, description = "Availability", body = ApiResponse<AvailabilityDto>),
        (status = 400, description = "Invalid window")
    )
)]
pub async fn get_availability(
    State(state): State<ReservationAppState>,
    Path(bike_id): Path<String>,
    Query(period): Query<PeriodQuery>,
) -> ApiResult<AvailabilityDto> {
    let available = state
        .reservations
        .get_availability(&bike_id, period.start_time, period.end_time)
        .await?;
    ok(AvailabilityDto {
        bike_id,
        start_time: period.start_time,
        end_time: period.end_time,
        available,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/bikes/{id}/reservations",
    tag = "Reservations",
    params(("id" = String, Path, description = "Bike id"), PeriodQuery),
    responses(
        (status = 200, description = "Reservations of any status overlapping the window", body = ApiResponse<Vec<ReservationDto>>),
        (status = 400, description = "Invalid window")
    )
)]
pub async fn list_reservations(
    State(state): State<ReservationAppState>,
    Path(bike_id): Path<String>,
    Query(period): Query<PeriodQuery>,
) -> ApiResult<Vec<ReservationDto>> {
    let reservations = state
        .reservations
        .list_reservations(&bike_id, period.start_time, period.end_time)
        .await?;
    ok(reservations.into_iter().map(ReservationDto::from).collect())
}
