//! Bike HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

use crate::application::BikeService;
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult, EmptyData, ValidatedJson};

use super::dto::*;

#[derive(Clone)]
pub struct BikeAppState {
    pub bikes: Arc<BikeService>,
}

pub fn routes(state: BikeAppState) -> Router {
    Router::new()
        .route("/bikes", get(list_bikes).post(create_bike))
        .route(
            "/bikes/{id}",
            get(get_bike).put(update_bike).delete(delete_bike),
        )
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/api/v1/bikes",
    tag = "Bikes",
    responses(
        (status = 200, description = "All bikes", body = ApiResponse<Vec<BikeDto>>)
    )
)]
pub async fn list_bikes(State(state): State<BikeAppState>) -> ApiResult<Vec<BikeDto>> {
    let bikes = state.bikes.list().await?;
    ok(bikes.into_iter().map(BikeDto::from).collect())
}

#[utoipa::path(
    get,
    path = "/api/v1/bikes/{id}",
    tag = "Bikes",
    params(("id" = String, Path, description = "Bike id")),
    responses(
        (status = 200, description = "Bike", body = ApiResponse<BikeDto>),
        (status = 404, description = "Bike not found")
    )
)]
pub async fn get_bike(
    State(state): State<BikeAppState>,
    Path(id): Path<String>,
) -> ApiResult<BikeDto> {
    ok(state.bikes.get(&id).await?.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/bikes",
    tag = "Bikes",
    request_body = BikeRequest,
    responses(
        (status = 200, description = "Created bike", body = ApiResponse<BikeDto>),
        (status = 400, description = "Invalid bike"),
        (status = 422, description = "Field validation failed")
    )
)]
pub async fn create_bike(
    State(state): State<BikeAppState>,
    ValidatedJson(body): ValidatedJson<BikeRequest>,
) -> ApiResult<BikeDto> {
    ok(state.bikes.add(body.into()).await?.into())
}

#[utoipa::path(
    put,
    path = "/api/v1/bikes/{id}",
    tag = "Bikes",
    params(("id" = String, Path, description = "Bike id")),
    request_body = BikeRequest,
    responses(
        (status = 200, description = "Updated bike", body = ApiResponse<BikeDto>),
        (status = 404, description = "Bike not found"),
        (status = 422, description = "Field validation failed")
    )
)]
pub async fn update_bike(
    State(state): State<BikeAppState>,
    Path(id): Path<String>,
    ValidatedJson(body): ValidatedJson<BikeRequest>,
) -> ApiResult<BikeDto> {
    ok(state.bikes.update(&id, body.into()).await?.into())
}

/// Succeeds for unknown ids too.
#[utoipa::path(
    delete,
    path = "/api/v1/bikes/{id}",
    tag = "Bikes",
    params(("id" = String, Path, description = "Bike id")),
    responses(
        (status = 200, description = "Bike deleted", body = ApiResponse<EmptyData>)
    )
)]
pub async fn delete_bike(
    State(state): State<BikeAppState>,
    Path(id): Path<String>,
) -> ApiResult<EmptyData> {
    state.bikes.delete(&id).await?;
    ok(EmptyData {})
}
