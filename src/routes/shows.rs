use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::shows::{RateShowRequest, RatingSummary, ShowList, ShowPayload},
    error::AppResult,
    middleware::{auth::AuthUser, json::ApiJson},
    models::Show,
    response::ApiResponse,
    routes::params::ShowQuery,
    services::show_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shows).post(create_show))
        .route("/{id}", get(get_show).put(update_show).delete(delete_show))
        .route("/{id}/rating", post(rate_show))
}

#[utoipa::path(
    get,
    path = "/api/movie",
    params(ShowQuery),
    responses(
        (status = 200, description = "List movies with their showtimes", body = ApiResponse<ShowList>)
    ),
    tag = "Movies"
)]
pub async fn list_shows(
    State(state): State<AppState>,
    Query(query): Query<ShowQuery>,
) -> AppResult<Json<ApiResponse<ShowList>>> {
    let resp = show_service::list_shows(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/movie/{id}",
    params(
        ("id" = Uuid, Path, description = "Movie ID")
    ),
    responses(
        (status = 200, description = "Get movie", body = ApiResponse<Show>),
        (status = 404, description = "Movie not found"),
    ),
    tag = "Movies"
)]
pub async fn get_show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Show>>> {
    let resp = show_service::get_show(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/movie",
    request_body = ShowPayload,
    responses(
        (status = 201, description = "Create movie", body = ApiResponse<Show>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn create_show(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<ShowPayload>,
) -> AppResult<(StatusCode, Json<ApiResponse<Show>>)> {
    let resp = show_service::create_show(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/movie/{id}",
    params(
        ("id" = Uuid, Path, description = "Movie ID")
    ),
    request_body = ShowPayload,
    responses(
        (status = 200, description = "Replace movie and its showtimes; bookings at removed showtimes are cancelled", body = ApiResponse<Show>),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Movie not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn update_show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<ShowPayload>,
) -> AppResult<Json<ApiResponse<Show>>> {
    let resp = show_service::update_show(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/movie/{id}",
    params(
        ("id" = Uuid, Path, description = "Movie ID")
    ),
    responses(
        (status = 200, description = "Delete movie and cancel its bookings"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Movie not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn delete_show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = show_service::delete_show(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/movie/{id}/rating",
    params(
        ("id" = Uuid, Path, description = "Movie ID")
    ),
    request_body = RateShowRequest,
    responses(
        (status = 200, description = "Rating stored", body = ApiResponse<RatingSummary>),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 404, description = "Movie not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Movies"
)]
pub async fn rate_show(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<RateShowRequest>,
) -> AppResult<Json<ApiResponse<RatingSummary>>> {
    let resp = show_service::rate_show(&state, &user, id, payload).await?;
    Ok(Json(resp))
}
