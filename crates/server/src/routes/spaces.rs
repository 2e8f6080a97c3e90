use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use service::notify::Notification;
use service::space_service::{self, SpaceDetail, SpaceSummary};
use service::availability;

use crate::auth::{CurrentUser, ServerState};
use crate::errors::ApiError;
use crate::routes::expand_date_range;

#[derive(Debug, Deserialize)]
pub struct AddSpaceParams {
    pub description: String,
    pub price: Decimal,
}

#[derive(Serialize)]
pub struct AddSpaceOutput {
    pub space_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeParams {
    #[serde(alias = "startDate")]
    pub start_date: NaiveDate,
    #[serde(alias = "endDate")]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
    #[serde(alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "endDate")]
    pub end_date: Option<NaiveDate>,
    pub available: Option<bool>,
}

#[utoipa::path(post, path = "/spaces/add-space", tag = "spaces",
    responses(
        (status = 201, description = "Space created"),
        (status = 400, description = "Blank description or non-positive price"),
        (status = 401, description = "Not authenticated")))]
pub async fn add_space(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(params): Query<AddSpaceParams>,
) -> Result<(StatusCode, Json<AddSpaceOutput>), ApiError> {
    let created =
        space_service::create_space(&state.db, &user.email, &params.description, params.price)
            .await?;
    let owner = space_service::owner_of(&state.db, created.id).await?;
    state
        .notifier
        .notify(Notification::SpacePosted { to: owner.email, name: owner.name });
    Ok((StatusCode::CREATED, Json(AddSpaceOutput { space_id: created.id })))
}

#[utoipa::path(get, path = "/spaces/{id}", tag = "spaces",
    params(("id" = Uuid, Path, description = "Space id")),
    responses(
        (status = 200, description = "Space detail with date availability map"),
        (status = 404, description = "Unknown space")))]
pub async fn view_space(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SpaceDetail>, ApiError> {
    Ok(Json(space_service::get_space_detail(&state.db, id).await?))
}

/// One read endpoint, three shapes: everything, spaces with any open date,
/// or spaces covering a requested range. No results is an empty array.
#[utoipa::path(get, path = "/spaces", tag = "spaces",
    responses(
        (status = 200, description = "Space summaries"),
        (status = 400, description = "Past or reversed date range")))]
pub async fn list_spaces(
    State(state): State<ServerState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SpaceSummary>>, ApiError> {
    let summaries = match (params.start_date, params.end_date) {
        (Some(start), Some(end)) => {
            let dates = expand_date_range(start, end)?;
            space_service::list_available(&state.db, Some(&dates)).await?
        }
        (None, None) => {
            if params.available.unwrap_or(false) {
                space_service::list_available(&state.db, None).await?
            } else {
                space_service::list_all(&state.db).await?
            }
        }
        _ => return Err(ApiError::Validation("Please select valid dates!".into())),
    };
    Ok(Json(summaries))
}

#[utoipa::path(post, path = "/spaces/{id}/add-availability", tag = "spaces",
    params(("id" = Uuid, Path, description = "Space id")),
    responses(
        (status = 201, description = "Dates offered"),
        (status = 400, description = "Past or reversed date range"),
        (status = 403, description = "Caller does not own the space"),
        (status = 404, description = "Unknown space")))]
pub async fn add_availability(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(range): Query<DateRangeParams>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let dates = expand_date_range(range.start_date, range.end_date)?;
    let owner = space_service::owner_of(&state.db, id).await?;
    if owner.email != user.email {
        return Err(ApiError::forbidden());
    }
    availability::publish(&state.db, id, &dates).await?;
    state
        .notifier
        .notify(Notification::AvailabilityUpdated { to: owner.email, name: owner.name });
    Ok((StatusCode::CREATED, "Availability added successfully!"))
}

#[derive(Serialize)]
pub struct RemoveAvailabilityOutput {
    pub removed: u64,
}

#[utoipa::path(delete, path = "/spaces/{id}/availability", tag = "spaces",
    params(("id" = Uuid, Path, description = "Space id")),
    responses(
        (status = 200, description = "Offered dates withdrawn"),
        (status = 403, description = "Caller does not own the space"),
        (status = 404, description = "Unknown space")))]
pub async fn remove_availability(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(range): Query<DateRangeParams>,
) -> Result<Json<RemoveAvailabilityOutput>, ApiError> {
    if range.start_date > range.end_date {
        return Err(ApiError::Validation("Please select valid dates!".into()));
    }
    let owner = space_service::owner_of(&state.db, id).await?;
    if owner.email != user.email {
        return Err(ApiError::forbidden());
    }
    let dates: Vec<NaiveDate> = range
        .start_date
        .iter_days()
        .take_while(|d| *d <= range.end_date)
        .collect();
    let removed = availability::withdraw(&state.db, id, &dates).await?;
    state
        .notifier
        .notify(Notification::AvailabilityUpdated { to: owner.email, name: owner.name });
    Ok(Json(RemoveAvailabilityOutput { removed }))
}
