use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use service::booking_service;
use service::notify::Notification;
use service::space_service;

use crate::auth::{CurrentUser, ServerState};
use crate::errors::ApiError;
use crate::routes::expand_date_range;

use super::spaces::DateRangeParams;

#[utoipa::path(post, path = "/spaces/{id}/request-booking", tag = "bookings",
    params(("id" = Uuid, Path, description = "Space id")),
    responses(
        (status = 201, description = "Pending bookings created, one per day"),
        (status = 400, description = "Past dates or booking an owned space"),
        (status = 404, description = "Unknown space"),
        (status = 409, description = "Space not available in the requested dates")))]
pub async fn request_booking(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(range): Query<DateRangeParams>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let dates = expand_date_range(range.start_date, range.end_date)?;
    let owner = space_service::owner_of(&state.db, id).await?;
    if owner.email == user.email {
        return Err(ApiError::Validation("Unable to request a booking in owned space!".into()));
    }

    booking_service::request_booking(&state.db, id, &user.email, &dates).await?;

    state
        .notifier
        .notify(Notification::BookingRequested { to: owner.email, name: owner.name });
    state.notifier.notify(Notification::RequestReceived { to: user.email });
    Ok((StatusCode::CREATED, "Booking requested successfully! Please wait for approval."))
}

#[utoipa::path(post, path = "/spaces/{id}/bookings/approve", tag = "bookings",
    params(("id" = Uuid, Path, description = "Space id")),
    responses(
        (status = 200, description = "All bookings approved; dates no longer available"),
        (status = 400, description = "Cross-space ids or a booking already decided"),
        (status = 403, description = "Caller does not own the space"),
        (status = 404, description = "No bookings match the ids"),
        (status = 409, description = "Dates no longer available")))]
pub async fn approve(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(booking_ids): Json<Vec<Uuid>>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let owner = space_service::owner_of(&state.db, id).await?;
    if owner.email != user.email {
        return Err(ApiError::forbidden());
    }

    booking_service::approve_bookings(&state.db, id, &booking_ids).await?;

    if let Some(first) = booking_ids.first() {
        let requester = booking_service::requester_of(&state.db, *first).await?;
        state
            .notifier
            .notify(Notification::BookingConfirmed { to: owner.email, name: owner.name });
        state.notifier.notify(Notification::BookingApproved { to: requester.email });
    }
    Ok((StatusCode::OK, "Bookings approved successfully!"))
}

#[utoipa::path(post, path = "/spaces/{id}/bookings/deny", tag = "bookings",
    params(("id" = Uuid, Path, description = "Space id")),
    responses(
        (status = 200, description = "All bookings denied; availability untouched"),
        (status = 400, description = "Cross-space ids or a booking already decided"),
        (status = 403, description = "Caller does not own the space"),
        (status = 404, description = "No bookings match the ids")))]
pub async fn deny(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(booking_ids): Json<Vec<Uuid>>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let owner = space_service::owner_of(&state.db, id).await?;
    if owner.email != user.email {
        return Err(ApiError::forbidden());
    }

    booking_service::deny_bookings(&state.db, id, &booking_ids).await?;

    if let Some(first) = booking_ids.first() {
        let requester = booking_service::requester_of(&state.db, *first).await?;
        state.notifier.notify(Notification::BookingDenied { to: requester.email });
    }
    Ok((StatusCode::OK, "Bookings denied successfully!"))
}
