use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;

use crate::auth::ServerState;
use crate::errors::ApiError;

pub mod auth;
pub mod bookings;
pub mod spaces;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "Service is up")))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Expand an inclusive date range, rejecting past dates and reversed
/// ranges up front so no workflow ever sees them.
pub(crate) fn expand_date_range(
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<NaiveDate>, ApiError> {
    let today = Utc::now().date_naive();
    if start < today || end < today || start > end {
        return Err(ApiError::Validation("Please select valid dates!".into()));
    }
    Ok(start.iter_days().take_while(|d| *d <= end).collect())
}

/// Build the full application router: public reads, auth, and the
/// authenticated booking workflow routes
pub fn build_router(cors: CorsLayer, state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/spaces", get(spaces::list_spaces))
        .route("/spaces/add-space", post(spaces::add_space))
        .route("/spaces/:id", get(spaces::view_space))
        .route("/spaces/:id/add-availability", post(spaces::add_availability))
        .route("/spaces/:id/availability", delete(spaces::remove_availability))
        .route("/spaces/:id/request-booking", post(bookings::request_booking))
        .route("/spaces/:id/bookings/approve", post(bookings::approve))
        .route("/spaces/:id/bookings/deny", post(bookings::deny))
        .merge(
            SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", crate::openapi::ApiDoc::openapi()),
        )
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new().level(Level::INFO).include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    #[test]
    fn range_is_inclusive_of_both_endpoints() {
        let today = Utc::now().date_naive();
        let start = today + Days::new(3);
        let end = today + Days::new(4);
        let dates = expand_date_range(start, end).unwrap();
        assert_eq!(dates, vec![start, end]);
    }

    #[test]
    fn single_day_range_is_one_date() {
        let day = Utc::now().date_naive() + Days::new(1);
        assert_eq!(expand_date_range(day, day).unwrap(), vec![day]);
    }

    #[test]
    fn past_dates_are_rejected() {
        let today = Utc::now().date_naive();
        let yesterday = today - Days::new(1);
        assert!(expand_date_range(yesterday, today).is_err());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let today = Utc::now().date_naive();
        assert!(expand_date_range(today + Days::new(5), today + Days::new(2)).is_err());
    }
}
