use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema)]
pub struct SpaceSummaryDoc {
    pub space_id: String,
    pub owner_name: String,
    pub description: String,
    pub price_per_night: String,
}

#[derive(ToSchema)]
pub struct SpaceDetailDoc {
    pub space_id: String,
    pub owner_name: String,
    pub description: String,
    pub price_per_night: String,
    /// ISO date -> still bookable
    pub availability: std::collections::BTreeMap<String, bool>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::spaces::add_space,
        crate::routes::spaces::view_space,
        crate::routes::spaces::list_spaces,
        crate::routes::spaces::add_availability,
        crate::routes::spaces::remove_availability,
        crate::routes::bookings::request_booking,
        crate::routes::bookings::approve,
        crate::routes::bookings::deny,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            SpaceSummaryDoc,
            SpaceDetailDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "spaces"),
        (name = "bookings"),
    )
)]
pub struct ApiDoc;
