//! Service layer providing the booking-domain workflows on top of models.
//! - Separates business logic from data access.
//! - Reuses validation and entity definitions in the `models` crate.
//! - Provides clear error types and documented interfaces.

pub mod errors;
pub mod auth;
pub mod availability;
pub mod space_service;
pub mod booking_service;
pub mod notify;
#[cfg(test)]
pub mod test_support;
