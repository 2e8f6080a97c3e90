//! Booking workflow: request -> approve | deny, one row per requested day.
//! Every check-then-mutate sequence runs under SERIALIZABLE isolation.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    IsolationLevel, QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument};
use uuid::Uuid;

use models::booking::{self, BookingStatus};
use models::{space, user};

use crate::availability;
use crate::errors::ServiceError;

/// Batch pre-checks, all-or-nothing before any row is touched: every
/// booking must belong to the addressed space and still be PENDING.
fn validate_batch(bookings: &[booking::Model], space_id: Uuid) -> Result<(), ServiceError> {
    for b in bookings {
        if b.space_id != space_id {
            return Err(ServiceError::Validation(
                "Unable to process; one or more bookings aren't assigned to the space!".into(),
            ));
        }
    }
    for b in bookings {
        b.ensure_pending()?;
    }
    Ok(())
}

fn distinct_dates(bookings: &[booking::Model]) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = bookings.iter().map(|b| b.date).collect();
    dates.into_iter().collect()
}

/// Move one booking out of PENDING. The WHERE clause re-checks the prior
/// state so a race inside the batch surfaces as an error, not a double
/// transition.
async fn transition<C: ConnectionTrait>(
    conn: &C,
    booking_id: Uuid,
    target: BookingStatus,
) -> Result<(), ServiceError> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let res = booking::Entity::update_many()
        .col_expr(booking::Column::Status, Expr::value(target))
        .col_expr(booking::Column::UpdatedAt, Expr::value(now))
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::Status.eq(BookingStatus::Pending))
        .exec(conn)
        .await?;
    if res.rows_affected != 1 {
        let current = booking::Entity::find_by_id(booking_id)
            .one(conn)
            .await?
            .map(|b| b.status.to_string())
            .unwrap_or_else(|| "UNKNOWN".into());
        return Err(ServiceError::InvalidState(format!(
            "Unable to change the status from {current}"
        )));
    }
    Ok(())
}

/// Create one PENDING booking per requested date. PENDING rows do not
/// consume availability; only approval does.
#[instrument(skip(db, dates), fields(date_count = dates.len()))]
pub async fn request_booking(
    db: &DatabaseConnection,
    space_id: Uuid,
    requester_email: &str,
    dates: &[NaiveDate],
) -> Result<Vec<booking::Model>, ServiceError> {
    if dates.is_empty() {
        return Err(ServiceError::Validation("Please select dates!".into()));
    }
    let requester = user::find_by_email(db, requester_email)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User doesn't exist!".into()))?;
    let space = space::Entity::find_by_id(space_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Space not found!".into()))?;

    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();

    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;
    let requested: Vec<NaiveDate> = distinct.iter().copied().collect();
    if !availability::is_available(&txn, space.id, &requested).await? {
        return Err(ServiceError::Conflict(
            "Unable to create booking: space is not available in requested dates.".into(),
        ));
    }

    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let mut created = Vec::with_capacity(distinct.len());
    for date in distinct {
        let am = booking::ActiveModel {
            id: Set(Uuid::new_v4()),
            space_id: Set(space.id),
            user_id: Set(requester.id),
            date: Set(date),
            status: Set(BookingStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
        };
        created.push(am.insert(&txn).await?);
    }
    txn.commit().await?;

    info!(space_id = %space.id, requester_id = %requester.id, count = created.len(), "booking_requested");
    Ok(created)
}

/// Approve a batch. Validation is all-or-nothing; once it passes, each row
/// still re-checks its own prior state on update. Approved rows make their
/// dates unavailable by derivation — there is no flag to flip.
#[instrument(skip(db, booking_ids), fields(batch = booking_ids.len()))]
pub async fn approve_bookings(
    db: &DatabaseConnection,
    space_id: Uuid,
    booking_ids: &[Uuid],
) -> Result<(), ServiceError> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;

    let bookings = booking::Entity::find()
        .filter(booking::Column::Id.is_in(booking_ids.iter().copied()))
        .all(&txn)
        .await?;
    if bookings.is_empty() {
        return Err(ServiceError::NotFound("No bookings found for the provided IDs.".into()));
    }
    validate_batch(&bookings, space_id)?;

    let dates = distinct_dates(&bookings);
    if !availability::is_available(&txn, space_id, &dates).await? {
        return Err(ServiceError::Conflict(
            "Unable to approve the request - space is not available in selected dates.".into(),
        ));
    }

    for b in &bookings {
        transition(&txn, b.id, BookingStatus::Approved).await?;
    }
    txn.commit().await?;

    info!(%space_id, approved = bookings.len(), "bookings_approved");
    Ok(())
}

/// Deny a batch under the same lookup/tamper/one-way rules as approval.
/// Denial never touches availability.
#[instrument(skip(db, booking_ids), fields(batch = booking_ids.len()))]
pub async fn deny_bookings(
    db: &DatabaseConnection,
    space_id: Uuid,
    booking_ids: &[Uuid],
) -> Result<(), ServiceError> {
    let txn = db
        .begin_with_config(Some(IsolationLevel::Serializable), None)
        .await?;

    let bookings = booking::Entity::find()
        .filter(booking::Column::Id.is_in(booking_ids.iter().copied()))
        .all(&txn)
        .await?;
    if bookings.is_empty() {
        return Err(ServiceError::NotFound("No bookings found for the provided IDs.".into()));
    }
    validate_batch(&bookings, space_id)?;

    for b in &bookings {
        transition(&txn, b.id, BookingStatus::Denied).await?;
    }
    txn.commit().await?;

    info!(%space_id, denied = bookings.len(), "bookings_denied");
    Ok(())
}

/// Requester behind a booking id, used to address workflow notifications.
pub async fn requester_of(
    db: &DatabaseConnection,
    booking_id: Uuid,
) -> Result<user::Model, ServiceError> {
    let b = booking::Entity::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("No bookings found for the provided IDs.".into()))?;
    user::Entity::find_by_id(b.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Db("booking requester row is missing".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn booking_row(space_id: Uuid, date: NaiveDate, status: BookingStatus) -> booking::Model {
        booking::Model {
            id: Uuid::new_v4(),
            space_id,
            user_id: Uuid::new_v4(),
            date,
            status,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn batch_with_foreign_space_is_rejected_before_any_mutation() {
        let space = Uuid::new_v4();
        let rows = vec![
            booking_row(space, d(1), BookingStatus::Pending),
            booking_row(Uuid::new_v4(), d(2), BookingStatus::Pending),
        ];
        let err = validate_batch(&rows, space).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn batch_with_terminal_booking_is_rejected() {
        let space = Uuid::new_v4();
        let rows = vec![
            booking_row(space, d(1), BookingStatus::Pending),
            booking_row(space, d(2), BookingStatus::Approved),
        ];
        let err = validate_batch(&rows, space).unwrap_err();
        match err {
            ServiceError::InvalidState(msg) => assert!(msg.contains("APPROVED")),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn distinct_dates_deduplicates_and_orders() {
        let space = Uuid::new_v4();
        let rows = vec![
            booking_row(space, d(2), BookingStatus::Pending),
            booking_row(space, d(1), BookingStatus::Pending),
            booking_row(space, d(2), BookingStatus::Pending),
        ];
        assert_eq!(distinct_dates(&rows), vec![d(1), d(2)]);
    }

    mod db {
        use super::*;
        use crate::availability;
        use crate::test_support::get_db;
        use rust_decimal::Decimal;

        async fn seed_space(
            db: &sea_orm::DatabaseConnection,
        ) -> Result<(models::user::Model, models::user::Model, models::space::Model), anyhow::Error>
        {
            let owner = models::user::create(
                db,
                &format!("owner_{}@example.com", Uuid::new_v4()),
                "Olive Owner",
                "$argon2id$test",
            )
            .await?;
            let guest = models::user::create(
                db,
                &format!("guest_{}@example.com", Uuid::new_v4()),
                "Gus Guest",
                "$argon2id$test",
            )
            .await?;
            let space =
                models::space::create(db, owner.id, "Canal view room", Decimal::new(9900, 2))
                    .await?;
            Ok((owner, guest, space))
        }

        #[tokio::test]
        async fn request_then_approve_consumes_the_dates() -> Result<(), anyhow::Error> {
            if std::env::var("SKIP_DB_TESTS").is_ok() {
                return Ok(());
            }
            let db = get_db().await?;
            let (_owner, guest, space) = seed_space(&db).await?;
            availability::publish(&db, space.id, &[d(1), d(2)]).await?;

            let created =
                request_booking(&db, space.id, &guest.email, &[d(1), d(2)]).await?;
            assert_eq!(created.len(), 2);
            assert!(created.iter().all(|b| b.status == BookingStatus::Pending));
            // pending bookings are advisory; the dates stay open
            assert!(availability::is_available(&db, space.id, &[d(1), d(2)]).await?);

            let ids: Vec<Uuid> = created.iter().map(|b| b.id).collect();
            approve_bookings(&db, space.id, &ids).await?;
            assert!(!availability::is_available(&db, space.id, &[d(1)]).await?);
            assert!(!availability::is_available(&db, space.id, &[d(2)]).await?);

            // terminal states are final
            let err = approve_bookings(&db, space.id, &ids[..1]).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidState(_)));
            let err = deny_bookings(&db, space.id, &ids[..1]).await.unwrap_err();
            assert!(matches!(err, ServiceError::InvalidState(_)));
            Ok(())
        }

        #[tokio::test]
        async fn request_without_offered_dates_conflicts() -> Result<(), anyhow::Error> {
            if std::env::var("SKIP_DB_TESTS").is_ok() {
                return Ok(());
            }
            let db = get_db().await?;
            let (_owner, guest, space) = seed_space(&db).await?;

            let err = request_booking(&db, space.id, &guest.email, &[d(10)])
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Conflict(_)));

            let err = request_booking(&db, space.id, &guest.email, &[]).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));

            let err = request_booking(&db, space.id, "ghost@example.com", &[d(10)])
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)));
            Ok(())
        }

        #[tokio::test]
        async fn deny_leaves_availability_untouched() -> Result<(), anyhow::Error> {
            if std::env::var("SKIP_DB_TESTS").is_ok() {
                return Ok(());
            }
            let db = get_db().await?;
            let (_owner, guest, space) = seed_space(&db).await?;
            availability::publish(&db, space.id, &[d(5)]).await?;

            let created = request_booking(&db, space.id, &guest.email, &[d(5)]).await?;
            let ids: Vec<Uuid> = created.iter().map(|b| b.id).collect();
            deny_bookings(&db, space.id, &ids).await?;

            assert!(availability::is_available(&db, space.id, &[d(5)]).await?);
            // a denied request does not block a fresh one
            let again = request_booking(&db, space.id, &guest.email, &[d(5)]).await?;
            assert_eq!(again.len(), 1);
            Ok(())
        }

        #[tokio::test]
        async fn cross_space_batch_never_mutates() -> Result<(), anyhow::Error> {
            if std::env::var("SKIP_DB_TESTS").is_ok() {
                return Ok(());
            }
            let db = get_db().await?;
            let (_o1, guest, space_a) = seed_space(&db).await?;
            let (_o2, _g2, space_b) = seed_space(&db).await?;
            availability::publish(&db, space_a.id, &[d(7)]).await?;

            let created = request_booking(&db, space_a.id, &guest.email, &[d(7)]).await?;
            let ids: Vec<Uuid> = created.iter().map(|b| b.id).collect();

            let err = approve_bookings(&db, space_b.id, &ids).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));

            // the batch aborted before mutating: still approvable on its own space
            approve_bookings(&db, space_a.id, &ids).await?;
            Ok(())
        }
    }
}
