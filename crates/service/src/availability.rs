//! Availability as a derived view: a date is bookable iff it is offered
//! and no APPROVED booking covers it. No stored flag exists.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use models::booking::{self, BookingStatus};
use models::space_availability;

use crate::errors::ServiceError;

/// Every requested date must be offered and not already consumed by an
/// approved booking. Pure set logic, shared by the query paths.
fn dates_covered(
    requested: &BTreeSet<NaiveDate>,
    offered: &BTreeSet<NaiveDate>,
    approved: &BTreeSet<NaiveDate>,
) -> bool {
    requested
        .iter()
        .all(|d| offered.contains(d) && !approved.contains(d))
}

async fn offered_dates<C: ConnectionTrait>(
    conn: &C,
    space_id: Uuid,
    dates: Option<&BTreeSet<NaiveDate>>,
) -> Result<BTreeSet<NaiveDate>, ServiceError> {
    let mut query = space_availability::Entity::find()
        .filter(space_availability::Column::SpaceId.eq(space_id));
    if let Some(dates) = dates {
        query = query.filter(space_availability::Column::Date.is_in(dates.iter().copied()));
    }
    let rows = query.all(conn).await?;
    Ok(rows.into_iter().map(|r| r.date).collect())
}

async fn approved_dates<C: ConnectionTrait>(
    conn: &C,
    space_id: Uuid,
    dates: Option<&BTreeSet<NaiveDate>>,
) -> Result<BTreeSet<NaiveDate>, ServiceError> {
    let mut query = booking::Entity::find()
        .filter(booking::Column::SpaceId.eq(space_id))
        .filter(booking::Column::Status.eq(BookingStatus::Approved));
    if let Some(dates) = dates {
        query = query.filter(booking::Column::Date.is_in(dates.iter().copied()));
    }
    let rows = query.all(conn).await?;
    Ok(rows.into_iter().map(|r| r.date).collect())
}

/// True iff every distinct requested date is currently bookable for the
/// space. An empty request is trivially available; callers reject empty
/// date lists where that is invalid.
pub async fn is_available<C: ConnectionTrait>(
    conn: &C,
    space_id: Uuid,
    dates: &[NaiveDate],
) -> Result<bool, ServiceError> {
    let requested: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    if requested.is_empty() {
        return Ok(true);
    }
    let offered = offered_dates(conn, space_id, Some(&requested)).await?;
    let approved = approved_dates(conn, space_id, Some(&requested)).await?;
    Ok(dates_covered(&requested, &offered, &approved))
}

/// Offer the given dates. Re-offering a date is a no-op thanks to the
/// (space_id, date) unique key, so publishing is idempotent.
pub async fn publish(
    db: &DatabaseConnection,
    space_id: Uuid,
    dates: &[NaiveDate],
) -> Result<(), ServiceError> {
    if dates.is_empty() {
        return Err(ServiceError::Validation("Please select dates!".into()));
    }
    models::space::Entity::find_by_id(space_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Space not found!".into()))?;

    let distinct: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let rows: Vec<space_availability::ActiveModel> = distinct
        .into_iter()
        .map(|date| space_availability::ActiveModel {
            id: Set(Uuid::new_v4()),
            space_id: Set(space_id),
            date: Set(date),
            created_at: Set(now),
        })
        .collect();

    let res = space_availability::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                space_availability::Column::SpaceId,
                space_availability::Column::Date,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(db)
        .await;
    match res {
        Ok(_) => Ok(()),
        // every row already offered; the publish is still satisfied
        Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Withdraw offered dates. Rows that were never offered are silently
/// skipped; dates held by an approved booking stay unavailable either way.
pub async fn withdraw(
    db: &DatabaseConnection,
    space_id: Uuid,
    dates: &[NaiveDate],
) -> Result<u64, ServiceError> {
    if dates.is_empty() {
        return Ok(0);
    }
    let res = space_availability::Entity::delete_many()
        .filter(space_availability::Column::SpaceId.eq(space_id))
        .filter(space_availability::Column::Date.is_in(dates.iter().copied()))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

/// Offered dates with their derived state, ordered, for the space view.
pub async fn availability_map<C: ConnectionTrait>(
    conn: &C,
    space_id: Uuid,
) -> Result<std::collections::BTreeMap<NaiveDate, bool>, ServiceError> {
    let offered = offered_dates(conn, space_id, None).await?;
    let approved = approved_dates(conn, space_id, None).await?;
    Ok(offered
        .into_iter()
        .map(|d| (d, !approved.contains(&d)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn set(days: &[u32]) -> BTreeSet<NaiveDate> {
        days.iter().map(|&day| d(day)).collect()
    }

    #[test]
    fn covered_when_every_date_is_offered_and_unbooked() {
        assert!(dates_covered(&set(&[1, 2]), &set(&[1, 2, 3]), &set(&[])));
    }

    #[test]
    fn not_covered_when_a_date_was_never_offered() {
        assert!(!dates_covered(&set(&[1, 4]), &set(&[1, 2, 3]), &set(&[])));
    }

    #[test]
    fn not_covered_when_a_date_is_already_approved() {
        assert!(!dates_covered(&set(&[1, 2]), &set(&[1, 2]), &set(&[2])));
    }

    #[test]
    fn empty_request_is_trivially_covered() {
        assert!(dates_covered(&set(&[]), &set(&[]), &set(&[])));
    }

    mod db {
        use super::*;
        use crate::test_support::get_db;
        use rust_decimal::Decimal;

        #[tokio::test]
        async fn publish_is_idempotent_per_date() -> Result<(), anyhow::Error> {
            if std::env::var("SKIP_DB_TESTS").is_ok() {
                return Ok(());
            }
            let db = get_db().await?;
            let owner = models::user::create(
                &db,
                &format!("owner_{}@example.com", Uuid::new_v4()),
                "Owner",
                "$argon2id$test",
            )
            .await?;
            let space =
                models::space::create(&db, owner.id, "Loft", Decimal::new(12000, 2)).await?;

            publish(&db, space.id, &[d(1), d(2)]).await?;
            // second publish of an overlapping range must not duplicate rows
            publish(&db, space.id, &[d(2), d(3)]).await?;

            let map = availability_map(&db, space.id).await?;
            assert_eq!(map.len(), 3);
            assert!(map.values().all(|open| *open));

            assert!(is_available(&db, space.id, &[d(1), d(2), d(3)]).await?);
            assert!(!is_available(&db, space.id, &[d(1), d(4)]).await?);

            let removed = withdraw(&db, space.id, &[d(3), d(9)]).await?;
            assert_eq!(removed, 1);
            assert!(!is_available(&db, space.id, &[d(3)]).await?);
            Ok(())
        }
    }
}
