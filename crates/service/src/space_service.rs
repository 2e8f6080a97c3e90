use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use models::booking::{self, BookingStatus};
use models::{space, space_availability, user};

use crate::availability;
use crate::errors::ServiceError;

/// Catalog view of a space: owner by display name, never by id or email.
#[derive(Debug, Clone, Serialize)]
pub struct SpaceSummary {
    pub space_id: Uuid,
    pub owner_name: String,
    pub description: String,
    pub price_per_night: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpaceDetail {
    pub space_id: Uuid,
    pub owner_name: String,
    pub description: String,
    pub price_per_night: Decimal,
    pub availability: BTreeMap<NaiveDate, bool>,
}

fn summarize(space: space::Model, owner: Option<user::Model>) -> SpaceSummary {
    SpaceSummary {
        space_id: space.id,
        owner_name: owner.map(|u| u.name).unwrap_or_default(),
        description: space.description,
        price_per_night: space.price_per_night,
    }
}

/// Spaces that still have at least one open date, in no particular order.
fn spaces_with_open_date(
    offered: &[(Uuid, NaiveDate)],
    approved: &HashSet<(Uuid, NaiveDate)>,
) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (space_id, date) in offered {
        if !approved.contains(&(*space_id, *date)) && seen.insert(*space_id) {
            out.push(*space_id);
        }
    }
    out
}

/// Spaces whose open dates cover every requested date. A space qualifies
/// iff each distinct requested date is offered and not approved-booked —
/// the count-match rule expressed as set membership.
fn spaces_covering(
    requested: &BTreeSet<NaiveDate>,
    offered: &[(Uuid, NaiveDate)],
    approved: &HashSet<(Uuid, NaiveDate)>,
) -> Vec<Uuid> {
    let mut by_space: BTreeMap<Uuid, BTreeSet<NaiveDate>> = BTreeMap::new();
    for (space_id, date) in offered {
        by_space.entry(*space_id).or_default().insert(*date);
    }
    by_space
        .into_iter()
        .filter(|(space_id, open)| {
            requested
                .iter()
                .all(|d| open.contains(d) && !approved.contains(&(*space_id, *d)))
        })
        .map(|(space_id, _)| space_id)
        .collect()
}

#[instrument(skip(db))]
pub async fn create_space(
    db: &DatabaseConnection,
    owner_email: &str,
    description: &str,
    price_per_night: Decimal,
) -> Result<space::Model, ServiceError> {
    let owner = user::find_by_email(db, owner_email)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User doesn't exist!".into()))?;
    let created = space::create(db, owner.id, description, price_per_night).await?;
    tracing::info!(space_id = %created.id, owner_id = %owner.id, "space_created");
    Ok(created)
}

pub async fn get_space(db: &DatabaseConnection, id: Uuid) -> Result<space::Model, ServiceError> {
    space::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Space not found!".into()))
}

/// Owner account behind a space; 404s on an unknown space. The boundary
/// uses this for ownership checks and notification addressing.
pub async fn owner_of(db: &DatabaseConnection, space_id: Uuid) -> Result<user::Model, ServiceError> {
    let space = get_space(db, space_id).await?;
    user::Entity::find_by_id(space.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Db("space owner row is missing".into()))
}

/// Single-space view: summary plus the ordered date -> open map.
pub async fn get_space_detail(
    db: &DatabaseConnection,
    id: Uuid,
) -> Result<SpaceDetail, ServiceError> {
    let space = get_space(db, id).await?;
    let owner = user::Entity::find_by_id(space.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::Db("space owner row is missing".into()))?;
    let availability = availability::availability_map(db, id).await?;
    Ok(SpaceDetail {
        space_id: space.id,
        owner_name: owner.name,
        description: space.description,
        price_per_night: space.price_per_night,
        availability,
    })
}

/// All spaces; an empty catalog is a valid, empty result.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<SpaceSummary>, ServiceError> {
    let rows = space::Entity::find().find_also_related(user::Entity).all(db).await?;
    Ok(rows.into_iter().map(|(s, owner)| summarize(s, owner)).collect())
}

/// Catalog filter. `None` lists spaces with at least one open date; a date
/// list keeps only spaces whose open dates cover every requested date.
pub async fn list_available(
    db: &DatabaseConnection,
    dates: Option<&[NaiveDate]>,
) -> Result<Vec<SpaceSummary>, ServiceError> {
    let requested: Option<BTreeSet<NaiveDate>> = dates.map(|ds| ds.iter().copied().collect());

    let mut offered_query = space_availability::Entity::find();
    let mut approved_query =
        booking::Entity::find().filter(booking::Column::Status.eq(BookingStatus::Approved));
    if let Some(requested) = &requested {
        offered_query = offered_query
            .filter(space_availability::Column::Date.is_in(requested.iter().copied()));
        approved_query =
            approved_query.filter(booking::Column::Date.is_in(requested.iter().copied()));
    }

    let offered: Vec<(Uuid, NaiveDate)> = offered_query
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.space_id, r.date))
        .collect();
    let approved: HashSet<(Uuid, NaiveDate)> = approved_query
        .all(db)
        .await?
        .into_iter()
        .map(|r| (r.space_id, r.date))
        .collect();

    let ids = match &requested {
        Some(requested) if requested.is_empty() => Vec::new(),
        Some(requested) => spaces_covering(requested, &offered, &approved),
        None => spaces_with_open_date(&offered, &approved),
    };
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = space::Entity::find()
        .filter(space::Column::Id.is_in(ids))
        .find_also_related(user::Entity)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|(s, owner)| summarize(s, owner)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    #[test]
    fn open_date_listing_skips_fully_booked_spaces() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let offered = vec![(a, d(1)), (a, d(2)), (b, d(1))];
        let approved: HashSet<_> = [(b, d(1))].into_iter().collect();
        let ids = spaces_with_open_date(&offered, &approved);
        assert_eq!(ids, vec![a]);
    }

    #[test]
    fn covering_requires_every_requested_date() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let requested: BTreeSet<_> = [d(1), d(2)].into_iter().collect();
        let offered = vec![(a, d(1)), (a, d(2)), (b, d(1))];
        let approved = HashSet::new();
        let ids = spaces_covering(&requested, &offered, &approved);
        assert_eq!(ids, vec![a]);
    }

    #[test]
    fn covering_excludes_spaces_with_an_approved_date() {
        let a = Uuid::new_v4();
        let requested: BTreeSet<_> = [d(1), d(2)].into_iter().collect();
        let offered = vec![(a, d(1)), (a, d(2))];
        let approved: HashSet<_> = [(a, d(2))].into_iter().collect();
        assert!(spaces_covering(&requested, &offered, &approved).is_empty());
    }

    mod db {
        use super::*;
        use crate::test_support::get_db;

        #[tokio::test]
        async fn space_round_trips_by_id() -> Result<(), anyhow::Error> {
            if std::env::var("SKIP_DB_TESTS").is_ok() {
                return Ok(());
            }
            let db = get_db().await?;
            let email = format!("owner_{}@example.com", Uuid::new_v4());
            let owner = models::user::create(&db, &email, "Olive Owner", "$argon2id$test").await?;

            let created =
                create_space(&db, &email, "Garden studio", Decimal::new(7550, 2)).await?;
            let detail = get_space_detail(&db, created.id).await?;

            assert_eq!(detail.owner_name, owner.name);
            assert_eq!(detail.description, "Garden studio");
            assert_eq!(detail.price_per_night, Decimal::new(7550, 2));
            assert!(detail.availability.is_empty());

            let err = get_space(&db, Uuid::new_v4()).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)));
            Ok(())
        }

        #[tokio::test]
        async fn unknown_owner_cannot_create_space() -> Result<(), anyhow::Error> {
            if std::env::var("SKIP_DB_TESTS").is_ok() {
                return Ok(());
            }
            let db = get_db().await?;
            let err = create_space(&db, "nobody@example.com", "Attic", Decimal::ONE)
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)));
            Ok(())
        }
    }
}
