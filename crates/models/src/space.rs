use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{booking, space_availability, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "space")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub price_per_night: Decimal,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Owner,
    Availability,
    Booking,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Owner => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
            Relation::Availability => Entity::has_many(space_availability::Entity).into(),
            Relation::Booking => Entity::has_many(booking::Entity).into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<space_availability::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Availability.def()
    }
}

impl Related<booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_description(description: &str) -> Result<(), ModelError> {
    if description.trim().is_empty() {
        return Err(ModelError::Validation("Description cannot be empty!".into()));
    }
    Ok(())
}

pub fn validate_price(price: Decimal) -> Result<(), ModelError> {
    if price <= Decimal::ZERO {
        return Err(ModelError::Validation("Price has to be a positive number!".into()));
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    user_id: Uuid,
    description: &str,
    price_per_night: Decimal,
) -> Result<Model, ModelError> {
    validate_description(description)?;
    validate_price(price_per_night)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        description: Set(description.to_string()),
        price_per_night: Set(price_per_night),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_must_be_positive() {
        assert!(validate_price(Decimal::new(4999, 2)).is_ok());
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(Decimal::new(-100, 2)).is_err());
    }

    #[test]
    fn description_must_not_be_blank() {
        assert!(validate_description("Cosy attic near the river").is_ok());
        assert!(validate_description("  ").is_err());
    }
}
