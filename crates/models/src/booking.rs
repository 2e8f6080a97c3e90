use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::ModelError;
use crate::{space, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "booking")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub space_id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub status: BookingStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum BookingStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    #[sea_orm(string_value = "DENIED")]
    Denied,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Approved => "APPROVED",
            BookingStatus::Denied => "DENIED",
        }
    }

    /// PENDING is the only state with an outgoing edge.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BookingStatus::Pending)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Model {
    /// One-way transition rule: a booking may leave PENDING exactly once.
    pub fn ensure_pending(&self) -> Result<(), ModelError> {
        if self.status.is_terminal() {
            return Err(ModelError::InvalidState(format!(
                "Unable to change the status from {}",
                self.status
            )));
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Space,
    Requester,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Space => Entity::belongs_to(space::Entity)
                .from(Column::SpaceId)
                .to(space::Column::Id)
                .into(),
            Relation::Requester => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<space::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Space.def()
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requester.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
