//! Create `booking` table with FKs to `space` and `user`.
//!
//! One row per requested day; status is the workflow state string.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::SpaceId).not_null())
                    .col(uuid(Booking::UserId).not_null())
                    .col(date(Booking::Date).not_null())
                    .col(string_len(Booking::Status, 16).not_null())
                    .col(timestamp_with_time_zone(Booking::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Booking::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_space")
                            .from(Booking::Table, Booking::SpaceId)
                            .to(Space::Table, Space::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_user")
                            .from(Booking::Table, Booking::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Booking::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Booking { Table, Id, SpaceId, UserId, Date, Status, CreatedAt, UpdatedAt }

#[derive(DeriveIden)]
enum Space { Table, Id }

#[derive(DeriveIden)]
enum User { Table, Id }
