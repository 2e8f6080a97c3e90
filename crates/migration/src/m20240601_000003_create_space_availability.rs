//! Create `space_availability` table with FK to `space`.
//!
//! A row means the owner offers the space on that date; whether the date is
//! still bookable is derived against approved bookings. The composite
//! unique key on (space_id, date) is added with the other indexes.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SpaceAvailability::Table)
                    .if_not_exists()
                    .col(uuid(SpaceAvailability::Id).primary_key())
                    .col(uuid(SpaceAvailability::SpaceId).not_null())
                    .col(date(SpaceAvailability::Date).not_null())
                    .col(timestamp_with_time_zone(SpaceAvailability::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_space_availability_space")
                            .from(SpaceAvailability::Table, SpaceAvailability::SpaceId)
                            .to(Space::Table, Space::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SpaceAvailability::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SpaceAvailability { Table, Id, SpaceId, Date, CreatedAt }

#[derive(DeriveIden)]
enum Space { Table, Id }
