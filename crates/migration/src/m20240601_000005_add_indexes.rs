use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Space: index on owner
        manager
            .create_index(
                Index::create()
                    .name("idx_space_user")
                    .table(Space::Table)
                    .col(Space::UserId)
                    .to_owned(),
            )
            .await?;

        // SpaceAvailability: composite unique (space_id, date).
        // Publishing the same date twice must hit this constraint, not
        // create a second row.
        manager
            .create_index(
                Index::create()
                    .name("uniq_space_availability_space_date")
                    .table(SpaceAvailability::Table)
                    .col(SpaceAvailability::SpaceId)
                    .col(SpaceAvailability::Date)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Booking: (space_id, date) drives the availability derivation
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_space_date")
                    .table(Booking::Table)
                    .col(Booking::SpaceId)
                    .col(Booking::Date)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_booking_user")
                    .table(Booking::Table)
                    .col(Booking::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_space_user").table(Space::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("uniq_space_availability_space_date")
                    .table(SpaceAvailability::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_booking_space_date")
                    .table(Booking::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_booking_user").table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Space { Table, UserId }

#[derive(DeriveIden)]
enum SpaceAvailability { Table, SpaceId, Date }

#[derive(DeriveIden)]
enum Booking { Table, SpaceId, UserId, Date }
