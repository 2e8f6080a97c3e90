//! Create `space` table with FK to `user`.
//!
//! A space always has an owner; spaces are never deleted by the app.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Space::Table)
                    .if_not_exists()
                    .col(uuid(Space::Id).primary_key())
                    .col(uuid(Space::UserId).not_null())
                    .col(text(Space::Description).not_null())
                    .col(decimal_len(Space::PricePerNight, 10, 2).not_null())
                    .col(timestamp_with_time_zone(Space::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_space_user")
                            .from(Space::Table, Space::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Space::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Space { Table, Id, UserId, Description, PricePerNight, CreatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }
