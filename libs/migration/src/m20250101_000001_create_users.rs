use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(users_table()).await?;

        // Listing order: newest first, id as tiebreak
        manager
            .create_index(
                Index::create()
                    .name("idx_users_created_at")
                    .if_not_exists()
                    .table(Users::Table)
                    .col((Users::CreatedAt, IndexOrder::Desc))
                    .col(Users::Id)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

/// `users` with the role constraint declared inline, so re-running against an
/// existing table is a no-op.
fn users_table() -> TableCreateStatement {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(ColumnDef::new(Users::Id).text().not_null().primary_key())
        .col(
            ColumnDef::new(Users::Email)
                .string()
                .not_null()
                .unique_key(),
        )
        .col(string(Users::Name))
        .col(
            string(Users::Role).default("user").check((
                "users_role_check".to_string(),
                Expr::col(Users::Role).is_in(["admin", "user", "viewer"]),
            )),
        )
        .col(boolean(Users::Active).default(true))
        .col(
            timestamp_with_time_zone(Users::CreatedAt)
                .default(Expr::current_timestamp()),
        )
        .col(
            timestamp_with_time_zone(Users::UpdatedAt)
                .default(Expr::current_timestamp()),
        )
        .to_owned()
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Name,
    Role,
    Active,
    CreatedAt,
    UpdatedAt,
}
