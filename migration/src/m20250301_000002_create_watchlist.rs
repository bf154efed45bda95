use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Watchlist::Table)
                    .if_not_exists()
                    .col(pk_auto(Watchlist::Id))
                    .col(string(Watchlist::Username))
                    .col(string(Watchlist::ShowId))
                    .col(boolean(Watchlist::Watched).default(false))
                    .col(big_integer(Watchlist::CreatedAt))
                    .to_owned(),
            )
            .await?;

        // One row per (username, show_id); concurrent adds collapse into one insert.
        manager
            .create_index(
                Index::create()
                    .name("idx_watchlist_username_show_id")
                    .table(Watchlist::Table)
                    .col(Watchlist::Username)
                    .col(Watchlist::ShowId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Watchlist::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Watchlist {
    Table,
    Id,
    Username,
    ShowId,
    Watched,
    CreatedAt,
}
