use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::debug;

use crate::{
    entities::{profile, watchlist},
    error::{AppError, AppResult},
};

/// Profile and watchlist persistence.
#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_profile(&self, id: i32) -> AppResult<Option<profile::Model>> {
        Ok(profile::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn find_profile_by_username(
        &self,
        username: &str,
    ) -> AppResult<Option<profile::Model>> {
        let found = profile::Entity::find()
            .filter(profile::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(found)
    }

    pub async fn list_profiles(&self) -> AppResult<Vec<profile::Model>> {
        let profiles =
            profile::Entity::find().order_by_asc(profile::Column::Id).all(&self.db).await?;
        Ok(profiles)
    }

    pub async fn has_admin(&self) -> AppResult<bool> {
        let admin = profile::Entity::find()
            .filter(profile::Column::IsAdmin.eq(true))
            .one(&self.db)
            .await?;
        Ok(admin.is_some())
    }

    pub async fn create_profile(
        &self,
        username: &str,
        password_hash: &str,
        is_admin: bool,
    ) -> AppResult<profile::Model> {
        let model = profile::ActiveModel {
            id: Default::default(),
            username: Set(username.to_string()),
            password: Set(password_hash.to_string()),
            is_admin: Set(is_admin),
            created_at: Set(now_sec()),
        };
        let created = model.insert(&self.db).await?;
        debug!(user_id = created.id, username = %created.username, "created profile");
        Ok(created)
    }

    /// Returns `false` when no profile has this id.
    pub async fn set_password(&self, id: i32, password_hash: &str) -> AppResult<bool> {
        let res = profile::Entity::update_many()
            .col_expr(profile::Column::Password, Expr::value(password_hash))
            .filter(profile::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Renames a profile and re-keys its watchlist rows in one transaction.
    pub async fn rename_profile(&self, id: i32, new_username: &str) -> AppResult<profile::Model> {
        let txn = self.db.begin().await?;

        let Some(existing) = profile::Entity::find_by_id(id).one(&txn).await? else {
            return Err(AppError::NotFound("User not found".to_string()));
        };
        if existing.username == new_username {
            return Ok(existing);
        }

        let taken = profile::Entity::find()
            .filter(profile::Column::Username.eq(new_username))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(AppError::BadRequest("Username already exists".to_string()));
        }

        let old_username = existing.username.clone();
        let mut active: profile::ActiveModel = existing.into();
        active.username = Set(new_username.to_string());
        let renamed = active.update(&txn).await?;

        watchlist::Entity::update_many()
            .col_expr(watchlist::Column::Username, Expr::value(new_username))
            .filter(watchlist::Column::Username.eq(old_username.as_str()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        debug!(user_id = id, from = %old_username, to = %new_username, "renamed profile");
        Ok(renamed)
    }

    /// Deletes a profile together with its watchlist rows.
    pub async fn delete_profile(&self, id: i32) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        let Some(existing) = profile::Entity::find_by_id(id).one(&txn).await? else {
            return Ok(false);
        };

        watchlist::Entity::delete_many()
            .filter(watchlist::Column::Username.eq(existing.username.as_str()))
            .exec(&txn)
            .await?;
        profile::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        debug!(user_id = id, username = %existing.username, "deleted profile");
        Ok(true)
    }

    pub async fn watchlist(&self, username: &str) -> AppResult<Vec<watchlist::Model>> {
        let entries = watchlist::Entity::find()
            .filter(watchlist::Column::Username.eq(username))
            .order_by_asc(watchlist::Column::CreatedAt)
            .order_by_asc(watchlist::Column::Id)
            .all(&self.db)
            .await?;
        Ok(entries)
    }

    pub async fn watchlist_ids(&self, username: &str) -> AppResult<HashSet<String>> {
        let ids: Vec<String> = watchlist::Entity::find()
            .select_only()
            .column(watchlist::Column::ShowId)
            .filter(watchlist::Column::Username.eq(username))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(ids.into_iter().collect())
    }

    pub async fn watchlist_entry(
        &self,
        username: &str,
        show_id: &str,
    ) -> AppResult<Option<watchlist::Model>> {
        let entry = watchlist::Entity::find()
            .filter(watchlist::Column::Username.eq(username))
            .filter(watchlist::Column::ShowId.eq(show_id))
            .one(&self.db)
            .await?;
        Ok(entry)
    }

    /// Returns `false` when the entry already existed.
    pub async fn add_to_watchlist(&self, username: &str, show_id: &str) -> AppResult<bool> {
        let model = watchlist::ActiveModel {
            id: Default::default(),
            username: Set(username.to_string()),
            show_id: Set(show_id.to_string()),
            watched: Set(false),
            created_at: Set(now_sec()),
        };

        let inserted = watchlist::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([watchlist::Column::Username, watchlist::Column::ShowId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(inserted > 0)
    }

    pub async fn remove_from_watchlist(&self, username: &str, show_id: &str) -> AppResult<u64> {
        let res = watchlist::Entity::delete_many()
            .filter(watchlist::Column::Username.eq(username))
            .filter(watchlist::Column::ShowId.eq(show_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }

    pub async fn set_watched(&self, username: &str, show_id: &str, watched: bool) -> AppResult<u64> {
        let res = watchlist::Entity::update_many()
            .col_expr(watchlist::Column::Watched, Expr::value(watched))
            .filter(watchlist::Column::Username.eq(username))
            .filter(watchlist::Column::ShowId.eq(show_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}
