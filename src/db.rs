use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};
use tracing::{info, warn};

use crate::{error::AppResult, password, store::Store};

const SQLITE_PRAGMAS: [&str; 3] =
    ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA cache_size=-64000"];

pub async fn connect_and_migrate(database_url: &str) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.sqlx_logging(false);
    // Every pooled connection to `:memory:` would otherwise see its own empty database.
    if database_url.contains(":memory:") {
        opts.max_connections(1).min_connections(1);
    }

    let db = Database::connect(opts).await?;

    if db.get_database_backend() == DbBackend::Sqlite {
        for pragma in SQLITE_PRAGMAS {
            db.execute(Statement::from_string(DbBackend::Sqlite, pragma.to_string())).await?;
        }
    }

    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Creates the `admin` profile when the database has no administrator yet.
pub async fn seed_admin(store: &Store, admin_password: &str, bcrypt_cost: u32) -> AppResult<()> {
    if store.has_admin().await? {
        return Ok(());
    }

    if store.find_profile_by_username("admin").await?.is_some() {
        warn!("no admin profile exists and the username `admin` is taken by a regular user");
        return Ok(());
    }

    let hash = password::hash(admin_password.to_string(), bcrypt_cost).await?;
    store.create_profile("admin", &hash, true).await?;
    info!("created default admin profile");
    Ok(())
}
