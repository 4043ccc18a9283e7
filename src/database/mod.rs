// Copyright 2025 Remi Bernotavicius

use diesel::connection::SimpleConnection as _;
use diesel::prelude::Connection as _;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::error::Error;
use std::path::Path;

pub mod models;
pub mod queries;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;
pub type Pool = diesel::r2d2::Pool<ConnectionManager<Connection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

// Cascading deletes depend on foreign_keys, and sqlite turns it off anew on
// every connection.
const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<Connection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(CONNECTION_PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_connection(
    path: impl AsRef<Path>,
) -> Result<Connection, Box<dyn Error + Send + Sync + 'static>> {
    let mut connection = Connection::establish(&path.as_ref().to_string_lossy())?;
    connection.batch_execute(CONNECTION_PRAGMAS)?;
    connection.run_pending_migrations(MIGRATIONS)?;
    Ok(connection)
}

pub fn build_pool(path: impl AsRef<Path>) -> Result<Pool, Box<dyn Error + Send + Sync + 'static>> {
    // Run pending migrations on a dedicated connection before handing out
    // pooled ones.
    establish_connection(path.as_ref())?;

    let manager = ConnectionManager::new(path.as_ref().to_string_lossy());
    let pool = diesel::r2d2::Pool::builder()
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)?;
    Ok(pool)
}

/// A single-connection in-memory pool. Every handle sees the same database,
/// which is what tests want; separate `:memory:` connections would not.
#[cfg(test)]
pub fn test_pool() -> Pool {
    let manager = ConnectionManager::new(":memory:");
    let pool = diesel::r2d2::Pool::builder()
        .max_size(1)
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)
        .unwrap();
    let mut conn = pool.get().unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    drop(conn);
    pool
}

#[test]
fn migrations() {
    let mut conn = Connection::establish(":memory:").unwrap();
    let applied = conn.run_pending_migrations(MIGRATIONS).unwrap();
    assert!(!applied.is_empty());

    conn.revert_all_migrations(MIGRATIONS).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
}
