use rusqlite::Connection;
use tracing::info;

/// Schema version recorded in `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    let current: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| format!("Failed to read schema version: {}", e))?;

    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    info!("Running SQLite migrations from version {}", current);

    create_kv_store_table(conn)?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(|e| format!("Failed to record schema version: {}", e))?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the key-value table
fn create_kv_store_table(conn: &Connection) -> Result<(), String> {
    info!("Creating kv_store table if not exists");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    ).map_err(|e| e.to_string())?;

    Ok(())
}
