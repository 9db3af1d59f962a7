// Schema migrations for the SQLite key-value backend
mod sqlite;

pub use sqlite::{run_migrations as run_sqlite_migrations, SCHEMA_VERSION};
