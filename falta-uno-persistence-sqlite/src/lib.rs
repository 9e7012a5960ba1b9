use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub mod matches;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS matches (id INTEGER PRIMARY KEY, status TEXT NOT NULL, scheduled_at INTEGER, required_players INTEGER NOT NULL)",
    "CREATE TABLE IF NOT EXISTS enrollments (id INTEGER PRIMARY KEY, match_id INTEGER NOT NULL REFERENCES matches(id), player_id TEXT NOT NULL, status TEXT NOT NULL)",
    "CREATE INDEX IF NOT EXISTS idx_matches_status_scheduled_at ON matches (status, scheduled_at)",
    "CREATE INDEX IF NOT EXISTS idx_enrollments_match_status ON enrollments (match_id, status)",
];

pub fn create_db_pool(db_path: &str) -> Pool<Sqlite> {
    let conn_options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(false);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_lazy_with(conn_options)
}

pub async fn create_schema(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
