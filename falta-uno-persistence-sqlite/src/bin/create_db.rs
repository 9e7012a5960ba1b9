use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let db_path = std::env::var("FALTA_UNO_DB").expect("FALTA_UNO_DB env var not set");
    let parent = std::path::Path::new(&db_path).parent();
    if let Some(parent) = parent.filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory for DB");
        println!("Created parent directory for DB at {}", parent.display());
    }

    let connect_options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options)
        .await
        .expect("Failed to create pool");

    falta_uno_persistence_sqlite::create_schema(&pool)
        .await
        .expect("Failed to create schema");

    println!("Created match schema in {}", db_path);
}
