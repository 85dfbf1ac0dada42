use log::*;
use shopify_session_engine::SqliteDatabase;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

pub fn random_db_url() -> String {
    format!("sqlite://../data/test_sessions_{}.db", rand::random::<u64>())
}

/// Creates a fresh database at `url`, runs the migrations, and returns a connected backend.
pub async fn prepare_test_db(url: &str) -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    if let Err(e) = Sqlite::drop_database(url).await {
        warn!("Error dropping database {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to the database");
    migrate!("./migrations").run(db.pool()).await.expect("Error running DB migrations");
    db
}
