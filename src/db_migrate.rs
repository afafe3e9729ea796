//! Creates the schema using the same environment as the server.

use color_eyre::eyre::Result;
use dotenv::dotenv;
use lessonbook_api::config::ApiConfig;
use lessonbook_db::schema::initialize_database;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    // Fails without DATABASE_URL.
    let config = ApiConfig::from_env()?;

    println!("Connecting to database...");
    let db_pool = lessonbook_db::create_pool(&config.database_url, 1).await?;

    println!("Initializing database schema...");
    initialize_database(&db_pool).await?;
    println!("Database schema initialized successfully.");

    Ok(())
}
