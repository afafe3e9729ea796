//! Creates an administrator account from `ADMIN_USERNAME` and `ADMIN_PASSWORD`.
//! Does nothing if the username is already taken.

use color_eyre::eyre::{eyre, Result, WrapErr};
use dotenv::dotenv;
use lessonbook_api::middleware::auth::hash_password;
use lessonbook_db::{create_pool, repositories::account, schema::initialize_database};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let database_url =
        std::env::var("DATABASE_URL").wrap_err("DATABASE_URL environment variable must be set")?;
    let username = std::env::var("ADMIN_USERNAME")
        .wrap_err("ADMIN_USERNAME environment variable must be set")?;
    let password = std::env::var("ADMIN_PASSWORD")
        .wrap_err("ADMIN_PASSWORD environment variable must be set")?;

    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(eyre!("ADMIN_USERNAME and ADMIN_PASSWORD must not be empty"));
    }

    let db_pool = create_pool(&database_url, 1).await?;
    initialize_database(&db_pool).await?;

    if account::get_account_by_username(&db_pool, username)
        .await?
        .is_some()
    {
        warn!("Account {} already exists, nothing to do", username);
        return Ok(());
    }

    let password_hash = hash_password(&password)?;
    match account::create_account(&db_pool, username, &password_hash, true).await? {
        Some(admin) => info!("Administrator {} created with id {}", admin.username, admin.id),
        None => warn!("Account {} already exists, nothing to do", username),
    }

    Ok(())
}
