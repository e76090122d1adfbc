use deadpool_postgres::Pool;

use crate::config::Config;
use crate::error::Result;
use crate::notify::Notifier;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The database connection pool.
    pub db: Pool,
    /// The application's configuration.
    pub config: Config,
    /// The fire-and-forget notification dispatcher.
    pub notifier: Notifier,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");

        let notifier = Notifier::spawn();
        tracing::info!("✅ Notification dispatcher started");

        Ok(AppState {
            db,
            config: config.clone(),
            notifier,
        })
    }
}
