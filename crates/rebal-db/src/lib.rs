pub mod errors;
pub mod models;
pub mod pool;
pub mod schema;
pub mod stores;

use deadpool_diesel::Runtime;
use deadpool_diesel::postgres::{Manager, Pool};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use url::Url;

pub use errors::{DatabaseError, ErrorKind};
pub use pool::RebalPool;
pub use stores::{PgBaselineAllocations, PgFundFlowStore, PgPerformanceStore};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const MAX_POOL_SIZE: usize = 10;

/// Build a connection pool tagged with `app_name` as the postgres application name.
pub fn init_pool(app_name: &str, database_url: &str) -> Result<Pool, ErrorKind> {
    let mut url = Url::parse(database_url).map_err(|e| ErrorKind::Url(e.to_string()))?;
    if !url.query_pairs().any(|(key, _)| key == "application_name") {
        url.query_pairs_mut().append_pair("application_name", app_name);
    }

    let manager = Manager::new(url.as_str(), Runtime::Tokio1);
    Pool::builder(manager)
        .max_size(MAX_POOL_SIZE)
        .build()
        .map_err(|e| ErrorKind::Pool(e.to_string()))
}

pub async fn run_migrations(pool: &Pool) -> Result<(), ErrorKind> {
    let conn = pool
        .get()
        .await
        .map_err(|e| ErrorKind::Pool(e.to_string()))?;

    let applied = conn
        .interact(|conn| {
            conn.run_pending_migrations(MIGRATIONS)
                .map(|versions| versions.len())
                .map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| ErrorKind::Migration(e.to_string()))?
        .map_err(ErrorKind::Migration)?;

    tracing::info!("🗄️ Applied {applied} pending database migrations");
    Ok(())
}
