use std::future::Future;

use deadpool_diesel::postgres::Pool;
use diesel::PgConnection;

use crate::errors::DatabaseError;

/// Runs blocking diesel closures on the pool, tagging every failure with the
/// operation it belongs to.
pub trait RebalPool {
    fn run_query<F, T, E>(
        &self,
        operation: impl Into<String> + Send,
        query: F,
    ) -> impl Future<Output = Result<T, DatabaseError>> + Send
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<DatabaseError> + Send + 'static;
}

fn logged(error: DatabaseError) -> DatabaseError {
    tracing::error!(operation = error.operation(), "{error}");
    error
}

impl RebalPool for Pool {
    async fn run_query<F, T, E>(
        &self,
        operation: impl Into<String> + Send,
        query: F,
    ) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<DatabaseError> + Send + 'static,
    {
        let operation = operation.into();

        let conn = self.get().await.map_err(|e| {
            logged(DatabaseError::PoolError {
                operation: operation.clone(),
                message: e.to_string(),
            })
        })?;

        let outcome = conn.interact(query).await.map_err(|e| {
            logged(DatabaseError::InteractionError {
                operation: operation.clone(),
                message: e.to_string(),
            })
        })?;

        outcome.map_err(|e| {
            let error: DatabaseError = e.into();
            logged(error.with_operation(&operation))
        })
    }
}
