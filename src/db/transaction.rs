/*!
 * Transaction helper.
 *
 * Runs a closure inside one database transaction: commit on `Ok`, rollback on
 * `Err`. The closure's own error type is returned unchanged so callers can match
 * on `ServiceError` variants raised mid-transaction.
 */

use metrics::counter;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use tracing::debug;

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// ```rust,ignore
/// let order = with_transaction(&db, move |txn| {
///     Box::pin(async move {
///         let order = lock_order(txn, tenant_id, order_id).await?;
///         insert_item(txn, &order, item).await?;
///         Ok(order)
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T, E>(db: &DatabaseConnection, f: F) -> Result<T, E>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, E>> + Send,
    T: Send,
    E: std::error::Error + From<DbErr> + Send,
{
    let result = db.transaction::<F, T, E>(f).await;

    match &result {
        Ok(_) => counter!("marine_service_db.transaction.committed", 1),
        Err(e) => {
            debug!(error = %e, "Transaction rolled back");
            counter!("marine_service_db.transaction.rolled_back", 1);
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => E::from(db_err),
        TransactionError::Transaction(err) => err,
    })
}
