use sea_orm::sea_query::Index;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::time::Duration;
use tracing::info;

use crate::config::GatewaySettings;
use crate::entities::{order, payment};
use crate::errors::GatewayError;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Establishes a connection pool to the database.
pub async fn establish_connection(settings: &GatewaySettings) -> Result<DbPool, GatewayError> {
    let mut options = ConnectOptions::new(settings.database_url.clone());
    options
        .max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!("database connection established");
    Ok(db)
}

/// Creates the order and payment tables plus the uniqueness index that
/// backs notification idempotency. Intended for sqlite development and
/// test databases; production schemas are managed externally.
pub async fn bootstrap_schema(db: &DatabaseConnection) -> Result<(), GatewayError> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut orders = schema.create_table_from_entity(order::Entity);
    orders.if_not_exists();
    db.execute(backend.build(&orders)).await?;

    let mut payments = schema.create_table_from_entity(payment::Entity);
    payments.if_not_exists();
    db.execute(backend.build(&payments)).await?;

    // The store is the authority for payment uniqueness: one record per
    // (order, remote transaction), re-delivery must not create a second.
    let mut unique_transaction = Index::create();
    unique_transaction
        .name("idx_payments_order_transaction")
        .table(payment::Entity)
        .col(payment::Column::OrderId)
        .col(payment::Column::TransactionId)
        .unique()
        .if_not_exists();
    db.execute(backend.build(&unique_transaction)).await?;

    Ok(())
}

/// Verifies database liveness for health checks.
pub async fn ping(db: &DatabaseConnection) -> bool {
    db.ping().await.is_ok()
}
