use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment record created by notification reconciliation.
///
/// At most one record may exist per (order, transaction); the store
/// carries a unique index on that pair and the reconciliation service
/// re-reads existing state before inserting.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub order_id: Uuid,

    /// Payment lifecycle state, see [`PaymentState`].
    pub state: String,

    // sqlite DDL caps numeric precision at 16
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub amount: Decimal,
    pub currency: String,

    /// Remote order reference echoed by the provider (`MC_orderId`).
    pub remote_id: String,

    /// Provider transaction reference (`transId`); the idempotency key
    /// together with `order_id`.
    pub transaction_id: String,

    /// Raw provider outcome code (`transStatus`).
    pub remote_state: String,

    /// Whether the transaction ran against the provider's test environment.
    pub test: bool,

    pub authorized_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id",
        on_delete = "Cascade"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// States a payment record moves through. Approval records both steps in
/// one notification: the record is created authorized and flipped to
/// capture-completed inside the same transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentState {
    Authorization,
    CaptureCompleted,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Authorization => "authorization",
            PaymentState::CaptureCompleted => "capture_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_state_round_trips_as_str() {
        assert_eq!(PaymentState::Authorization.as_str(), "authorization");
        assert_eq!(PaymentState::CaptureCompleted.as_str(), "capture_completed");
    }
}
