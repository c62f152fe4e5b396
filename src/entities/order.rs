use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order record. Owned by the order-management side of the system; the
/// gateway reads totals and addresses and writes only the `data` bag.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Merchant-generated correlation token, sent as `cartId`.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Human-facing order identifier, sent as `MC_orderId`.
    #[sea_orm(unique)]
    pub order_number: String,

    pub email: String,
    pub status: String,

    // sqlite DDL caps numeric precision at 16
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_amount: Decimal,
    pub currency: String,

    /// Billing address snapshot (JSON projection of the profile).
    pub billing_address: Option<Json>,

    /// Shipping address snapshot, present only when the order has a
    /// shipment with a shipping profile.
    pub shipping_address: Option<Json>,

    /// Extension data bag. The gateway stashes the assembled redirect
    /// request and callback URL here between redirect and notification.
    pub data: Json,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
