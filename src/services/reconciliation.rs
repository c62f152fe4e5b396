//! Idempotent payment-state transition driven by a validated Payment
//! Response.
//!
//! Per order the state machine is `NoPayment -> Authorized ->
//! CaptureCompleted` on approval (one notification records both steps),
//! `NoPayment -> Cancelled` on shopper cancellation (no record), and a
//! logged no-op for refused or unknown outcomes. The persistence store
//! is the serialization point: existing payment state is re-read before
//! writing, and the unique index on (order, remote transaction) backs
//! that check for concurrent deliveries.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::GatewaySettings;
use crate::entities::order::{self, Entity as OrderEntity};
use crate::entities::payment::{self, Entity as PaymentEntity, PaymentState};
use crate::errors::GatewayError;
use crate::notification::{ParsedNotification, TransactionOutcome};
use crate::services::ORDER_DATA_KEY;
use crate::templates;

/// Body rendered back on the provider's notification channel. Always
/// served with HTTP 200 once the payload has been parsed; a non-200
/// status would trigger provider-side re-delivery.
#[derive(Debug)]
pub struct NotifyResponse {
    pub html: String,
}

impl NotifyResponse {
    fn empty() -> Self {
        Self {
            html: String::new(),
        }
    }
}

/// Applies validated notifications to order/payment records.
#[derive(Clone)]
pub struct ReconciliationService {
    db: Arc<DatabaseConnection>,
    settings: Arc<GatewaySettings>,
}

impl ReconciliationService {
    pub fn new(db: Arc<DatabaseConnection>, settings: Arc<GatewaySettings>) -> Self {
        Self { db, settings }
    }

    #[instrument(skip(self, note), fields(order_reference = %note.order_reference, transaction_id = %note.transaction_id))]
    pub async fn process(&self, note: &ParsedNotification) -> Result<NotifyResponse, GatewayError> {
        let Some(order) = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(note.order_reference.as_str()))
            .one(&*self.db)
            .await?
        else {
            warn!(
                order_reference = %note.order_reference,
                transaction_id = %note.transaction_id,
                "payment response for unknown order"
            );
            return Ok(NotifyResponse::empty());
        };

        self.check_callback_consistency(&order)?;

        match note.outcome {
            TransactionOutcome::Approved | TransactionOutcome::Captured => {
                self.record_approval(&order, note).await
            }
            TransactionOutcome::Cancelled => {
                info!(
                    outcome = note.outcome.as_str(),
                    order_id = %order.id,
                    transaction_id = %note.transaction_id,
                    "cancel payment response received"
                );
                let cancel_url = self.settings.cancel_url(&order.order_number)?;
                Ok(NotifyResponse {
                    html: templates::cancel_page(
                        &order.order_number,
                        &note.transaction_id,
                        &cancel_url,
                    ),
                })
            }
            TransactionOutcome::Refused | TransactionOutcome::Unknown => {
                warn!(
                    outcome = note.outcome.as_str(),
                    order_id = %order.id,
                    transaction_id = %note.transaction_id,
                    raw_status = %note.raw_status,
                    "payment response reported a failed transaction"
                );
                Ok(NotifyResponse::empty())
            }
        }
    }

    /// Creates the payment record for an approved transaction. The
    /// authorized record and the capture flip are one transactional
    /// unit; a failure of the second write rolls back the first.
    async fn record_approval(
        &self,
        order: &order::Model,
        note: &ParsedNotification,
    ) -> Result<NotifyResponse, GatewayError> {
        let return_url = self.settings.return_url(&order.order_number)?;
        let page = templates::success_page(&order.order_number, &note.transaction_id, &return_url);

        if let Some(existing) = PaymentEntity::find()
            .filter(payment::Column::OrderId.eq(order.id))
            .filter(payment::Column::TransactionId.eq(note.transaction_id.as_str()))
            .one(&*self.db)
            .await?
        {
            info!(
                order_id = %order.id,
                payment_id = %existing.id,
                transaction_id = %note.transaction_id,
                "payment response re-delivered, already recorded"
            );
            return Ok(NotifyResponse { html: page });
        }

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let created = payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            state: Set(PaymentState::Authorization.as_str().to_string()),
            amount: Set(order.total_amount),
            currency: Set(order.currency.clone()),
            remote_id: Set(note.order_reference.clone()),
            transaction_id: Set(note.transaction_id.clone()),
            remote_state: Set(note.raw_status.clone()),
            test: Set(self.settings.is_test()),
            authorized_at: Set(now),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let payment_id = created.id;
        let mut captured = created.into_active_model();
        captured.state = Set(PaymentState::CaptureCompleted.as_str().to_string());
        captured.update(&txn).await?;

        txn.commit().await?;

        info!(
            outcome = note.outcome.as_str(),
            order_id = %order.id,
            payment_id = %payment_id,
            transaction_id = %note.transaction_id,
            "payment response recorded"
        );

        Ok(NotifyResponse { html: page })
    }

    /// Cross-checks the callback URL stashed at build time against the
    /// one this deployment derives now. A mismatch means the host, port
    /// or route changed between redirect and notification; it is logged
    /// as an anomaly but does not block reconciliation.
    fn check_callback_consistency(&self, order: &order::Model) -> Result<(), GatewayError> {
        let expected = self.settings.notify_url()?;
        let stored = order
            .data
            .get(ORDER_DATA_KEY)
            .and_then(|v| v.get("callback_url"))
            .and_then(|v| v.as_str());

        if let Some(stored) = stored {
            if stored != expected {
                warn!(
                    order_id = %order.id,
                    stored_callback = %stored,
                    expected_callback = %expected,
                    "callback URL changed between redirect and notification"
                );
            }
        }
        Ok(())
    }
}
