use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::address::AddressSnapshot;
use crate::config::GatewaySettings;
use crate::entities::order::{self, Entity as OrderEntity};
use crate::errors::GatewayError;
use crate::redirect;
use crate::services::ORDER_DATA_KEY;

/// One form field of the redirect POST, in submission order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Everything the form-rendering collaborator needs to perform the
/// browser redirect to the hosted payment page.
#[derive(Debug, Serialize, ToSchema)]
pub struct RedirectPayload {
    /// Hosted payment page URL for the configured mode
    pub endpoint_url: String,
    /// Always POST for the classic redirect variant
    pub method: String,
    /// Signed field map, in submission order
    pub fields: Vec<FormField>,
}

/// Builds signed redirect requests for orders entering payment.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    settings: Arc<GatewaySettings>,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, settings: Arc<GatewaySettings>) -> Self {
        Self { db, settings }
    }

    /// Assembles the signed field map for an order and stashes it, with
    /// the callback URL, in the order's extension data bag so the
    /// notification handler can later verify against the same URL.
    #[instrument(skip(self))]
    pub async fn build_redirect(&self, order_number: &str) -> Result<RedirectPayload, GatewayError> {
        let order = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(&*self.db)
            .await?
            .ok_or_else(|| GatewayError::UnknownOrder(order_number.to_string()))?;

        let billing = order
            .billing_address
            .as_ref()
            .and_then(AddressSnapshot::from_value);
        let shipping = order
            .shipping_address
            .as_ref()
            .and_then(AddressSnapshot::from_value);

        let request =
            redirect::build(&order, billing.as_ref(), shipping.as_ref(), &self.settings)?;
        let notify_url = self.settings.notify_url()?;

        let mut data = order.data.clone();
        if !data.is_object() {
            data = json!({});
        }
        data[ORDER_DATA_KEY] = json!({
            "request": request.to_json(),
            "callback_url": notify_url,
        });

        let order_id = order.id;
        let mut active = order.into_active_model();
        active.data = Set(data);
        active.updated_at = Set(Some(Utc::now()));
        active.update(&*self.db).await?;

        info!(%order_id, order_number, "redirect request assembled");

        Ok(RedirectPayload {
            endpoint_url: self.settings.payment_page_url().to_string(),
            method: "POST".to_string(),
            fields: request
                .fields()
                .iter()
                .map(|(name, value)| FormField {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
        })
    }
}
