use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::entities::order::{self, Entity as OrderEntity};
use crate::errors::GatewayError;
use crate::services::checkout::{CheckoutService, RedirectPayload};
use crate::templates;
use crate::{ApiResponse, AppState};

/// Build the signed redirect request for an order.
///
/// The response carries the hosted payment page URL and the ordered,
/// signed field map; the caller renders it as an auto-submitting form
/// POST in the shopper's browser.
#[utoipa::path(
    post,
    path = "/api/v1/checkout/{order_number}/worldpay",
    params(
        ("order_number" = String, Path, description = "Order number entering payment")
    ),
    responses(
        (status = 200, description = "Signed redirect request", body = ApiResponse<RedirectPayload>),
        (status = 404, description = "Unknown order", body = crate::errors::ErrorResponse),
        (status = 422, description = "Missing billing address", body = crate::errors::ErrorResponse)
    ),
    tag = "Checkout"
)]
pub async fn build_worldpay_redirect(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<RedirectPayload>>, GatewayError> {
    let service = CheckoutService::new(state.db.clone(), state.settings.clone());
    let payload = service.build_redirect(&order_number).await?;
    Ok(Json(ApiResponse::success(payload)))
}

/// Shopper return page after a completed payment.
pub async fn shopper_return(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Html<String>, GatewayError> {
    let order = find_order(&state, &order_number).await?;
    Ok(Html(templates::shopper_return_page(
        &order.order_number,
        &state.settings.site_title,
    )))
}

/// Shopper return page after a cancelled payment.
pub async fn shopper_cancel(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Html<String>, GatewayError> {
    let order = find_order(&state, &order_number).await?;
    Ok(Html(templates::shopper_cancel_page(
        &order.order_number,
        &state.settings.site_title,
    )))
}

async fn find_order(state: &AppState, order_number: &str) -> Result<order::Model, GatewayError> {
    OrderEntity::find()
        .filter(order::Column::OrderNumber.eq(order_number))
        .one(&*state.db)
        .await?
        .ok_or_else(|| GatewayError::UnknownOrder(order_number.to_string()))
}
