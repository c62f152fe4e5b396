use axum::{
    extract::{RawForm, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::errors::GatewayError;
use crate::notification;
use crate::services::reconciliation::ReconciliationService;
use crate::AppState;

/// Payment Response endpoint the provider posts transaction outcomes to.
///
/// Registered for any method so that non-POST probes reach the validator
/// and are rejected as empty, matching the notification contract. Once a
/// payload parses and its credentials check out, the response is always
/// HTTP 200 with a small `text/html` body, even for refused or unknown
/// outcomes; anything else would trigger provider-side re-delivery.
pub async fn worldpay_notify(
    State(state): State<AppState>,
    method: Method,
    RawForm(body): RawForm,
) -> Result<Response, GatewayError> {
    let note = notification::validate(&method, &body)?;
    note.verify(&state.settings)?;

    if state.settings.debug_payloads {
        debug!(payload = %note.redacted_body(), "payment response payload");
    }

    let service = ReconciliationService::new(state.db.clone(), state.settings.clone());
    let page = service.process(&note).await?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        page.html,
    )
        .into_response())
}
