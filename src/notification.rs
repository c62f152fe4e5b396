//! Inbound Payment Response parsing and classification.
//!
//! The provider reports the transaction outcome with a server-to-server
//! form POST. Validation happens before any state mutation: structurally
//! malformed payloads are rejected (the provider retries, which is safe
//! because nothing was recorded), and the installation password is
//! checked before the payload is trusted at all.

use axum::http::Method;
use std::collections::BTreeMap;

use crate::config::GatewaySettings;
use crate::errors::GatewayError;

/// Field names consumed from the Payment Response.
const FIELD_TRANSACTION_ID: &str = "transId";
const FIELD_ORDER_REFERENCE: &str = "MC_orderId";
const FIELD_TRANS_STATUS: &str = "transStatus";
const FIELD_CALLBACK_PW: &str = "callbackPW";

/// Normalized transaction outcome derived from `transStatus`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransactionOutcome {
    Approved,
    Cancelled,
    Refused,
    Captured,
    Unknown,
}

impl TransactionOutcome {
    /// Maps the provider's status code. `Y` is an authorised (and, in
    /// this protocol variant, completed) transaction; `C` is shopper
    /// cancellation; `N` is a refusal. Anything else is unknown and
    /// treated as an anomaly by reconciliation.
    pub fn from_trans_status(status: &str) -> Self {
        match status {
            "Y" => TransactionOutcome::Approved,
            "C" => TransactionOutcome::Cancelled,
            "N" => TransactionOutcome::Refused,
            "CAPTURED" => TransactionOutcome::Captured,
            _ => TransactionOutcome::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionOutcome::Approved => "approved",
            TransactionOutcome::Cancelled => "cancelled",
            TransactionOutcome::Refused => "refused",
            TransactionOutcome::Captured => "captured",
            TransactionOutcome::Unknown => "unknown",
        }
    }
}

/// A structurally valid Payment Response.
#[derive(Clone, Debug)]
pub struct ParsedNotification {
    pub transaction_id: String,
    pub order_reference: String,
    pub outcome: TransactionOutcome,
    /// Raw `transStatus` value, persisted as the remote state.
    pub raw_status: String,
    callback_password: Option<String>,
    fields: BTreeMap<String, String>,
}

impl ParsedNotification {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Raw payload for audit logging, with credential fields redacted.
    pub fn redacted_body(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| {
                if k == FIELD_CALLBACK_PW {
                    format!("{}=[redacted]", k)
                } else {
                    format!("{}={}", k, v)
                }
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Verifies the notification against the configured installation
    /// password before the payload is trusted. The original module never
    /// enforced this; here it is mandatory whenever a password is set.
    pub fn verify(&self, settings: &GatewaySettings) -> Result<(), GatewayError> {
        if !settings.use_password {
            return Ok(());
        }
        let expected = settings.password.as_deref().unwrap_or("");
        match self.callback_password.as_deref() {
            Some(given) if !expected.is_empty() && constant_time_eq(given, expected) => Ok(()),
            _ => Err(GatewayError::BadCredentials),
        }
    }
}

/// Parses and validates an inbound notification call.
///
/// Fails with [`GatewayError::EmptyBody`] when the call is not a POST or
/// carries no content, and with
/// [`GatewayError::MissingTransactionReference`] when the transaction
/// identifier or the order reference is absent or empty.
pub fn validate(method: &Method, raw_body: &[u8]) -> Result<ParsedNotification, GatewayError> {
    if method != Method::POST || raw_body.is_empty() {
        return Err(GatewayError::EmptyBody);
    }

    let fields: BTreeMap<String, String> = url::form_urlencoded::parse(raw_body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let transaction_id = fields
        .get(FIELD_TRANSACTION_ID)
        .map(String::as_str)
        .unwrap_or("");
    let order_reference = fields
        .get(FIELD_ORDER_REFERENCE)
        .map(String::as_str)
        .unwrap_or("");
    if transaction_id.is_empty() || order_reference.is_empty() {
        return Err(GatewayError::MissingTransactionReference);
    }

    let raw_status = fields
        .get(FIELD_TRANS_STATUS)
        .cloned()
        .unwrap_or_default();

    Ok(ParsedNotification {
        transaction_id: transaction_id.to_string(),
        order_reference: order_reference.to_string(),
        outcome: TransactionOutcome::from_trans_status(&raw_status),
        raw_status,
        callback_password: fields.get(FIELD_CALLBACK_PW).cloned(),
        fields,
    })
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
