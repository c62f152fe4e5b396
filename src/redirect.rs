//! Outbound redirect-request construction.
//!
//! Assembles the complete, signed field map the browser posts to the
//! provider's hosted payment page. The map is built in one pass into an
//! immutable value; the signature is computed last, over exactly the
//! fields named by the `signatureFields` descriptor.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::address::AddressSnapshot;
use crate::config::GatewaySettings;
use crate::entities::order;
use crate::errors::GatewayError;
use crate::signature::{compute_signature, signature_fields_descriptor, SIGNATURE_FIELDS};

/// Marker value Worldpay expects on test transactions.
const TEST_MODE_VALUE: &str = "100";

/// Ordered field map sent to the provider. Transient and request-scoped;
/// it has no identity beyond the redirect being built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RedirectRequest {
    fields: Vec<(String, String)>,
}

impl RedirectRequest {
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// JSON object form, used when stashing the request on the order.
    /// Field order is not preserved here; the ordered pair list is the
    /// authoritative representation.
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

/// Internal single-pass assembler. Pushes skip empty values so optional
/// fields are omitted entirely rather than sent blank.
struct FieldList {
    fields: Vec<(String, String)>,
}

impl FieldList {
    fn new() -> Self {
        Self { fields: Vec::new() }
    }

    fn push(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if !value.is_empty() {
            self.fields.push((name.to_string(), value));
        }
    }

    fn push_opt(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push(name, value);
        }
    }

    fn value_of(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Formats an order total the way the provider expects it.
fn format_amount(amount: Decimal) -> String {
    amount.round_dp(2).to_string()
}

/// Builds the signed outbound request for an order.
///
/// Billing address data is mandatory; shipping is included only when a
/// shipment with a shipping profile exists. Fails with
/// [`GatewayError::MissingAddressData`] when billing is absent.
pub fn build(
    order: &order::Model,
    billing: Option<&AddressSnapshot>,
    shipping: Option<&AddressSnapshot>,
    settings: &GatewaySettings,
) -> Result<RedirectRequest, GatewayError> {
    let billing = billing.ok_or(GatewayError::MissingAddressData)?;

    let notify_url = settings.notify_url()?;
    let mut list = FieldList::new();

    list.push("instId", settings.installation_id.as_str());
    list.push("amount", format_amount(order.total_amount));
    list.push("currency", order.currency.as_str());
    list.push("cartId", order.id.to_string());
    list.push("MC_orderId", order.order_number.as_str());
    list.push("M_http_host", settings.http_host()?);
    list.push("MC_callback", notify_url);
    list.push("C_siteTitle", settings.site_title.as_str());
    list.push_opt("MC_siteId", settings.site_id.as_deref());

    if settings.test_mode {
        list.push("testMode", TEST_MODE_VALUE);
        list.push("MC_testResult", settings.test_result.as_provider_code());
    }

    list.push("name", billing.full_name());
    list.push("address", billing.address1.as_str());
    list.push_opt("address2", billing.address2.as_deref());
    list.push_opt("town", billing.city.as_deref());
    list.push("postcode", billing.post_code.as_str());
    list.push("country", billing.country_code.as_str());
    list.push("countryString", billing.country.as_str());
    list.push_opt("email", billing.email.as_deref());

    if let Some(delivery) = shipping {
        list.push("DeliveryFirstname", delivery.first_name.as_str());
        list.push("DeliverySurname", delivery.surname.as_str());
        list.push("DeliveryAddress1", delivery.address1.as_str());
        list.push_opt("DeliveryAddress2", delivery.address2.as_deref());
        list.push_opt("DeliveryCity", delivery.city.as_deref());
        list.push("DeliveryPostCode", delivery.post_code.as_str());
        list.push("DeliveryCountry", delivery.country_code.as_str());
        list.push("DeliveryCountryString", delivery.country.as_str());
    }

    // Signature last, over the values actually present in the map, in
    // descriptor order. A field missing from the map would invalidate
    // the signature, so resolve through the assembled list itself.
    let signed_values: Vec<&str> = SIGNATURE_FIELDS
        .iter()
        .map(|name| list.value_of(name).unwrap_or_default())
        .collect();
    let signature = compute_signature(&settings.md5_salt, &signed_values);

    list.push("signatureFields", signature_fields_descriptor());
    list.push("signature", signature);

    Ok(RedirectRequest {
        fields: list.fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_settings;
    use assert_matches::assert_matches;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn test_order() -> order::Model {
        order::Model {
            id: Uuid::new_v4(),
            order_number: "ORD-1042".to_string(),
            email: "ada@example.com".to_string(),
            status: "checkout".to_string(),
            total_amount: dec!(149.99),
            currency: "GBP".to_string(),
            billing_address: None,
            shipping_address: None,
            data: serde_json::json!({}),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn billing() -> AddressSnapshot {
        AddressSnapshot {
            first_name: "Ada".to_string(),
            surname: "Lovelace".to_string(),
            address1: "1 Analytical Row".to_string(),
            address2: None,
            city: Some("London".to_string()),
            post_code: "N1 7AA".to_string(),
            country_code: "GB".to_string(),
            country: "United Kingdom".to_string(),
            email: Some("ada@example.com".to_string()),
        }
    }

    fn shipping() -> AddressSnapshot {
        AddressSnapshot {
            first_name: "Grace".to_string(),
            surname: "Hopper".to_string(),
            address1: "2 Compiler Way".to_string(),
            address2: None,
            city: None,
            post_code: "SW1A 1AA".to_string(),
            country_code: "GB".to_string(),
            country: "United Kingdom".to_string(),
            email: None,
        }
    }

    #[test]
    fn build_fails_without_billing_address() {
        let settings = test_settings();
        let result = build(&test_order(), None, None, &settings);
        assert_matches!(result, Err(GatewayError::MissingAddressData));
    }

    #[test]
    fn build_populates_required_fields() {
        let settings = test_settings();
        let order = test_order();
        let request = build(&order, Some(&billing()), None, &settings).unwrap();

        assert_eq!(request.get("instId"), Some("211616"));
        assert_eq!(request.get("amount"), Some("149.99"));
        assert_eq!(request.get("currency"), Some("GBP"));
        assert_eq!(request.get("cartId"), Some(order.id.to_string().as_str()));
        assert_eq!(request.get("MC_orderId"), Some("ORD-1042"));
        assert_eq!(
            request.get("MC_callback"),
            Some("https://shop.example.com/payment/notify/worldpay")
        );
        assert_eq!(request.get("C_siteTitle"), Some("Example Shop"));
        assert_eq!(request.get("name"), Some("Ada Lovelace"));
        assert_eq!(request.get("postcode"), Some("N1 7AA"));
    }

    #[test]
    fn signature_covers_exactly_the_descriptor_fields() {
        let settings = test_settings();
        let request = build(&test_order(), Some(&billing()), None, &settings).unwrap();

        assert_eq!(
            request.get("signatureFields"),
            Some("instId:amount:currency:cartId:MC_orderId:MC_callback")
        );

        let expected = compute_signature(
            &settings.md5_salt,
            &[
                request.get("instId").unwrap(),
                request.get("amount").unwrap(),
                request.get("currency").unwrap(),
                request.get("cartId").unwrap(),
                request.get("MC_orderId").unwrap(),
                request.get("MC_callback").unwrap(),
            ],
        );
        assert_eq!(request.get("signature"), Some(expected.as_str()));

        // Signature must be the final field in the map.
        assert_eq!(request.fields().last().unwrap().0, "signature");
    }

    #[test]
    fn shipping_fields_appear_only_with_a_shipping_profile() {
        let settings = test_settings();
        let with = build(&test_order(), Some(&billing()), Some(&shipping()), &settings).unwrap();
        assert_eq!(with.get("DeliveryFirstname"), Some("Grace"));
        assert_eq!(with.get("DeliveryPostCode"), Some("SW1A 1AA"));
        // Empty optionals are omitted, not sent blank.
        assert!(!with.contains("DeliveryAddress2"));
        assert!(!with.contains("DeliveryCity"));

        let without = build(&test_order(), Some(&billing()), None, &settings).unwrap();
        assert!(!without.contains("DeliveryFirstname"));
        assert!(!without.contains("DeliveryPostCode"));
    }

    #[test]
    fn test_mode_sends_marker_and_requested_result() {
        let mut settings = test_settings();
        settings.test_mode = true;
        let request = build(&test_order(), Some(&billing()), None, &settings).unwrap();
        assert_eq!(request.get("testMode"), Some("100"));
        assert_eq!(request.get("MC_testResult"), Some("AUTHORISED"));

        settings.test_mode = false;
        let request = build(&test_order(), Some(&billing()), None, &settings).unwrap();
        assert!(!request.contains("testMode"));
        assert!(!request.contains("MC_testResult"));
    }

    #[test]
    fn amounts_are_rounded_to_two_decimal_places() {
        let settings = test_settings();
        let mut order = test_order();
        order.total_amount = dec!(10.456);
        let request = build(&order, Some(&billing()), None, &settings).unwrap();
        assert_eq!(request.get("amount"), Some("10.46"));
    }
}
