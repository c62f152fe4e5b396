use serde::{Deserialize, Serialize};

/// Immutable projection of a profile's postal fields taken at
/// request-build time. It does not track the live profile afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub first_name: String,
    pub surname: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    pub post_code: String,
    /// ISO 3166-1 alpha-2 code
    pub country_code: String,
    /// Display country name
    pub country: String,
    /// Present on billing snapshots only
    #[serde(default)]
    pub email: Option<String>,
}

impl AddressSnapshot {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname)
    }

    /// Deserializes a snapshot stored as a JSON column value.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
