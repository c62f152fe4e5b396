pub mod checkout;
pub mod reconciliation;

/// Key under which the assembled redirect request and callback URL are
/// stashed in the order's extension data bag.
pub const ORDER_DATA_KEY: &str = "worldpay_form";
