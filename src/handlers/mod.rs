pub mod checkout;
pub mod notify;
