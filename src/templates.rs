//! Confirmation fragments rendered back on the provider's notification
//! channel. The provider serves them on its own custom pages, so these
//! are self-contained HTML snippets with no local asset references.

/// Success fragment shown after an approved transaction.
pub fn success_page(order_number: &str, transaction_id: &str, return_url: &str) -> String {
    format!(
        "<header>\
           <h1>Payment received</h1>\
           <p>Payment was successful.</p>\
           <table>\
             <thead><tr><th>Order No</th><th>Transaction</th></tr></thead>\
             <tbody><tr><td>{order_number}</td><td>{transaction_id}</td></tr></tbody>\
           </table>\
           <p><a href=\"{return_url}\">Finish your order</a></p>\
         </header>"
    )
}

/// Cancellation fragment shown after a shopper-cancelled transaction.
pub fn cancel_page(order_number: &str, transaction_id: &str, cancel_url: &str) -> String {
    format!(
        "<header>\
           <h1>Payment cancelled</h1>\
           <p>The payment for order {order_number} was cancelled (reference {transaction_id}).</p>\
           <p><a href=\"{cancel_url}\">Return to checkout</a></p>\
         </header>"
    )
}

/// Shopper-facing page served when the browser returns from the
/// provider after a completed payment.
pub fn shopper_return_page(order_number: &str, site_title: &str) -> String {
    format!(
        "<div id=\"page\">\
           <h1>{site_title}</h1>\
           <p>Thank you. Your payment for order {order_number} has been received.</p>\
         </div>"
    )
}

/// Shopper-facing page served when the browser returns after
/// cancelling on the hosted payment page.
pub fn shopper_cancel_page(order_number: &str, site_title: &str) -> String {
    format!(
        "<div id=\"page\">\
           <h1>{site_title}</h1>\
           <p>Your payment for order {order_number} was cancelled. No money has been taken.</p>\
         </div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_page_carries_order_and_return_link() {
        let html = success_page("ORD-1042", "TX1", "https://shop.example.com/return");
        assert!(html.contains("ORD-1042"));
        assert!(html.contains("TX1"));
        assert!(html.contains("https://shop.example.com/return"));
        assert!(html.contains("Payment was successful"));
    }

    #[test]
    fn cancel_page_carries_order_and_cancel_link() {
        let html = cancel_page("ORD-1043", "TX2", "https://shop.example.com/cancel");
        assert!(html.contains("ORD-1043"));
        assert!(html.contains("cancelled"));
        assert!(html.contains("https://shop.example.com/cancel"));
    }

    #[test]
    fn shopper_pages_name_the_site_and_order() {
        let html = shopper_return_page("ORD-1042", "Example Shop");
        assert!(html.contains("Example Shop"));
        assert!(html.contains("ORD-1042"));

        let html = shopper_cancel_page("ORD-1042", "Example Shop");
        assert!(html.contains("No money has been taken"));
    }
}
