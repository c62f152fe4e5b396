#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectOptions, Database, EntityTrait, QueryFilter, Set};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use worldpay_gateway::{
    config::{self, GatewaySettings},
    db,
    entities::{order, payment},
    router, AppState,
};

/// Test harness backed by an in-memory SQLite database.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_settings(config::test_settings()).await
    }

    pub async fn with_settings(settings: GatewaySettings) -> Self {
        // A single pooled connection keeps the in-memory database alive
        // and shared across the test.
        let mut options = ConnectOptions::new("sqlite::memory:".to_string());
        options.max_connections(1).sqlx_logging(false);
        let conn = Database::connect(options)
            .await
            .expect("sqlite connection");
        db::bootstrap_schema(&conn).await.expect("schema bootstrap");

        let state = AppState {
            db: Arc::new(conn),
            settings: Arc::new(settings),
        };
        let router = router(state.clone());
        Self { router, state }
    }

    /// Inserts an order, optionally with billing/shipping snapshots.
    pub async fn insert_order(
        &self,
        order_number: &str,
        with_billing: bool,
        with_shipping: bool,
    ) -> order::Model {
        let billing = with_billing.then(|| {
            json!({
                "first_name": "Ada",
                "surname": "Lovelace",
                "address1": "1 Analytical Row",
                "city": "London",
                "post_code": "N1 7AA",
                "country_code": "GB",
                "country": "United Kingdom",
                "email": "ada@example.com"
            })
        });
        let shipping = with_shipping.then(|| {
            json!({
                "first_name": "Grace",
                "surname": "Hopper",
                "address1": "2 Compiler Way",
                "post_code": "SW1A 1AA",
                "country_code": "GB",
                "country": "United Kingdom"
            })
        });

        order::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_number: Set(order_number.to_string()),
            email: Set("ada@example.com".to_string()),
            status: Set("checkout".to_string()),
            total_amount: Set(dec!(149.99)),
            currency: Set("GBP".to_string()),
            billing_address: Set(billing),
            shipping_address: Set(shipping),
            data: Set(json!({})),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("order insert")
    }

    /// Sends a request and returns status plus body text.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        form_body: Option<&str>,
    ) -> (StatusCode, String) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match form_body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("request should complete");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should collect");
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Convenience wrapper for provider notifications.
    pub async fn notify(&self, form_body: &str) -> (StatusCode, String) {
        self.request(Method::POST, "/payment/notify/worldpay", Some(form_body))
            .await
    }

    pub async fn payments_for(&self, order_id: Uuid) -> Vec<payment::Model> {
        payment::Entity::find()
            .filter(payment::Column::OrderId.eq(order_id))
            .all(&*self.state.db)
            .await
            .expect("payments query")
    }

    pub async fn reload_order(&self, order_id: Uuid) -> order::Model {
        order::Entity::find_by_id(order_id)
            .one(&*self.state.db)
            .await
            .expect("order query")
            .expect("order should exist")
    }
}
