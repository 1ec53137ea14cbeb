use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{GatewayOrder, GatewayOrderStatus, OrderRequest, PaymentProvider};

const API_VERSION: &str = "2023-08-01";

pub struct CashfreeProvider {
    base_url: String,
    app_id: String,
    secret_key: String,
    client: reqwest::Client,
}

impl CashfreeProvider {
    pub fn new(base_url: String, app_id: String, secret_key: String) -> Self {
        Self {
            base_url,
            app_id,
            secret_key,
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct OrderResponse {
    order_id: String,
    payment_session_id: Option<String>,
    order_status: String,
}

#[async_trait]
impl PaymentProvider for CashfreeProvider {
    async fn create_order(&self, order: &OrderRequest) -> anyhow::Result<GatewayOrder> {
        let url = format!("{}/pg/orders", self.base_url);

        let body = serde_json::json!({
            "order_id": order.order_id,
            "order_amount": order.amount,
            "order_currency": order.currency,
            "customer_details": {
                "customer_id": order.customer_id,
            },
        });

        let response: OrderResponse = self
            .client
            .post(&url)
            .header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret_key)
            .header("x-api-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .context("failed to reach Cashfree")?
            .error_for_status()
            .context("Cashfree order creation returned error")?
            .json()
            .await
            .context("failed to decode Cashfree order response")?;

        Ok(GatewayOrder {
            order_id: response.order_id,
            payment_session_id: response.payment_session_id.unwrap_or_default(),
        })
    }

    async fn fetch_order_status(&self, order_id: &str) -> anyhow::Result<GatewayOrderStatus> {
        let url = format!("{}/pg/orders/{}", self.base_url, order_id);

        let response: OrderResponse = self
            .client
            .get(&url)
            .header("x-client-id", &self.app_id)
            .header("x-client-secret", &self.secret_key)
            .header("x-api-version", API_VERSION)
            .send()
            .await
            .context("failed to reach Cashfree")?
            .error_for_status()
            .context("Cashfree order lookup returned error")?
            .json()
            .await
            .context("failed to decode Cashfree order response")?;

        let status = match response.order_status.as_str() {
            "PAID" => GatewayOrderStatus::Paid,
            "EXPIRED" | "TERMINATED" => GatewayOrderStatus::Expired,
            _ => GatewayOrderStatus::Active,
        };
        Ok(status)
    }
}
