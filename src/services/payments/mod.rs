pub mod cashfree;

use async_trait::async_trait;

/// What the booking flow needs from the payment gateway. The concrete
/// client is constructed at startup and injected through `AppState`.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_order(&self, order: &OrderRequest) -> anyhow::Result<GatewayOrder>;
    async fn fetch_order_status(&self, order_id: &str) -> anyhow::Result<GatewayOrderStatus>;
}

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub customer_id: String,
}

#[derive(Debug, Clone)]
pub struct GatewayOrder {
    pub order_id: String,
    pub payment_session_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOrderStatus {
    /// Order created, payment not captured yet.
    Active,
    Paid,
    /// Expired or terminated without capture.
    Expired,
}
