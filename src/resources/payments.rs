use crate::{Client, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A payment made for a hold order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Payment {
    pub id: String,
    pub amount: String,
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: PaymentType,
    pub created_at: DateTime<Utc>,
    pub live_mode: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    #[default]
    Balance,
    ArcBspCash,
}

/// Amount and method of a payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInput {
    #[serde(rename = "type")]
    pub kind: PaymentType,
    pub amount: String,
    pub currency: String,
}

/// Body of [`Client::create_payment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePaymentRequest {
    pub order_id: String,
    pub payment: PaymentInput,
}

impl Client {
    /// Pays for a hold order.
    pub async fn create_payment(&self, request: CreatePaymentRequest) -> Result<Payment> {
        self.request::<CreatePaymentRequest, Payment>()
            .post("/air/payments")
            .body(request)
            .one()
            .await
    }
}
