use super::require_prefix;
use crate::{Client, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ORDER_CANCELLATION_ID_PREFIX: &str = "ore_";

/// A pending or confirmed cancellation of an order.
///
/// Creating one only quotes the refund; the booking is cancelled when the
/// cancellation is confirmed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderCancellation {
    pub id: String,
    pub order_id: String,
    /// Where the refund goes, e.g. `balance` or `original_form_of_payment`.
    pub refund_to: String,
    pub refund_amount: String,
    pub refund_currency: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub live_mode: bool,
}

#[derive(Serialize)]
struct CreateOrderCancellation<'a> {
    order_id: &'a str,
}

impl Client {
    /// Quotes the refund for cancelling an order. Nothing is cancelled yet.
    pub async fn create_order_cancellation(&self, order_id: &str) -> Result<OrderCancellation> {
        self.request::<CreateOrderCancellation<'_>, OrderCancellation>()
            .post("/air/order_cancellations")
            .body(CreateOrderCancellation { order_id })
            .one()
            .await
    }

    /// Confirms a pending cancellation, cancelling the booking with the airline.
    pub async fn confirm_order_cancellation(&self, id: &str) -> Result<OrderCancellation> {
        require_prefix(id, ORDER_CANCELLATION_ID_PREFIX, "order_cancellation_id")?;

        self.request::<(), OrderCancellation>()
            .post(format!("/air/order_cancellations/{}/actions/confirm", id))
            .one()
            .await
    }

    /// Gets one cancellation by id.
    pub async fn get_order_cancellation(&self, id: &str) -> Result<OrderCancellation> {
        require_prefix(id, ORDER_CANCELLATION_ID_PREFIX, "order_cancellation_id")?;

        self.request::<(), OrderCancellation>()
            .get(format!("/air/order_cancellations/{}", id))
            .one()
            .await
    }
}
