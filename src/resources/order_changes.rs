//! Changing the slices of a paid order.
//!
//! The flow has three steps. Create an [`OrderChangeRequest`] describing the slices to
//! remove and the ones to search for. Pick one of its [`OrderChangeOffer`]s and turn
//! it into a pending [`OrderChange`]. Confirm that change with a payment covering
//! `change_total_amount`.

use super::{require_prefix, CabinClass, PaymentInput, Slice};
use crate::{Client, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

const ORDER_CHANGE_REQUEST_ID_PREFIX: &str = "ocr_";
const ORDER_CHANGE_OFFER_ID_PREFIX: &str = "oco_";
const ORDER_CHANGE_ID_PREFIX: &str = "oce_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderChangeRequest {
    pub id: String,
    pub order_id: String,
    pub slices: SliceChange,
    /// Priced alternatives, filled in once the airline has answered.
    pub order_change_offers: Vec<OrderChangeOffer>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub live_mode: bool,
}

/// A priced proposal for changing an order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderChangeOffer {
    pub id: String,
    /// Set once a pending change was created from this offer.
    pub order_change_id: Option<String>,
    pub slices: SliceChangeset,
    pub refund_to: Option<String>,
    pub penalty_total_amount: Option<String>,
    pub penalty_total_currency: Option<String>,
    pub new_total_amount: String,
    pub new_total_currency: String,
    /// Negative when the change results in a refund.
    pub change_total_amount: String,
    pub change_total_currency: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub live_mode: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderChange {
    pub id: String,
    pub order_id: String,
    pub slices: SliceChangeset,
    pub refund_to: Option<String>,
    pub penalty_total_amount: Option<String>,
    pub penalty_total_currency: Option<String>,
    pub new_total_amount: String,
    pub new_total_currency: String,
    pub change_total_amount: String,
    pub change_total_currency: String,
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` while the change is pending.
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub live_mode: bool,
}

/// Slices added and removed by a change offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceChangeset {
    pub add: Vec<Slice>,
    pub remove: Vec<Slice>,
}

/// Slices to search for and slices to drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceChange {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<SliceAdd>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<SliceRemove>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceAdd {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub cabin_class: CabinClass,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceRemove {
    pub slice_id: String,
}

/// Body of [`Client::create_order_change_request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderChangeRequestInput {
    pub order_id: String,
    pub slices: SliceChange,
}

#[derive(Serialize)]
struct PendingOrderChangeInput {
    selected_order_change_offer: String,
}

#[derive(Serialize)]
struct ConfirmOrderChangeInput {
    payment: PaymentInput,
}

impl Client {
    /// Asks the airline for ways to change an order.
    pub async fn create_order_change_request(
        &self,
        input: CreateOrderChangeRequestInput,
    ) -> Result<OrderChangeRequest> {
        require_prefix(&input.order_id, "ord_", "order_id")?;

        self.request::<CreateOrderChangeRequestInput, OrderChangeRequest>()
            .post("/air/order_change_requests")
            .body(input)
            .one()
            .await
    }

    /// Gets an order change request, with any offers received so far.
    pub async fn get_order_change_request(&self, id: &str) -> Result<OrderChangeRequest> {
        require_prefix(id, ORDER_CHANGE_REQUEST_ID_PREFIX, "order_change_request_id")?;

        self.request::<(), OrderChangeRequest>()
            .get(format!("/air/order_change_requests/{}", id))
            .one()
            .await
    }

    /// Turns an order change offer into a pending change.
    pub async fn create_pending_order_change(&self, offer_id: &str) -> Result<OrderChange> {
        require_prefix(offer_id, ORDER_CHANGE_OFFER_ID_PREFIX, "order_change_offer_id")?;

        self.request::<PendingOrderChangeInput, OrderChange>()
            .post("/air/order_changes")
            .body(PendingOrderChangeInput {
                selected_order_change_offer: offer_id.to_string(),
            })
            .one()
            .await
    }

    /// Gets one order change by id.
    pub async fn get_order_change(&self, id: &str) -> Result<OrderChange> {
        require_prefix(id, ORDER_CHANGE_ID_PREFIX, "order_change_id")?;

        self.request::<(), OrderChange>()
            .get(format!("/air/order_changes/{}", id))
            .one()
            .await
    }

    /// Confirms a pending change and pays its `change_total_amount`.
    pub async fn confirm_order_change(
        &self,
        id: &str,
        payment: PaymentInput,
    ) -> Result<OrderChange> {
        require_prefix(id, ORDER_CHANGE_ID_PREFIX, "order_change_id")?;

        self.request::<ConfirmOrderChangeInput, OrderChange>()
            .post(format!("/air/order_changes/{}/actions/confirm", id))
            .body(ConfirmOrderChangeInput { payment })
            .one()
            .await
    }
}
