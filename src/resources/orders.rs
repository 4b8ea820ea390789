use super::{Airline, Conditions, LoyaltyProgrammeAccount, Metadata, PaymentInput, Slice};
use crate::metadata::{ParamEncoder, QueryParams};
use crate::{Client, Iter, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A booking made with an airline.
///
/// A 500 answer to [`Client::create_order`] does not mean the order was not
/// created: the airline may have booked it anyway. Such errors are never retried;
/// check with Duffel support before booking again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Order {
    pub id: String,
    pub live_mode: bool,
    /// Airline booking reference (PNR).
    pub booking_reference: String,
    pub created_at: DateTime<Utc>,
    pub synced_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub metadata: Option<Metadata>,
    pub owner: Airline,
    pub passengers: Vec<OrderPassenger>,
    pub payment_status: PaymentStatus,
    pub services: Vec<Service>,
    pub slices: Vec<Slice>,
    pub documents: Vec<Document>,
    pub conditions: Conditions,
    pub total_amount: String,
    pub total_currency: String,
    pub base_amount: Option<String>,
    pub base_currency: Option<String>,
    pub tax_amount: Option<String>,
    pub tax_currency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentStatus {
    pub awaiting_payment: bool,
    pub payment_required_by: Option<DateTime<Utc>>,
    pub price_guarantee_expires_at: Option<DateTime<Utc>>,
}

/// A passenger of an order. Also the shape sent when creating one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderPassenger {
    /// The passenger id returned with the offer.
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<PassengerTitle>,
    pub given_name: String,
    pub family_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub born_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// E.164 formatted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infant_passenger_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loyalty_programme_accounts: Vec<LoyaltyProgrammeAccount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassengerTitle {
    Mr,
    Ms,
    Mrs,
    Miss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "m")]
    Male,
    #[serde(rename = "f")]
    Female,
}

/// A booked extra.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub id: String,
    /// `baggage` or `seat`.
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: u32,
    pub passenger_ids: Vec<String>,
    pub segment_ids: Vec<String>,
    pub total_amount: String,
    pub total_currency: String,
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(rename = "type")]
    pub kind: String,
    pub unique_identifier: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    #[default]
    Instant,
    Hold,
}

/// An available service to book together with the offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInput {
    pub id: String,
    pub quantity: u32,
}

/// Body of [`Client::create_order`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateOrderInput {
    #[serde(rename = "type")]
    pub kind: OrderType,
    /// Exactly one offer id.
    pub selected_offers: Vec<String>,
    pub passengers: Vec<OrderPassenger>,
    /// Omit for hold orders.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub payments: Vec<PaymentInput>,
    /// Omit for hold orders.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub services: Vec<ServiceInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Body of [`Client::update_order`]. Only metadata can be changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OrderUpdateParams {
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSort {
    PaymentRequiredByAsc,
    PaymentRequiredByDesc,
}

impl OrderSort {
    /// The value sent as `sort`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSort::PaymentRequiredByAsc => "payment_required_by",
            OrderSort::PaymentRequiredByDesc => "-payment_required_by",
        }
    }
}

/// Bounds on a timestamp filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeFilter {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
}

impl TimeFilter {
    fn encode(&self, name: &str, params: &mut QueryParams) {
        if let Some(before) = self.before {
            params.set(
                format!("{}[before]", name),
                before.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }
        if let Some(after) = self.after {
            params.set(
                format!("{}[after]", name),
                after.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }
    }
}

/// Filters for [`Client::list_orders`]. Id and name lists repeat their key once per
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOrdersParams {
    /// Exact, case-insensitive match.
    pub booking_reference: Option<String>,
    pub awaiting_payment: Option<bool>,
    pub sort: Option<OrderSort>,
    pub owner_ids: Vec<String>,
    pub origin_ids: Vec<String>,
    pub destination_ids: Vec<String>,
    /// Partial, case-insensitive matches on any passenger.
    pub passenger_names: Vec<String>,
    pub departing_at: Option<TimeFilter>,
    pub arriving_at: Option<TimeFilter>,
    pub created_at: Option<TimeFilter>,
}

impl ParamEncoder for ListOrdersParams {
    fn encode(&self, params: &mut QueryParams) -> Result<()> {
        if let Some(reference) = self.booking_reference.as_deref().filter(|r| !r.is_empty()) {
            params.set("booking_reference", reference);
        }
        if let Some(awaiting) = self.awaiting_payment {
            params.set("awaiting_payment", awaiting.to_string());
        }
        if let Some(sort) = self.sort {
            params.set("sort", sort.as_str());
        }

        for (key, values) in [
            ("owner_id", &self.owner_ids),
            ("origin_id", &self.origin_ids),
            ("destination_id", &self.destination_ids),
            ("passenger_name", &self.passenger_names),
        ] {
            params.remove(key);
            for value in values {
                params.append(key, value.as_str());
            }
        }

        for (name, filter) in [
            ("departing_at", &self.departing_at),
            ("arriving_at", &self.arriving_at),
            ("created_at", &self.created_at),
        ] {
            if let Some(filter) = filter {
                filter.encode(name, params);
            }
        }
        Ok(())
    }
}

impl Client {
    /// Books the selected offers, paying now or holding the order.
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<Order> {
        self.request::<CreateOrderInput, Order>()
            .post("/air/orders")
            .body(input)
            .one()
            .await
    }

    /// Gets one order by id.
    pub async fn get_order(&self, id: &str) -> Result<Order> {
        self.request::<(), Order>()
            .get(format!("/air/orders/{}", id))
            .one()
            .await
    }

    /// Replaces the metadata of an order.
    pub async fn update_order(&self, id: &str, params: OrderUpdateParams) -> Result<Order> {
        self.request::<OrderUpdateParams, Order>()
            .patch(format!("/air/orders/{}", id))
            .body(params)
            .one()
            .await
    }

    /// Lists orders matching `params`.
    pub async fn list_orders(&self, params: Option<ListOrdersParams>) -> Iter<Order> {
        self.request::<(), Order>()
            .get("/air/orders")
            .params(params)
            .all()
            .await
    }
}
