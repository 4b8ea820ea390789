use super::offers::OFFER_REQUEST_ID_PREFIX;
use super::{require_prefix, LoyaltyProgrammeAccount, Offer, Place};
use crate::metadata::{ParamEncoder, QueryParams};
use crate::{Client, Iter, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A flight search. Airlines answer it with [`Offer`]s.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferRequest {
    pub id: String,
    pub live_mode: bool,
    pub created_at: DateTime<Utc>,
    pub slices: Vec<OfferRequestSlice>,
    pub passengers: Vec<OfferRequestPassenger>,
    pub cabin_class: Option<CabinClass>,
    /// Empty unless the request was created with `return_offers`.
    pub offers: Vec<Offer>,
}

/// A slice of an offer request as the API echoes it back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferRequestSlice {
    pub origin: Place,
    pub origin_type: String,
    pub destination: Place,
    pub destination_type: String,
    pub departure_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

/// A traveller, described either by age or by passenger type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferRequestPassenger {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    /// `adult`, `child` or `infant_without_seat`. Superseded by `age`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loyalty_programme_accounts: Vec<LoyaltyProgrammeAccount>,
}

impl OfferRequestPassenger {
    /// A passenger of the given age.
    pub fn aged(age: u32) -> Self {
        Self {
            age: Some(age),
            ..Self::default()
        }
    }

    /// An adult passenger.
    pub fn adult() -> Self {
        Self {
            kind: Some("adult".to_string()),
            ..Self::default()
        }
    }
}

/// One leg to search for, by IATA code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceInput {
    pub origin: String,
    pub destination: String,
    pub departure_date: NaiveDate,
}

/// Body and options of [`Client::create_offer_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateOfferRequestInput {
    pub slices: Vec<SliceInput>,
    pub passengers: Vec<OfferRequestPassenger>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cabin_class: Option<CabinClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    /// Sent as the `return_offers` query parameter.
    #[serde(skip)]
    pub return_offers: bool,
    /// Milliseconds to wait for each airline. Sent as the `supplier_timeout` query
    /// parameter.
    #[serde(skip)]
    pub supplier_timeout: Option<u32>,
}

impl ParamEncoder for CreateOfferRequestInput {
    fn encode(&self, params: &mut QueryParams) -> Result<()> {
        params.set("return_offers", self.return_offers.to_string());
        if let Some(timeout) = self.supplier_timeout {
            params.set("supplier_timeout", timeout.to_string());
        }
        Ok(())
    }
}

impl Client {
    /// Searches for flights. Pass the returned id to [`Client::list_offers`].
    pub async fn create_offer_request(&self, input: CreateOfferRequestInput) -> Result<OfferRequest> {
        self.request::<CreateOfferRequestInput, OfferRequest>()
            .post("/air/offer_requests")
            .params(input.clone())
            .body(input)
            .one()
            .await
    }

    /// Gets an offer request by id.
    pub async fn get_offer_request(&self, id: &str) -> Result<OfferRequest> {
        require_prefix(id, OFFER_REQUEST_ID_PREFIX, "offer_request_id")?;

        self.request::<(), OfferRequest>()
            .get(format!("/air/offer_requests/{}", id))
            .one()
            .await
    }

    /// Lists the offer requests made with this token.
    pub async fn list_offer_requests(&self) -> Iter<OfferRequest> {
        self.request::<(), OfferRequest>()
            .get("/air/offer_requests")
            .all()
            .await
    }
}
