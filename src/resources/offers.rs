use super::{require_prefix, Aircraft, Airline, Metadata, Place};
use crate::metadata::{ParamEncoder, QueryParams};
use crate::{Client, Iter, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub(super) const OFFER_ID_PREFIX: &str = "off_";
pub(super) const OFFER_REQUEST_ID_PREFIX: &str = "orq_";

/// A priced itinerary an airline is willing to sell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Offer {
    pub id: String,
    pub live_mode: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// The offer can no longer be booked after this time.
    pub expires_at: DateTime<Utc>,
    pub total_amount: String,
    pub total_currency: String,
    pub base_amount: Option<String>,
    pub base_currency: Option<String>,
    pub tax_amount: Option<String>,
    pub tax_currency: Option<String>,
    pub total_emissions_kg: Option<String>,
    pub owner: Airline,
    pub slices: Vec<Slice>,
    pub passengers: Vec<OfferPassenger>,
    pub partial: bool,
    pub passenger_identity_documents_required: bool,
    pub payment_requirements: PaymentRequirements,
    /// Only populated when requested with `return_available_services`.
    pub available_services: Vec<AvailableService>,
    pub conditions: Conditions,
}

/// One leg of a journey, e.g. the outbound flight(s) of a return trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Slice {
    pub id: String,
    pub origin: Place,
    pub origin_type: String,
    pub destination: Place,
    pub destination_type: String,
    /// ISO 8601 duration, e.g. `PT02H26M`.
    pub duration: Option<String>,
    pub fare_brand_name: Option<String>,
    pub segments: Vec<Segment>,
    pub conditions: Conditions,
    pub changeable: bool,
}

/// A single flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Segment {
    pub id: String,
    pub origin: Place,
    pub origin_terminal: Option<String>,
    pub destination: Place,
    pub destination_terminal: Option<String>,
    /// Local time at the origin.
    pub departing_at: Option<NaiveDateTime>,
    /// Local time at the destination.
    pub arriving_at: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub distance: Option<String>,
    pub operating_carrier: Airline,
    pub operating_carrier_flight_number: Option<String>,
    pub marketing_carrier: Airline,
    pub marketing_carrier_flight_number: Option<String>,
    pub aircraft: Option<Aircraft>,
    pub passengers: Vec<SegmentPassenger>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentPassenger {
    pub passenger_id: String,
    pub cabin_class: String,
    pub cabin_class_marketing_name: Option<String>,
    pub fare_basis_code: Option<String>,
    pub baggages: Vec<Baggage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Baggage {
    /// `checked` or `carry_on`.
    #[serde(rename = "type")]
    pub kind: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conditions {
    pub refund_before_departure: Option<ChangeCondition>,
    pub change_before_departure: Option<ChangeCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangeCondition {
    pub allowed: bool,
    pub penalty_amount: Option<String>,
    pub penalty_currency: Option<String>,
}

/// An extra (baggage, seat, ...) that can be booked with an offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AvailableService {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub maximum_quantity: u32,
    pub passenger_ids: Vec<String>,
    pub segment_ids: Vec<String>,
    pub total_amount: String,
    pub total_currency: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRequirements {
    pub requires_instant_payment: bool,
    pub price_guarantee_expires_at: Option<DateTime<Utc>>,
    pub payment_required_by: Option<DateTime<Utc>>,
}

/// A passenger as described in the offer request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferPassenger {
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loyalty_programme_accounts: Vec<LoyaltyProgrammeAccount>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoyaltyProgrammeAccount {
    pub airline_iata_code: String,
    pub account_number: String,
}

/// Body of [`Client::update_offer_passenger`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassengerUpdateInput {
    pub given_name: String,
    pub family_name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub loyalty_programme_accounts: Vec<LoyaltyProgrammeAccount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferSort {
    TotalAmount,
    TotalDuration,
}

impl OfferSort {
    /// The value sent as `sort`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferSort::TotalAmount => "total_amount",
            OfferSort::TotalDuration => "total_duration",
        }
    }
}

/// Options for [`Client::list_offers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOffersParams {
    pub sort: Option<OfferSort>,
    /// Only return offers with at most this many connections per slice.
    pub max_connections: Option<u32>,
}

impl ParamEncoder for ListOffersParams {
    fn encode(&self, params: &mut QueryParams) -> Result<()> {
        if let Some(sort) = self.sort {
            params.set("sort", sort.as_str());
        }
        if let Some(max_connections) = self.max_connections {
            params.set("max_connections", max_connections.to_string());
        }
        Ok(())
    }
}

/// Options for [`Client::get_offer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOfferParams {
    pub return_available_services: bool,
}

impl ParamEncoder for GetOfferParams {
    fn encode(&self, params: &mut QueryParams) -> Result<()> {
        if self.return_available_services {
            params.set("return_available_services", "true");
        }
        Ok(())
    }
}

impl Client {
    /// Lists the offers of an offer request.
    ///
    /// An id without the `orq_` prefix yields an already-failed iterator and sends
    /// nothing.
    pub async fn list_offers(
        &self,
        offer_request_id: &str,
        params: Option<ListOffersParams>,
    ) -> Iter<Offer> {
        if let Err(e) = require_prefix(offer_request_id, OFFER_REQUEST_ID_PREFIX, "offer_request_id")
        {
            return Iter::from_error(e);
        }

        self.request::<(), Offer>()
            .get("/air/offers")
            .param("offer_request_id", offer_request_id)
            .params(params)
            .all()
            .await
    }

    /// Gets one offer, optionally with the services that can be booked with it.
    pub async fn get_offer(&self, offer_id: &str, params: Option<GetOfferParams>) -> Result<Offer> {
        require_prefix(offer_id, OFFER_ID_PREFIX, "offer_id")?;

        self.request::<(), Offer>()
            .get(format!("/air/offers/{}", offer_id))
            .params(params)
            .one()
            .await
    }

    /// Sets the name and loyalty accounts of one passenger of an offer.
    ///
    /// Some airlines price an offer differently once they know the passenger's
    /// loyalty programme.
    pub async fn update_offer_passenger(
        &self,
        offer_id: &str,
        passenger_id: &str,
        input: PassengerUpdateInput,
    ) -> Result<OfferPassenger> {
        require_prefix(offer_id, OFFER_ID_PREFIX, "offer_id")?;
        require_prefix(passenger_id, "pas_", "passenger_id")?;

        self.request::<PassengerUpdateInput, OfferPassenger>()
            .patch(format!("/air/offers/{}/passengers/{}", offer_id, passenger_id))
            .body(input)
            .one()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_params_encode_only_what_is_set() {
        let mut params = QueryParams::new();
        ListOffersParams::default().encode(&mut params).unwrap();
        assert!(params.is_empty());

        ListOffersParams {
            sort: Some(OfferSort::TotalDuration),
            max_connections: Some(0),
        }
        .encode(&mut params)
        .unwrap();
        assert_eq!(params.get("sort"), Some("total_duration"));
        assert_eq!(params.get("max_connections"), Some("0"));
    }

    #[test]
    fn decodes_offer_with_local_segment_times() {
        let offer: Offer = serde_json::from_str(
            r#"{
                "id": "off_00009htYpSCXrwaB9DnUm0",
                "live_mode": false,
                "created_at": "2020-01-17T10:12:14.545Z",
                "updated_at": "2020-01-17T10:12:14.545Z",
                "expires_at": "2020-01-17T10:42:14.545Z",
                "total_amount": "45.00",
                "total_currency": "GBP",
                "owner": {"id": "arl_00001876aqC8c5umZmrRds", "name": "British Airways", "iata_code": "BA"},
                "slices": [{
                    "id": "sli_00009htYpSCXrwaB9Dn123",
                    "origin": {"id": "arp_lhr_gb", "type": "airport", "name": "Heathrow", "iata_code": "LHR"},
                    "destination": {"id": "arp_jfk_us", "type": "airport", "name": "John F. Kennedy", "iata_code": "JFK"},
                    "duration": "PT02H26M",
                    "segments": [{
                        "id": "seg_00009htYpSCXrwaB9Dn456",
                        "departing_at": "2020-06-13T16:38:02",
                        "arriving_at": "2020-06-13T19:04:02",
                        "passengers": [{"passenger_id": "pas_1", "cabin_class": "economy",
                                        "baggages": [{"type": "checked", "quantity": 1}]}]
                    }]
                }],
                "payment_requirements": {"requires_instant_payment": false,
                                         "payment_required_by": "2020-01-17T10:42:14Z"}
            }"#,
        )
        .unwrap();

        assert_eq!(offer.total_amount, "45.00");
        assert_eq!(offer.owner.iata_code.as_deref(), Some("BA"));
        let segment = &offer.slices[0].segments[0];
        assert_eq!(
            segment.departing_at.unwrap().to_string(),
            "2020-06-13 16:38:02"
        );
        assert_eq!(segment.passengers[0].baggages[0].quantity, 1);
        assert!(offer.payment_requirements.payment_required_by.is_some());
    }
}
