//! Typed Duffel endpoints.
//!
//! Each module adds methods to [`Client`](crate::Client) and declares the records
//! those endpoints exchange. A booking starts with
//! [`create_offer_request`](crate::Client::create_offer_request), whose id lists the
//! resulting offers. Amounts are kept as the decimal strings the API sends,
//! next to their currency.

mod aircraft;
mod airlines;
mod airports;
mod offer_requests;
mod offers;
mod order_cancellations;
mod order_changes;
mod orders;
mod payments;
mod places;
mod seatmaps;

pub use aircraft::Aircraft;
pub use airlines::Airline;
pub use airports::{Airport, City, ListAirportsParams};
pub use offer_requests::{
    CabinClass, CreateOfferRequestInput, OfferRequest, OfferRequestPassenger, OfferRequestSlice,
    SliceInput,
};
pub use offers::{
    AvailableService, Baggage, ChangeCondition, Conditions, GetOfferParams, ListOffersParams,
    LoyaltyProgrammeAccount, Offer, OfferPassenger, OfferSort, PassengerUpdateInput,
    PaymentRequirements, Segment, SegmentPassenger, Slice,
};
pub use order_cancellations::OrderCancellation;
pub use order_changes::{
    CreateOrderChangeRequestInput, OrderChange, OrderChangeOffer, OrderChangeRequest, SliceAdd,
    SliceChange, SliceChangeset, SliceRemove,
};
pub use orders::{
    CreateOrderInput, Document, Gender, ListOrdersParams, Order, OrderPassenger, OrderSort,
    OrderType, OrderUpdateParams, PassengerTitle, PaymentStatus, Service, ServiceInput, TimeFilter,
};
pub use payments::{CreatePaymentRequest, Payment, PaymentInput, PaymentType};
pub use places::{Place, PlaceType};
pub use seatmaps::{Cabin, ElementType, Row, SeatSection, Seatmap, SectionElement, SeatService, Wing};

use crate::{Error, Result};
use std::collections::HashMap;

/// Free-form key-value pairs attached to orders and services.
pub type Metadata = HashMap<String, serde_json::Value>;

/// Rejects ids that do not start with the prefix Duffel gives that kind of object.
pub(crate) fn require_prefix(id: &str, prefix: &str, name: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::Validation(format!("{} is required", name)));
    }
    if !id.starts_with(prefix) {
        return Err(Error::Validation(format!(
            "{} should begin with {}, got {}",
            name, prefix, id
        )));
    }
    Ok(())
}
