use super::require_prefix;
use crate::{Client, Iter};
use serde::{Deserialize, Serialize};

/// The seat layout of one segment of an offer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Seatmap {
    pub id: String,
    pub segment_id: String,
    pub slice_id: String,
    pub cabins: Vec<Cabin>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cabin {
    pub cabin_class: String,
    pub deck: u32,
    pub aisles: u32,
    pub rows: Vec<Row>,
    /// Rows over the wings, if known.
    pub wings: Option<Wing>,
}

/// A row of a cabin, split into sections by the aisles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Row {
    pub sections: Vec<SeatSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatSection {
    pub elements: Vec<SectionElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionElement {
    #[serde(rename = "type")]
    pub kind: ElementType,
    /// Row number and column letter, e.g. `14B`. Seats only.
    pub designator: Option<String>,
    pub name: Option<String>,
    pub disclosures: Vec<String>,
    /// Empty when the seat cannot be booked.
    pub available_services: Vec<SeatService>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    Seat,
    Bassinet,
    #[default]
    Empty,
    ExitRow,
    Lavatory,
    Galley,
    Closet,
    Stairs,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatService {
    pub id: String,
    pub passenger_id: String,
    pub total_amount: String,
    pub total_currency: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wing {
    pub first_row_index: u32,
    pub last_row_index: u32,
}

impl Client {
    /// Lists the seat maps of every segment of an offer.
    pub async fn list_seatmaps(&self, offer_id: &str) -> Iter<Seatmap> {
        if let Err(e) = require_prefix(offer_id, "off_", "offer_id") {
            return Iter::from_error(e);
        }

        self.request::<(), Seatmap>()
            .get("/air/seat_maps")
            .param("offer_id", offer_id)
            .all()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_element_types_are_tolerated() {
        let element: SectionElement = serde_json::from_str(
            r#"{"type": "hovercraft_dock", "disclosures": [], "available_services": []}"#,
        )
        .unwrap();
        assert_eq!(element.kind, ElementType::Other);

        let seat: SectionElement = serde_json::from_str(
            r#"{"type": "seat", "designator": "14B", "name": "Exit row seat",
                "available_services": [{"id": "ase_1", "passenger_id": "pas_1",
                                        "total_amount": "30.00", "total_currency": "GBP"}]}"#,
        )
        .unwrap();
        assert_eq!(seat.kind, ElementType::Seat);
        assert_eq!(seat.designator.as_deref(), Some("14B"));
        assert_eq!(seat.available_services[0].total_amount, "30.00");
    }
}
