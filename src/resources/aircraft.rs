use crate::{Client, Iter, Result};
use serde::{Deserialize, Serialize};

/// An aircraft type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Aircraft {
    pub id: String,
    pub name: String,
    pub iata_code: String,
}

impl Client {
    /// Lists every aircraft type Duffel knows about.
    pub async fn list_aircraft(&self) -> Iter<Aircraft> {
        self.request::<(), Aircraft>()
            .get("/air/aircraft")
            .all()
            .await
    }

    /// Gets one aircraft type by id.
    pub async fn get_aircraft(&self, id: &str) -> Result<Aircraft> {
        self.request::<(), Aircraft>()
            .get(format!("/air/aircraft/{}", id))
            .one()
            .await
    }
}
