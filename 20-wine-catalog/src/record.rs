use serde::{Deserialize, Serialize};

/// One row of the catalog.
///
/// Field order matches the column order of the CSV file, which lets the
/// loader deserialize rows by position into named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wine {
    pub id: String,
    pub country: String,
    pub description: String,
    pub designation: String,
    pub points: String,
    pub price: String,
    pub province: String,
    pub region_1: String,
    pub region_2: String,
    pub taster_name: String,
    pub taster_twitter_handle: String,
    pub title: String,
    pub variety: String,
    pub winery: String,
}

impl Wine {
    /// Builds a stored record from client-supplied fields and an assigned id.
    pub fn from_new(id: usize, wine: NewWine) -> Self {
        let NewWine {
            country,
            description,
            designation,
            points,
            price,
            province,
            region_1,
            region_2,
            taster_name,
            taster_twitter_handle,
            title,
            variety,
            winery,
        } = wine;

        Self {
            id: id.to_string(),
            country,
            description,
            designation,
            points,
            price,
            province,
            region_1,
            region_2,
            taster_name,
            taster_twitter_handle,
            title,
            variety,
            winery,
        }
    }

    pub fn summary(&self) -> WineSummary {
        WineSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

/// The writable fields of a wine, as accepted by `PUT /wine`.
///
/// Missing fields decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewWine {
    pub country: String,
    pub description: String,
    pub designation: String,
    pub points: String,
    pub price: String,
    pub province: String,
    pub region_1: String,
    pub region_2: String,
    pub taster_name: String,
    pub taster_twitter_handle: String,
    pub title: String,
    pub variety: String,
    pub winery: String,
}

impl NewWine {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WineSummary {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WineList {
    pub wines: Vec<WineSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    pub ts: String,
    pub msg: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutAck {
    pub status: String,
}

impl PutAck {
    pub fn successful() -> Self {
        Self {
            status: "successful put".to_string(),
        }
    }
}
