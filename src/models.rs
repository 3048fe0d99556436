use crate::error::ExtractError;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Which kind of page a document is, and therefore where its payload lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Search,
    Property,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Search => "search",
            PageType::Property => "property",
        }
    }
}

impl FromStr for PageType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "search" => Ok(PageType::Search),
            "property" => Ok(PageType::Property),
            other => Err(ExtractError::InvalidPageType(other.to_string())),
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a listing's price history, as shown on search pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistoryEntry {
    /// `"POA"` when the site did not publish a price.
    pub price: Value,
    pub price_difference: Value,
    pub price_percentage_difference: Value,
    pub status: Value,
    pub time_modified: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRecord {
    pub id: Value,
    pub path_id: Value,
    pub property_url: Value,
    #[serde(flatten)]
    pub history: Option<PriceHistoryEntry>,
}

/// Fields projected out of a listing's `keyInfo` entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KeyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates_per_annum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp_duty_first_time_buyer: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp_duty_home_mover: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp_duty_buy_to_let: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamp_duty_additional_home: Option<f64>,
    /// Square metres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

impl KeyInfo {
    pub fn is_empty(&self) -> bool {
        *self == KeyInfo::default()
    }
}

/// Everything a property page says about a single listing.
///
/// Pass-through fields keep whatever JSON value the site sent; absent ones
/// hold an empty string (`property_url` holds null instead).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRecord {
    pub id: Value,
    pub path_id: Value,
    pub property_url: Value,
    pub name: Value,
    pub address: Value,
    pub building_name: Value,
    pub house_number: Value,
    pub street: Value,
    pub address_line_1: Value,
    pub address_line_2: Value,
    pub town: Value,
    pub region: Value,
    pub postcode: Value,
    pub country_code: Value,
    pub latitude: Value,
    pub longitude: Value,
    pub min_price: Value,
    pub max_price: Value,
    pub price: Value,
    pub property_type: Value,
    pub property_style: Value,
    pub furnished_type: Value,
    pub num_bedrooms: Value,
    pub num_bathrooms: Value,
    pub num_reception_rooms: Value,
    pub sale_type: Value,
    pub epc_rating: Value,
    pub co2_rating: Value,
    pub organisation: Value,
    pub developer: Value,
    pub agent: Value,
    pub development_status: Value,
    pub text_description: Value,
    pub description: String,
    pub images: Vec<String>,
    pub first_posted: Value,
    pub last_updated: Value,
    #[serde(flatten)]
    pub key_info: KeyInfo,
}

/// A flat row produced from one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    Search(SearchRecord),
    Property(PropertyRecord),
}

impl Record {
    pub fn id(&self) -> &Value {
        match self {
            Record::Search(r) => &r.id,
            Record::Property(r) => &r.id,
        }
    }

    pub fn path_id(&self) -> &Value {
        match self {
            Record::Search(r) => &r.path_id,
            Record::Property(r) => &r.path_id,
        }
    }

    pub fn property_url(&self) -> &Value {
        match self {
            Record::Search(r) => &r.property_url,
            Record::Property(r) => &r.property_url,
        }
    }
}
