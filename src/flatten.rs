use crate::description::{clean_description, CaseBoundarySplitter, ParagraphSplitter};
use crate::error::ExtractError;
use crate::fields::{get_or, nested_or_empty, text_or_empty};
use crate::key_info::extract_key_info;
use crate::models::{PageType, PriceHistoryEntry, PropertyRecord, Record, SearchRecord};
use serde_json::Value;

const PRICE_ON_APPLICATION: &str = "POA";

/// Turns listing objects from a page payload into flat records.
#[derive(Debug, Clone, Default)]
pub struct Flattener<S = CaseBoundarySplitter> {
    splitter: S,
}

impl Flattener<CaseBoundarySplitter> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: ParagraphSplitter> Flattener<S> {
    pub fn with_splitter(splitter: S) -> Self {
        Self { splitter }
    }

    pub fn flatten(
        &self,
        property: &Value,
        page_type: PageType,
    ) -> Result<Vec<Record>, ExtractError> {
        match page_type {
            PageType::Search => Ok(search_records(property)
                .into_iter()
                .map(Record::Search)
                .collect()),
            PageType::Property => Ok(vec![Record::Property(self.property_record(property)?)]),
        }
    }

    fn property_record(&self, property: &Value) -> Result<PropertyRecord, ExtractError> {
        let text_description = property
            .get("briefText")
            .cloned()
            .ok_or(ExtractError::MissingField("briefText"))?;
        let key_info = extract_key_info(property)?;

        Ok(PropertyRecord {
            id: text_or_empty(property, "id"),
            path_id: text_or_empty(property, "pathId"),
            property_url: get_or(property, "shareURL", Value::Null),
            name: text_or_empty(property, "name"),
            address: text_or_empty(property, "displayAddress"),
            building_name: text_or_empty(property, "buildingName"),
            house_number: text_or_empty(property, "houseNumber"),
            street: text_or_empty(property, "street"),
            address_line_1: text_or_empty(property, "addressLine1"),
            address_line_2: text_or_empty(property, "addressLine2"),
            town: text_or_empty(property, "town"),
            region: text_or_empty(property, "region"),
            postcode: text_or_empty(property, "postcode"),
            country_code: text_or_empty(property, "countryCode"),
            latitude: nested_or_empty(property, "coordinate", "latitude"),
            longitude: nested_or_empty(property, "coordinate", "longitude"),
            min_price: nested_or_empty(property, "price", "minPrice"),
            max_price: nested_or_empty(property, "price", "maxPrice"),
            price: nested_or_empty(property, "price", "price"),
            property_type: nested_or_empty(property, "propertyType", "key"),
            property_style: nested_or_empty(property, "style", "key"),
            furnished_type: text_or_empty(property, "furnishedType"),
            num_bedrooms: text_or_empty(property, "numBedrooms"),
            num_bathrooms: text_or_empty(property, "numBathrooms"),
            num_reception_rooms: text_or_empty(property, "numReceptionRooms"),
            sale_type: nested_or_empty(property, "saleType", "key"),
            epc_rating: nested_or_empty(property, "epc", "ratingShorthand"),
            co2_rating: nested_or_empty(property, "epc", "co2RatingShorthand"),
            organisation: nested_or_empty(property, "account", "organisation"),
            developer: nested_or_empty(property, "account", "developer"),
            agent: nested_or_empty(property, "account", "organisation"),
            development_status: nested_or_empty(property, "developmentStatus", "key"),
            text_description,
            description: clean_description(property, &self.splitter),
            images: image_urls(property),
            first_posted: text_or_empty(property, "activationTime"),
            last_updated: text_or_empty(property, "listingUpdatedTime"),
            key_info,
        })
    }
}

/// Flatten one listing object, with `page_type` given as `"search"` or
/// `"property"`.
pub fn flatten(property: &Value, page_type: &str) -> Result<Vec<Record>, ExtractError> {
    let page_type: PageType = page_type.parse()?;
    flatten_property(property, page_type)
}

pub fn flatten_property(
    property: &Value,
    page_type: PageType,
) -> Result<Vec<Record>, ExtractError> {
    Flattener::new().flatten(property, page_type)
}

fn search_records(property: &Value) -> Vec<SearchRecord> {
    let identity = |history: Option<PriceHistoryEntry>| SearchRecord {
        id: text_or_empty(property, "id"),
        path_id: text_or_empty(property, "pathId"),
        property_url: get_or(property, "shareURL", Value::Null),
        history,
    };

    match property.get("history").and_then(Value::as_array) {
        Some(updates) if !updates.is_empty() => updates
            .iter()
            .map(|update| identity(Some(history_entry(update))))
            .collect(),
        _ => vec![identity(None)],
    }
}

fn history_entry(update: &Value) -> PriceHistoryEntry {
    PriceHistoryEntry {
        price: get_or(update, "price", Value::String(PRICE_ON_APPLICATION.to_string())),
        price_difference: text_or_empty(update, "difference"),
        price_percentage_difference: text_or_empty(update, "differencePercentage"),
        status: nested_or_empty(update, "status", "key"),
        time_modified: text_or_empty(update, "timeModified"),
    }
}

fn image_urls(property: &Value) -> Vec<String> {
    property
        .get("images")
        .and_then(Value::as_array)
        .map(|images| {
            images
                .iter()
                .filter_map(|image| image.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> Value {
        json!({
            "id": 901234,
            "pathId": "4-bed-detached-house",
            "shareURL": "https://www.propertypal.com/4-bed/901234",
            "briefText": "Four bedroom detached house",
            "displayAddress": "12 Main Street, Comber",
            "town": "Comber",
            "coordinate": {"latitude": 54.55, "longitude": -5.74},
            "price": {"price": 250000, "minPrice": null},
            "propertyType": {"key": "detached"},
            "numBedrooms": 4,
            "epc": {"ratingShorthand": "C69"},
            "account": {"organisation": "Hunter Estates", "developer": ""},
            "description": "<p>Bright hallway</p><p>Kitchen with island</p>",
            "images": [
                {"url": "https://img/1.jpg"},
                {"caption": "floor plan"},
                {"url": "https://img/2.jpg"}
            ],
            "keyInfo": [{"name": "Rates", "text": "£1,100pa"}],
            "activationTime": 1690000000000u64
        })
    }

    #[test]
    fn unknown_page_type_is_rejected() {
        assert_eq!(
            flatten(&listing(), "detail"),
            Err(ExtractError::InvalidPageType("detail".to_string()))
        );
    }

    #[test]
    fn search_listing_expands_history() {
        let property = json!({
            "id": 7,
            "pathId": "semi",
            "shareURL": "https://www.propertypal.com/semi/7",
            "history": [
                {"price": 150000, "difference": 0, "differencePercentage": 0,
                 "status": {"key": "forSale"}, "timeModified": 1},
                {"difference": -5000, "differencePercentage": -3.3,
                 "status": {"key": "priceChange"}, "timeModified": 2}
            ]
        });

        let records = flatten(&property, "search").unwrap();
        assert_eq!(records.len(), 2);

        let Record::Search(first) = &records[0] else { panic!("expected search record") };
        let Record::Search(second) = &records[1] else { panic!("expected search record") };
        assert_eq!(first.id, second.id);
        assert_eq!(first.property_url, second.property_url);

        let first = first.history.as_ref().unwrap();
        let second = second.history.as_ref().unwrap();
        assert_eq!(first.price, json!(150000));
        assert_eq!(first.status, json!("forSale"));
        assert_eq!(second.price, json!("POA"));
        assert_eq!(second.price_difference, json!(-5000));
        assert_eq!(second.time_modified, json!(2));
    }

    #[test]
    fn search_listing_without_history_is_identity_only() {
        for property in [
            json!({"id": 7, "pathId": "semi"}),
            json!({"id": 7, "pathId": "semi", "history": []}),
        ] {
            let records = flatten(&property, "search").unwrap();
            assert_eq!(
                records,
                vec![Record::Search(SearchRecord {
                    id: json!(7),
                    path_id: json!("semi"),
                    property_url: Value::Null,
                    history: None,
                })]
            );
        }
    }

    #[test]
    fn property_listing_builds_full_record() {
        let records = flatten(&listing(), "property").unwrap();
        assert_eq!(records.len(), 1);

        let Record::Property(record) = &records[0] else { panic!("expected property record") };
        assert_eq!(record.id, json!(901234));
        assert_eq!(record.latitude, json!(54.55));
        assert_eq!(record.price, json!(250000));
        assert_eq!(record.min_price, Value::Null);
        assert_eq!(record.max_price, json!(""));
        assert_eq!(record.property_style, json!(""));
        assert_eq!(record.epc_rating, json!("C69"));
        assert_eq!(record.co2_rating, json!(""));
        assert_eq!(record.agent, json!("Hunter Estates"));
        assert_eq!(record.organisation, record.agent);
        assert_eq!(record.postcode, json!(""));
        assert_eq!(record.description, "Bright hallway\nKitchen with island");
        assert_eq!(record.images, vec!["https://img/1.jpg", "https://img/2.jpg"]);
        assert_eq!(record.key_info.rates_per_annum, Some(1100.0));
        assert_eq!(record.key_info.size, None);
        assert_eq!(record.last_updated, json!(""));
    }

    #[test]
    fn property_listing_requires_brief_text() {
        let mut property = listing();
        property.as_object_mut().unwrap().remove("briefText");

        assert_eq!(
            flatten(&property, "property"),
            Err(ExtractError::MissingField("briefText"))
        );
    }

    #[test]
    fn malformed_images_give_empty_list() {
        let mut property = listing();
        property["images"] = json!("not a list");

        let records = flatten(&property, "property").unwrap();
        let Record::Property(record) = &records[0] else { panic!("expected property record") };
        assert!(record.images.is_empty());
    }

    #[test]
    fn custom_splitter_is_used() {
        struct Unchanged;
        impl ParagraphSplitter for Unchanged {
            fn split(&self, text: &str) -> String {
                text.to_string()
            }
        }

        let records = Flattener::with_splitter(Unchanged)
            .flatten(&listing(), PageType::Property)
            .unwrap();
        let Record::Property(record) = &records[0] else { panic!("expected property record") };
        assert_eq!(record.description, "Bright hallwayKitchen with island");
    }
}
