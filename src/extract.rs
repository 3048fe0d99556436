//! Locating the JSON payload embedded in a page and flattening it.

use crate::description::ParagraphSplitter;
use crate::error::ExtractError;
use crate::flatten::Flattener;
use crate::models::{PageType, Record};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

const JSON_SCRIPT_SELECTOR: &str = r#"script[type="application/json"]"#;
const SEARCH_RESULTS_POINTER: &str = "/props/pageProps/initialState/properties/data/results";
const PROPERTY_POINTER: &str = "/props/pageProps/property";

/// Extract every record from a parsed page, with `page_type` given as
/// `"search"` or `"property"`.
///
/// The page type is checked before the document is looked at.
pub fn extract_records(document: &Html, page_type: &str) -> Result<Vec<Record>, ExtractError> {
    let page_type: PageType = page_type.parse()?;
    extract_page(document, page_type)
}

/// Same as [`extract_records`], parsing the HTML first.
pub fn extract_records_from_html(
    html: &str,
    page_type: &str,
) -> Result<Vec<Record>, ExtractError> {
    let page_type: PageType = page_type.parse()?;
    extract_page(&Html::parse_document(html), page_type)
}

pub fn extract_page(document: &Html, page_type: PageType) -> Result<Vec<Record>, ExtractError> {
    extract_page_with(&Flattener::new(), document, page_type)
}

pub fn extract_page_with<S: ParagraphSplitter>(
    flattener: &Flattener<S>,
    document: &Html,
    page_type: PageType,
) -> Result<Vec<Record>, ExtractError> {
    let payload = find_payload(document)?;

    match page_type {
        PageType::Search => {
            let results = payload
                .pointer(SEARCH_RESULTS_POINTER)
                .and_then(Value::as_array)
                .ok_or(ExtractError::SchemaMismatch {
                    page_type,
                    pointer: SEARCH_RESULTS_POINTER,
                })?;

            let mut records = Vec::new();
            for property in results {
                records.extend(flattener.flatten(property, page_type)?);
            }
            debug!("Flattened {} search results into {} records", results.len(), records.len());
            Ok(records)
        }
        PageType::Property => {
            let property = payload
                .pointer(PROPERTY_POINTER)
                .filter(|property| property.is_object())
                .ok_or(ExtractError::SchemaMismatch {
                    page_type,
                    pointer: PROPERTY_POINTER,
                })?;

            flattener.flatten(property, page_type)
        }
    }
}

/// The last `application/json` script in the page whose body parses.
pub fn find_payload(document: &Html) -> Result<Value, ExtractError> {
    let script_selector = Selector::parse(JSON_SCRIPT_SELECTOR).expect("valid script selector");

    let candidates: Vec<Value> = document
        .select(&script_selector)
        .filter_map(|script| serde_json::from_str(&script.text().collect::<String>()).ok())
        .collect();

    if candidates.len() > 1 {
        debug!(
            "Found {} JSON payloads, keeping the last and discarding {}",
            candidates.len(),
            candidates.len() - 1
        );
    }

    candidates.into_iter().last().ok_or(ExtractError::MissingPayload)
}
