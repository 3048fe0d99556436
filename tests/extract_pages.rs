use palfinder::models::{PageType, Record};
use palfinder::{extract_records, extract_records_from_html, ExtractError};
use scraper::Html;
use serde_json::{json, Value};

fn page_with_payload(payload: &Value) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <link rel="next" href="/property-for-sale/northern-ireland/page-2">
  <script type="application/json">{{"analytics": true}}</script>
  <script>window.dataLayer = [];</script>
  <script id="__NEXT_DATA__" type="application/json">{}</script>
</head>
<body><h1>Property for sale</h1></body>
</html>"#,
        payload
    )
}

fn search_payload(results: Value) -> Value {
    json!({
        "props": {"pageProps": {"initialState": {"properties": {"data": {"results": results}}}}}
    })
}

fn property_payload(property: Value) -> Value {
    json!({"props": {"pageProps": {"property": property}}})
}

#[test]
fn search_page_with_history_yields_one_record_per_entry() {
    let html = page_with_payload(&search_payload(json!([{
        "id": 881234,
        "pathId": "17-ballyhackamore-road-belfast",
        "shareURL": "https://www.propertypal.com/17-ballyhackamore-road-belfast/881234",
        "history": [
            {"price": 325000, "difference": 0, "differencePercentage": 0,
             "status": {"key": "forSale"}, "timeModified": 1693526400000u64},
            {"price": 315000, "difference": -10000, "differencePercentage": -3.08,
             "status": {"key": "priceChange"}, "timeModified": 1696118400000u64}
        ]
    }])));

    let records = extract_records(&Html::parse_document(&html), "search").unwrap();
    assert_eq!(records.len(), 2);

    let (Record::Search(first), Record::Search(second)) = (&records[0], &records[1]) else {
        panic!("expected search records");
    };
    assert_eq!(
        (&first.id, &first.path_id, &first.property_url),
        (&second.id, &second.path_id, &second.property_url)
    );

    let first = first.history.as_ref().unwrap();
    let second = second.history.as_ref().unwrap();
    assert_eq!(first.price, json!(325000));
    assert_eq!(second.price, json!(315000));
    assert_eq!(second.price_difference, json!(-10000));
    assert_eq!(second.status, json!("priceChange"));
}

#[test]
fn search_page_without_history_yields_identity_only_record() {
    let html = page_with_payload(&search_payload(json!([{
        "id": 5, "pathId": "site-5", "shareURL": "https://www.propertypal.com/site-5/5"
    }])));

    let records = extract_records(&Html::parse_document(&html), "search").unwrap();
    assert_eq!(records.len(), 1);

    let row = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(
        row,
        json!({
            "id": 5,
            "path_id": "site-5",
            "property_url": "https://www.propertypal.com/site-5/5"
        })
    );
}

#[test]
fn search_results_keep_document_order() {
    let html = page_with_payload(&search_payload(json!([
        {"id": 1, "history": [{"timeModified": 1}, {"timeModified": 2}]},
        {"id": 2},
        {"id": 3, "history": [{"timeModified": 3}]}
    ])));

    let records = extract_records_from_html(&html, "search").unwrap();
    let ids: Vec<&Value> = records.iter().map(Record::id).collect();
    assert_eq!(ids, vec![&json!(1), &json!(1), &json!(2), &json!(3)]);
}

#[test]
fn property_page_yields_single_detail_record() {
    let html = page_with_payload(&property_payload(json!({
        "id": 901234,
        "pathId": "apartment-4-the-quays-newry",
        "shareURL": "https://www.propertypal.com/apartment-4-the-quays-newry/901234",
        "briefText": "Two bedroom apartment",
        "description": "<p>Open plan living</p><p>Allocated parking</p>",
        "postcode": "BT34 1AB",
        "numBedrooms": 2,
        "images": [
            {"url": "https://img.propertypal.com/1.jpg"},
            {"url": "https://img.propertypal.com/2.jpg"}
        ],
        "keyInfo": [
            {"name": "Rates", "text": "£1,234.50pa (approx)"},
            {"name": "Size", "text": "120.5 sq. metres"},
            {"name": "Tenure", "text": "Leasehold"}
        ]
    })));

    let records = extract_records_from_html(&html, "property").unwrap();
    assert_eq!(records.len(), 1);

    let row = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(row["postcode"], json!("BT34 1AB"));
    assert_eq!(row["num_bedrooms"], json!(2));
    assert_eq!(row["text_description"], json!("Two bedroom apartment"));
    assert_eq!(row["description"], json!("Open plan living\nAllocated parking"));
    assert_eq!(
        row["images"],
        json!(["https://img.propertypal.com/1.jpg", "https://img.propertypal.com/2.jpg"])
    );
    assert_eq!(row["rates_per_annum"], json!(1234.5));
    assert_eq!(row["size"], json!(120.5));
    assert_eq!(row["latitude"], json!(""));
    assert!(row.get("stamp_duty_home_mover").is_none());
}

#[test]
fn stamp_duty_without_all_buyer_types_fails() {
    let html = page_with_payload(&property_payload(json!({
        "id": 1,
        "briefText": "Bungalow",
        "keyInfo": [{"name": "Stamp Duty", "buyerTypeCosts": {
            "FIRST_TIME_BUYER": "£0pa", "HOME_MOVER": "£500pa", "BUY_TO_LET_INVESTOR": "£3,500pa"
        }}]
    })));

    assert_eq!(
        extract_records_from_html(&html, "property"),
        Err(ExtractError::MissingField("ADDITIONAL_HOME_BUYER"))
    );
}

#[test]
fn invalid_page_type_fails_before_scanning() {
    // Would fail with MissingPayload if it were scanned.
    let poisoned = Html::parse_document("<html><body><script>not json</script></body></html>");

    assert_eq!(
        extract_records(&poisoned, "invalid"),
        Err(ExtractError::InvalidPageType("invalid".to_string()))
    );
}

#[test]
fn page_without_json_scripts_is_missing_payload() {
    let html = "<html><head><script>var x = 1;</script></head><body></body></html>";
    let err = extract_records_from_html(html, "search").unwrap_err();

    assert_eq!(err, ExtractError::MissingPayload);
    assert!(err.is_schema_change());
}

#[test]
fn search_payload_on_property_page_is_schema_mismatch() {
    let html = page_with_payload(&search_payload(json!([])));
    let err = extract_records_from_html(&html, "property").unwrap_err();

    assert!(matches!(err, ExtractError::SchemaMismatch { page_type: PageType::Property, .. }));
    assert!(err.is_schema_change());
}

#[test]
fn malformed_field_is_not_a_schema_change() {
    let html = page_with_payload(&property_payload(json!({
        "briefText": "Site",
        "keyInfo": [{"name": "Rates", "text": "Ask agent"}]
    })));

    let err = extract_records_from_html(&html, "property").unwrap_err();
    assert!(matches!(err, ExtractError::MalformedCost(_)));
    assert!(!err.is_schema_change());
}

#[test]
fn extraction_is_repeatable() {
    let html = page_with_payload(&search_payload(json!([
        {"id": 1, "shareURL": "https://www.propertypal.com/a/1",
         "history": [{"price": 1}, {"price": 2}]},
        {"id": 2}
    ])));
    let document = Html::parse_document(&html);

    let first = serde_json::to_string(&extract_records(&document, "search").unwrap()).unwrap();
    let second = serde_json::to_string(&extract_records(&document, "search").unwrap()).unwrap();
    assert_eq!(first, second);
}
