use crate::error::ExtractError;
use crate::models::KeyInfo;
use crate::parser::{parse_cost, parse_size};
use serde_json::Value;
use tracing::debug;

const RATES: &str = "Rates";
const STAMP_DUTY: &str = "Stamp Duty";
const SIZE: &str = "Size";

/// Project the recognised `keyInfo` entries of a listing into flat fields.
///
/// Listings without `keyInfo` yield an empty [`KeyInfo`]. Entries are applied
/// in order, so a repeated tag overwrites the earlier value.
pub fn extract_key_info(property: &Value) -> Result<KeyInfo, ExtractError> {
    let entries = match property.get("keyInfo") {
        Some(Value::Array(entries)) => entries,
        Some(Value::Null) | None => return Ok(KeyInfo::default()),
        Some(other) => {
            debug!("Ignoring keyInfo that is not a list: {}", other);
            return Ok(KeyInfo::default());
        }
    };

    let mut info = KeyInfo::default();

    for entry in entries {
        match entry.get("name").and_then(Value::as_str) {
            Some(RATES) => {
                let text = entry_text(entry, ExtractError::MalformedCost)?;
                info.rates_per_annum = Some(parse_cost(text)?);
            }
            Some(STAMP_DUTY) => {
                let costs = entry.get("buyerTypeCosts");
                info.stamp_duty_first_time_buyer =
                    Some(parse_cost(buyer_cost(costs, "FIRST_TIME_BUYER")?)?);
                info.stamp_duty_home_mover = Some(parse_cost(buyer_cost(costs, "HOME_MOVER")?)?);
                info.stamp_duty_buy_to_let =
                    Some(parse_cost(buyer_cost(costs, "BUY_TO_LET_INVESTOR")?)?);
                info.stamp_duty_additional_home =
                    Some(parse_cost(buyer_cost(costs, "ADDITIONAL_HOME_BUYER")?)?);
            }
            Some(SIZE) => {
                info.size = Some(parse_size(entry_text(entry, ExtractError::UnrecognizedUnit)?)?);
            }
            Some(other) => debug!("Skipping key info entry {:?}", other),
            None => debug!("Skipping untagged key info entry"),
        }
    }

    Ok(info)
}

fn entry_text(entry: &Value, malformed: fn(String) -> ExtractError) -> Result<&str, ExtractError> {
    match entry.get("text") {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(malformed(other.to_string())),
        None => Err(ExtractError::MissingField("text")),
    }
}

fn buyer_cost<'a>(costs: Option<&'a Value>, buyer: &'static str) -> Result<&'a str, ExtractError> {
    match costs.and_then(|costs| costs.get(buyer)) {
        Some(Value::String(text)) => Ok(text),
        Some(other) => Err(ExtractError::MalformedCost(other.to_string())),
        None => Err(ExtractError::MissingField(buyer)),
    }
}
