use crate::error::ExtractError;

const SQ_FEET_TO_SQ_METRES: f64 = 0.092903;

/// Parse a yearly cost such as `"£1,234.50pa (approx)"` into `1234.5`.
pub fn parse_cost(text: &str) -> Result<f64, ExtractError> {
    let (_, after_currency) = text
        .split_once('£')
        .ok_or_else(|| ExtractError::MalformedCost(text.to_string()))?;

    let amount = match after_currency.split_once("pa") {
        Some((amount, _)) => amount,
        None => after_currency,
    };

    let amount: String = amount
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    amount
        .parse::<f64>()
        .map_err(|_| ExtractError::MalformedCost(text.to_string()))
}

/// Parse a floor area such as `"1,000 sq. feet"` into square metres.
pub fn parse_size(text: &str) -> Result<f64, ExtractError> {
    let cleaned = text.replace(',', "");

    let (number, factor) = if cleaned.contains("metres") {
        (leading_part(&cleaned, "sq. metres"), 1.0)
    } else if cleaned.contains("feet") {
        (leading_part(&cleaned, "sq. feet"), SQ_FEET_TO_SQ_METRES)
    } else {
        return Err(ExtractError::UnrecognizedUnit(text.to_string()));
    };

    number
        .trim()
        .parse::<f64>()
        .map(|value| value * factor)
        .map_err(|_| ExtractError::UnrecognizedUnit(text.to_string()))
}

fn leading_part<'a>(text: &'a str, unit: &str) -> &'a str {
    text.split(unit).next().unwrap_or(text)
}
