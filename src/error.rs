//! Errors produced while turning a page into records.

use crate::models::PageType;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    #[error("page type must be either `search` or `property`, got `{0}`")]
    InvalidPageType(String),
    #[error("no application/json script tag contained valid JSON")]
    MissingPayload,
    #[error("{page_type} payload has nothing usable at {pointer}")]
    SchemaMismatch {
        page_type: PageType,
        pointer: &'static str,
    },
    #[error("malformed cost string: {0:?}")]
    MalformedCost(String),
    #[error("unrecognized size unit: {0:?}")]
    UnrecognizedUnit(String),
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),
}

impl ExtractError {
    /// True when the embedded payload itself changed shape (or vanished),
    /// which is when keeping the raw page around for reprocessing pays off.
    pub fn is_schema_change(&self) -> bool {
        matches!(self, Self::MissingPayload | Self::SchemaMismatch { .. })
    }

    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPageType(_) => "invalid_page_type",
            Self::MissingPayload => "missing_payload",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::MalformedCost(_) => "malformed_cost",
            Self::UnrecognizedUnit(_) => "unrecognized_unit",
            Self::MissingField(_) => "missing_field",
        }
    }
}
