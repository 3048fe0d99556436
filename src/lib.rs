//! Scraper for propertypal.com listings.
//!
//! The core ([`extract`], [`flatten`] and the modules they use) turns one
//! parsed page into flat records without doing any I/O. [`pipeline`] wires it
//! to an HTTP fetcher, a raw-page archive and a CSV table.

pub mod archive;
pub mod description;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod fields;
pub mod flatten;
pub mod key_info;
pub mod links;
pub mod logging;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod table;

pub use error::ExtractError;
pub use extract::{extract_records, extract_records_from_html};
pub use flatten::{flatten, Flattener};
pub use models::{PageType, Record};
