use crate::archive::HtmlArchive;
use crate::error::ExtractError;
use crate::extract::extract_page;
use crate::fetcher::PageFetcher;
use crate::links::{new_development_urls, next_page_url};
use crate::models::{PageType, Record};
use crate::table::{self, Row, JOIN_COLUMNS};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use scraper::Html;
use serde_json::Value;
use tracing::{debug, info, warn};

pub const DEFAULT_START_URL: &str =
    "https://www.propertypal.com/property-for-sale/northern-ireland";
pub const PULL_DATE_COLUMN: &str = "last_pull_date";

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub start_url: String,
    pub output_file: String,
    pub archive_file: String,
    pub max_pages: Option<usize>,
    /// Written into the `last_pull_date` column of every new row.
    pub pull_date: String,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            output_file: "data/properties/properties.csv".to_string(),
            archive_file: "data/html/html.json".to_string(),
            max_pages: None,
            pull_date: today(),
        }
    }
}

pub fn today() -> String {
    chrono::Local::now().format("%y-%m-%d").to_string()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ScrapeSummary {
    pub pages_visited: usize,
    pub rows_added: usize,
    pub archived_pages: Vec<usize>,
    pub total_rows: usize,
}

/// Walk the search pages from `options.start_url`, following `rel="next"`
/// links, and append the joined search and property rows to the CSV.
///
/// A search page that cannot be converted is archived and skipped. A non-200
/// page is archived when it has a body, and then the walk stops. Fetch and
/// archive failures also stop the walk; rows gathered so far are still saved.
pub fn run_scrape<F: PageFetcher>(
    fetcher: &F,
    options: &ScrapingOptions,
) -> Result<ScrapeSummary> {
    let archive = HtmlArchive::new(&options.archive_file);
    let mut all_rows = table::load_table(&options.output_file)?;
    info!("Loaded {} existing rows", all_rows.len());

    let mut summary = ScrapeSummary::default();
    let mut url = options.start_url.clone();
    let mut page_number = 1;

    loop {
        if let Some(max) = options.max_pages {
            if summary.pages_visited >= max {
                info!("Reached maximum number of pages ({}), stopping", max);
                break;
            }
        }

        info!("Page {}: {}", page_number, url);
        let page = match fetcher.fetch(&url) {
            Ok(page) => page,
            Err(e) => {
                warn!("Page {} could not be fetched, stopping: {:#}", page_number, e);
                break;
            }
        };
        summary.pages_visited += 1;

        if !page.is_ok() {
            warn!("Page {} returned status {}, stopping", page_number, page.status);
            if !page.body.trim().is_empty() {
                archive_page(&archive, &mut summary, page_number, &page.body);
            }
            break;
        }

        let document = Html::parse_document(&page.body);

        match scrape_search_page(fetcher, &document) {
            Ok(mut rows) => {
                table::stamp(&mut rows, PULL_DATE_COLUMN, &options.pull_date);
                info!("Page {}: {} rows", page_number, rows.len());
                summary.rows_added += rows.len();
                all_rows.extend(rows);
            }
            Err(e) => {
                warn!("Page {} failed ({}): {:#}", page_number, error_kind(&e), e);
                if !archive_page(&archive, &mut summary, page_number, &page.body) {
                    break;
                }
            }
        }

        match next_page_url(&document, &url) {
            Ok(Some(next)) => url = next,
            Ok(None) => {
                info!("No next page after page {}", page_number);
                break;
            }
            Err(e) => {
                warn!("Page {} has an unusable next link, stopping: {:#}", page_number, e);
                break;
            }
        }
        page_number += 1;
    }

    table::save_table(&all_rows, &options.output_file)?;
    summary.total_rows = all_rows.len();

    Ok(summary)
}

/// Archive a failed page. Returns false when the archive cannot be written.
fn archive_page(
    archive: &HtmlArchive,
    summary: &mut ScrapeSummary,
    page_number: usize,
    html: &str,
) -> bool {
    match archive.save(page_number, html) {
        Ok(()) => {
            summary.archived_pages.push(page_number);
            true
        }
        Err(e) => {
            warn!("Could not archive page {}, stopping: {:#}", page_number, e);
            false
        }
    }
}

/// Rows for one search page: its history rows outer-joined with the detail
/// rows of every listing it links to.
///
/// A listing that cannot be fetched or has a malformed field is skipped. A
/// listing whose page no longer has the expected payload fails the whole
/// search page, so that it gets archived.
pub fn scrape_search_page<F: PageFetcher>(fetcher: &F, document: &Html) -> Result<Vec<Row>> {
    let search_records = extract_page(document, PageType::Search)?;
    let urls = property_urls(&search_records);
    debug!("Search page lists {} distinct properties", urls.len());

    let progress = ProgressBar::new(urls.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut property_records = Vec::new();
    for url in &urls {
        progress.set_message(url.clone());
        match scrape_property(fetcher, url) {
            Ok(records) => property_records.extend(records),
            Err(e) if is_schema_change(&e) => {
                progress.finish_and_clear();
                return Err(e.context(format!("Property page {} has no usable payload", url)));
            }
            Err(e) => warn!("Skipping property {} ({}): {:#}", url, error_kind(&e), e),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let search_rows = table::records_to_rows(&search_records)?;
    let property_rows = table::records_to_rows(&property_records)?;

    Ok(table::outer_join(&search_rows, &property_rows, &JOIN_COLUMNS))
}

/// Detail records for one listing. New-development pages are expanded into
/// one record per unit they link to.
pub fn scrape_property<F: PageFetcher>(fetcher: &F, url: &str) -> Result<Vec<Record>> {
    let page = fetcher.fetch(url)?;
    if !page.is_ok() {
        anyhow::bail!("status {} for {}", page.status, url);
    }

    let document = Html::parse_document(&page.body);
    let unit_urls = new_development_urls(&document)?;

    if unit_urls.is_empty() {
        return Ok(extract_page(&document, PageType::Property)?);
    }

    debug!("{} is a development with {} units", url, unit_urls.len());
    let mut records = Vec::new();
    for unit_url in unit_urls {
        let unit = fetcher.fetch(&unit_url)?;
        if !unit.is_ok() {
            warn!("Skipping development unit {}: status {}", unit_url, unit.status);
            continue;
        }
        records.extend(extract_page(&Html::parse_document(&unit.body), PageType::Property)?);
    }

    Ok(records)
}

/// Distinct listing URLs in first-seen order.
fn property_urls(records: &[Record]) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for record in records {
        if let Value::String(url) = record.property_url() {
            if !url.is_empty() && !urls.contains(url) {
                urls.push(url.clone());
            }
        }
    }
    urls
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReprocessSummary {
    pub rows: Vec<Row>,
    pub recovered_pages: Vec<usize>,
    pub failed_pages: Vec<usize>,
}

/// Re-run search-page extraction over every archived page.
pub fn reprocess_archive(archive: &HtmlArchive, pull_date: &str) -> Result<ReprocessSummary> {
    let mut summary = ReprocessSummary::default();

    for (page_number, html) in archive.load()? {
        let document = Html::parse_document(&html);
        match extract_page(&document, PageType::Search) {
            Ok(records) => {
                let mut rows = table::records_to_rows(&records)?;
                table::stamp(&mut rows, PULL_DATE_COLUMN, pull_date);
                info!("Archived page {}: recovered {} rows", page_number, rows.len());
                summary.rows.extend(rows);
                summary.recovered_pages.push(page_number);
            }
            Err(e) => {
                warn!("Archived page {} still fails ({}): {}", page_number, e.kind(), e);
                summary.failed_pages.push(page_number);
            }
        }
    }

    Ok(summary)
}

/// Reprocess the archive, append the recovered rows to `output_file` and
/// drop the recovered pages from the archive, so a second run adds nothing.
pub fn recover_archive(
    archive: &HtmlArchive,
    output_file: &str,
    pull_date: &str,
) -> Result<ReprocessSummary> {
    let summary = reprocess_archive(archive, pull_date)?;
    if summary.recovered_pages.is_empty() {
        return Ok(summary);
    }

    let mut rows = table::load_table(output_file)?;
    rows.extend(summary.rows.iter().cloned());
    table::save_table(&rows, output_file)?;

    archive.remove(&summary.recovered_pages)?;
    Ok(summary)
}

fn is_schema_change(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<ExtractError>()
        .is_some_and(ExtractError::is_schema_change)
}

fn error_kind(error: &anyhow::Error) -> &'static str {
    match error.downcast_ref::<ExtractError>() {
        Some(e) if e.is_schema_change() => "schema change",
        Some(e) => e.kind(),
        None => "fetch",
    }
}
