use anyhow::Result;
use clap::Parser;
use palfinder::fetcher::{HttpFetcher, RequestHeaders};
use palfinder::logging;
use palfinder::pipeline::{self, ScrapingOptions, DEFAULT_START_URL};
use tracing::info;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Palfinder - PropertyPal listing scraper for Northern Ireland")]
struct Args {
    /// Search page to start from
    #[clap(short, long, default_value = DEFAULT_START_URL)]
    url: String,

    /// Path to output CSV file
    #[clap(short, long, default_value = "data/properties/properties.csv")]
    output: String,

    /// JSON file collecting the raw HTML of pages that failed to convert
    #[clap(short, long, default_value = "data/html/html.json")]
    archive: String,

    /// JSON object of request headers (needs User-Agent and Accept-Language)
    #[clap(long)]
    headers: Option<String>,

    /// Maximum number of search pages to scrape (if not set, follow every next link)
    #[clap(short, long)]
    max_pages: Option<usize>,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    let headers = match &args.headers {
        Some(path) => RequestHeaders::load(path)?,
        None => RequestHeaders::default(),
    };
    let fetcher = HttpFetcher::new(&headers)?;

    let options = ScrapingOptions {
        start_url: args.url,
        output_file: args.output,
        archive_file: args.archive,
        max_pages: args.max_pages,
        ..ScrapingOptions::default()
    };

    let started = std::time::Instant::now();
    let summary = pipeline::run_scrape(&fetcher, &options)?;

    info!("=== Summary ===");
    info!("Search pages visited: {}", summary.pages_visited);
    info!("New rows: {}", summary.rows_added);
    if !summary.archived_pages.is_empty() {
        info!(
            "Pages archived to {}: {:?}",
            options.archive_file, summary.archived_pages
        );
    }
    info!("Total rows in {}: {}", options.output_file, summary.total_rows);
    info!("Finished in {:.1}s", started.elapsed().as_secs_f64());

    Ok(())
}
