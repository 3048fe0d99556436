use anyhow::Result;
use clap::Parser;
use palfinder::archive::HtmlArchive;
use palfinder::logging;
use palfinder::pipeline::{self, today};
use tracing::info;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Re-run extraction over archived search pages")]
struct Args {
    /// JSON file of archived raw HTML
    #[clap(short, long, default_value = "data/html/html.json")]
    archive: String,

    /// CSV file the recovered rows are appended to. Recovered pages are then
    /// dropped from the archive
    #[clap(short, long, default_value = "data/properties/properties.csv")]
    output: String,

    /// Only report what would be recovered; leave the CSV and archive alone
    #[clap(long)]
    dry_run: bool,

    /// Enable debug output
    #[clap(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.debug);

    let archive = HtmlArchive::new(&args.archive);
    let summary = if args.dry_run {
        pipeline::reprocess_archive(&archive, &today())?
    } else {
        pipeline::recover_archive(&archive, &args.output, &today())?
    };

    info!(
        "Recovered {} rows from {} pages; {} pages still failing",
        summary.rows.len(),
        summary.recovered_pages.len(),
        summary.failed_pages.len()
    );

    Ok(())
}
