use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Raw HTML of pages that could not be converted, stored as one JSON object
/// keyed by page number so they can be reprocessed later.
#[derive(Debug, Clone)]
pub struct HtmlArchive {
    path: PathBuf,
}

impl HtmlArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Store `html` under `page_number`, replacing any earlier copy.
    pub fn save(&self, page_number: usize, html: &str) -> Result<()> {
        let mut pages = self.read_raw()?;
        pages.insert(page_number.to_string(), html.to_string());
        self.write_raw(&pages)?;

        info!("Archived raw HTML of page {} to {}", page_number, self.path.display());
        Ok(())
    }

    /// Drop the given pages. Pages that are not archived are ignored.
    pub fn remove(&self, page_numbers: &[usize]) -> Result<()> {
        if page_numbers.is_empty() {
            return Ok(());
        }

        let mut pages = self.read_raw()?;
        let before = pages.len();
        pages.retain(|key, _| {
            key.parse::<usize>()
                .map_or(true, |page| !page_numbers.contains(&page))
        });

        if pages.len() != before {
            self.write_raw(&pages)?;
            info!("Removed {} pages from {}", before - pages.len(), self.path.display());
        }
        Ok(())
    }

    /// Every archived page, ordered by page number. Keys that are not
    /// numbers are skipped.
    pub fn load(&self) -> Result<BTreeMap<usize, String>> {
        Ok(self
            .read_raw()?
            .into_iter()
            .filter_map(|(key, html)| key.parse().ok().map(|page| (page, html)))
            .collect())
    }

    fn read_raw(&self) -> Result<HashMap<String, String>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(e)
                    .context(format!("Failed to open archive file: {}", self.path.display()))
            }
        };

        serde_json::from_reader(file)
            .context(format!("Archive file is not a JSON object of pages: {}", self.path.display()))
    }

    fn write_raw(&self, pages: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create archive directory: {}", parent.display()))?;
        }

        let file = File::create(&self.path)
            .context(format!("Failed to create archive file: {}", self.path.display()))?;
        serde_json::to_writer(file, pages)
            .context(format!("Failed to write archive file: {}", self.path.display()))
    }
}
