use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const DEFAULT_ACCEPT_LANGUAGE: &str = "en-GB,en;q=0.9";

/// A fetched page. The status is reported, not turned into an error.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub status: u16,
}

impl FetchedPage {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Request headers sent with every fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestHeaders(BTreeMap<String, String>);

impl Default for RequestHeaders {
    fn default() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string());
        headers.insert("Accept-Language".to_string(), DEFAULT_ACCEPT_LANGUAGE.to_string());
        Self(headers)
    }
}

impl RequestHeaders {
    /// Load headers from a JSON object such as
    /// `{"User-Agent": "...", "Accept-Language": "..."}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .context(format!("Failed to open headers file: {}", path.display()))?;
        let headers: BTreeMap<String, String> = serde_json::from_reader(file)
            .context(format!("Headers file is not a JSON object of strings: {}", path.display()))?;

        for required in ["User-Agent", "Accept-Language"] {
            if !headers.keys().any(|key| key.eq_ignore_ascii_case(required)) {
                anyhow::bail!("Headers file {} has no {} entry", path.display(), required);
            }
        }

        Ok(Self(headers))
    }

    fn to_header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.0 {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .context(format!("Invalid header name: {}", name))?;
            let header_value = HeaderValue::from_str(value)
                .context(format!("Invalid value for header {}", name))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(headers: &RequestHeaders) -> Result<Self> {
        let client = Client::builder()
            .default_headers(headers.to_header_map()?)
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .context(format!("Failed to fetch {}", url))?;
        let status = response.status().as_u16();
        let body = response.text().context("Failed to read response body")?;

        Ok(FetchedPage { body, status })
    }
}
