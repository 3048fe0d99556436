use anyhow::{Context, Result};
use reqwest::Url;
use scraper::{Html, Selector};

pub const SITE_ROOT: &str = "https://www.propertypal.com";

/// The page the `<link rel="next">` tag points at, if any.
pub fn next_page_url(document: &Html, current_url: &str) -> Result<Option<String>> {
    let next_selector = Selector::parse(r#"link[rel="next"][href]"#)
        .map_err(|e| anyhow::anyhow!("Failed to parse next link selector: {:?}", e))?;

    match document.select(&next_selector).next() {
        Some(link) => {
            let href = link.value().attr("href").unwrap_or_default();
            Ok(Some(absolute_url(current_url, href)?))
        }
        None => Ok(None),
    }
}

/// Unit pages listed on a new-development page. Each unit is linked by an
/// anchor wrapping a `<strong>` element; ordinary property pages have none.
pub fn new_development_urls(document: &Html) -> Result<Vec<String>> {
    let link_selector = Selector::parse("a[href]")
        .map_err(|e| anyhow::anyhow!("Failed to parse link selector: {:?}", e))?;
    let strong_selector = Selector::parse("strong")
        .map_err(|e| anyhow::anyhow!("Failed to parse strong selector: {:?}", e))?;

    let mut urls = Vec::new();
    for anchor in document.select(&link_selector) {
        if anchor.select(&strong_selector).next().is_none() {
            continue;
        }
        if let Some(href) = anchor.value().attr("href") {
            urls.push(absolute_url(SITE_ROOT, href)?);
        }
    }

    Ok(urls)
}

fn absolute_url(base: &str, href: &str) -> Result<String> {
    if href.starts_with("http") {
        return Ok(href.to_string());
    }

    let base = Url::parse(base).context(format!("Invalid base URL: {}", base))?;
    let joined = base
        .join(href)
        .context(format!("Failed to resolve link {} against {}", href, base))?;
    Ok(joined.to_string())
}
