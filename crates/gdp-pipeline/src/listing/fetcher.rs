//! Directory listing fetch and parse

use gdp_common::{PipelineError, Result};
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;

use crate::config::MirrorConfig;

/// Fetches the dataset directory index and extracts matching filenames
pub struct ListingFetcher {
    client: Client,
    listing_url: String,
    pattern: Regex,
}

impl ListingFetcher {
    pub fn new(config: &MirrorConfig) -> Result<Self> {
        let pattern = Regex::new(&config.file_pattern).map_err(|e| {
            PipelineError::Config(format!("invalid file pattern '{}': {}", config.file_pattern, e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            listing_url: config.listing_url.clone(),
            pattern,
        })
    }

    /// Fetch the index and return matching filenames in document order
    ///
    /// An empty vector is a valid result (the listing had no matching
    /// entries); transport errors and non-success statuses are fatal, since
    /// a partial listing downstream would delete files that still exist.
    pub async fn fetch_file_names(&self) -> Result<Vec<String>> {
        debug!("Fetching directory listing from: {}", self.listing_url);

        let response = self.client.get(&self.listing_url).send().await.map_err(|e| {
            PipelineError::Fetch(format!("listing request to {} failed: {}", self.listing_url, e))
        })?;

        if !response.status().is_success() {
            return Err(PipelineError::Fetch(format!(
                "listing request to {} returned {}",
                self.listing_url,
                response.status()
            )));
        }

        let html = response.text().await.map_err(|e| {
            PipelineError::Fetch(format!("failed to read listing body: {}", e))
        })?;

        let names = parse_listing(&html, &self.pattern);
        debug!("Listing contained {} matching files", names.len());

        Ok(names)
    }
}

/// Extract dataset filenames from listing HTML
///
/// Takes the basename of every anchor href and keeps those matching the
/// family pattern, deduplicated, in document order.
pub fn parse_listing(html: &str, pattern: &Regex) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("a").unwrap();

    let mut names: Vec<String> = Vec::new();

    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href") {
            let basename = href.trim_end_matches('/').rsplit('/').next().unwrap_or(href);

            if pattern.is_match(basename) && !names.iter().any(|n| n == basename) {
                names.push(basename.to_string());
            }
        }
    }

    names
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn family_pattern() -> Regex {
        Regex::new(r"^pr\.[A-Za-z0-9._-]+$").unwrap()
    }

    #[test]
    fn test_parse_listing_extracts_family_files() {
        let html = r#"
            <html>
            <body>
                <A HREF="/pub/time.series/pr/pr.class">pr.class</A><br>
                <A HREF="/pub/time.series/pr/pr.data.1.AllData">pr.data.1.AllData</A><br>
                <A HREF="/pub/time.series/pr/pr.txt">pr.txt</A><br>
                <A HREF="/pub/time.series/">Parent Directory</A>
            </body>
            </html>
        "#;

        let names = parse_listing(html, &family_pattern());
        assert_eq!(names, vec!["pr.class", "pr.data.1.AllData", "pr.txt"]);
    }

    #[test]
    fn test_parse_listing_ignores_other_families() {
        let html = r#"
            <a href="/pub/time.series/pr/pr.class">pr.class</a>
            <a href="/pub/time.series/cu/cu.data.1">cu.data.1</a>
            <a href="README.txt">README.txt</a>
        "#;

        let names = parse_listing(html, &family_pattern());
        assert_eq!(names, vec!["pr.class"]);
    }

    #[test]
    fn test_parse_listing_deduplicates() {
        let html = r#"
            <a href="pr.class">pr.class</a>
            <a href="/pub/time.series/pr/pr.class">pr.class again</a>
        "#;

        let names = parse_listing(html, &family_pattern());
        assert_eq!(names, vec!["pr.class"]);
    }

    #[test]
    fn test_parse_listing_empty_document() {
        let names = parse_listing("<html><body>No links here</body></html>", &family_pattern());
        assert!(names.is_empty());
    }
}
