use anyhow::{Context, Result};
use ego_tree::NodeRef;
use scraper::{Html, Node};
use std::time::Duration;
use thiserror::Error;

/// Character budget for text handed to the model.
pub const DEFAULT_MAX_CHARS: usize = 3000;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

// Some job boards reject requests without a browser identity.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Tags whose subtrees carry page chrome rather than posting content.
/// This exact set is part of the normalizer's contract; changing it changes
/// what the model sees.
const JUNK_TAGS: [&str; 7] = [
    "script", "style", "nav", "footer", "header", "aside", "iframe",
];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("status code {0}")]
    BadStatus(u16),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Retrieval seam for the pipeline; lets the batch runner and tests swap in
/// a canned source instead of the network.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct PageFetcher {
    client: reqwest::blocking::Client,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetch for PageFetcher {
    /// Single attempt, no retries. Anything other than a 200 is reported as
    /// an error for the caller to surface or skip.
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        response
            .text()
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

/// Reduces raw markup to a bounded plain-text blob suitable for the model
/// context: junk subtrees removed, whitespace collapsed to single spaces,
/// hard-truncated to `max_chars` characters (mid-word cuts allowed).
pub fn clean_page_text(markup: &str, max_chars: usize) -> String {
    let document = Html::parse_document(markup);

    let mut pieces: Vec<&str> = Vec::new();
    collect_text(document.tree.root(), &mut pieces);

    let joined = pieces.join(" ");
    let collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");

    collapsed.chars().take(max_chars).collect()
}

fn collect_text<'a>(node: NodeRef<'a, Node>, out: &mut Vec<&'a str>) {
    if let Some(element) = node.value().as_element() {
        if JUNK_TAGS.contains(&element.name()) {
            return;
        }
    }
    if let Some(text) = node.value().as_text() {
        out.push(&*text.text);
    }
    for child in node.children() {
        collect_text(child, out);
    }
}
