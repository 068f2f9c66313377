//! Previous/next links for paged webpages.

use serde::Serialize;
use url::Url;

use crate::error::CmsResult;

/// Query parameter carrying the page number.
pub const PAGE_PARAM: &str = "Page";

/// Position of a rendered page within a paged listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMetadata {
    /// 1-based page number.
    pub page_number: u32,
    /// Total number of pages.
    pub page_count: u32,
}

impl PageMetadata {
    /// Creates page metadata.
    pub fn new(page_number: u32, page_count: u32) -> Self {
        Self {
            page_number,
            page_count,
        }
    }

    /// Returns `true` for the first page.
    pub fn is_first_page(&self) -> bool {
        self.page_number <= 1
    }

    /// Returns `true` for the last page, including an empty listing.
    pub fn is_last_page(&self) -> bool {
        self.page_number >= self.page_count
    }
}

/// The `prev` and `next` links of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelLinks {
    /// Link to the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    /// Link to the next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Builds the default links for a page whose first page lives at `base_url`.
///
/// The first page has no `prev`, and the second page points back at the
/// bare URL rather than `?Page=1`.
pub fn default_rel_links(base_url: &str, page: &PageMetadata) -> CmsResult<RelLinks> {
    let base = Url::parse(base_url)?;

    let prev = if page.is_first_page() {
        None
    } else if page.page_number == 2 {
        Some(base.to_string())
    } else {
        Some(page_url(&base, page.page_number - 1))
    };

    let next = if page.is_last_page() {
        None
    } else {
        Some(page_url(&base, page.page_number + 1))
    };

    Ok(RelLinks { prev, next })
}

fn page_url(base: &Url, page_number: u32) -> String {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair(PAGE_PARAM, &page_number.to_string());
    url.to_string()
}
