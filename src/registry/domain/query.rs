//! Store-neutral search query values.
//!
//! A [`ServerQuery`] is built once per request by the search service and
//! interpreted by each repository adapter in its own query language.

use super::ServerRecord;
use std::collections::BTreeSet;

/// Default number of records in a page.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Upper bound applied to caller-supplied page sizes.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Record fields covered by the text predicate, in either strategy.
pub const SEARCHABLE_FIELDS: [&str; 4] = ["name", "description", "tools.name", "tags"];

/// Text predicate strategy chosen for a search.
///
/// The two strategies are not result-equivalent: native search matches
/// stemmed tokens while `Contains` matches literal substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextMatch {
    /// Native tokenised full-text search over the indexed fields.
    FullText(String),
    /// Case-insensitive literal substring match against each field.
    Contains {
        /// Search text as typed by the caller.
        needle: String,
        /// Regular expression matching `needle` literally.
        pattern: String,
    },
}

impl TextMatch {
    /// Creates a native full-text predicate.
    #[must_use]
    pub fn full_text(term: impl Into<String>) -> Self {
        Self::FullText(term.into())
    }

    /// Creates a substring predicate, escaping every regex metacharacter.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mcp_registry::registry::domain::TextMatch;
    ///
    /// let TextMatch::Contains { pattern, .. } = TextMatch::contains("c++ (beta)") else {
    ///     unreachable!();
    /// };
    /// assert_eq!(pattern, r"c\+\+ \(beta\)");
    /// ```
    #[must_use]
    pub fn contains(term: impl Into<String>) -> Self {
        let needle = term.into();
        let pattern = regex::escape(&needle);
        Self::Contains { needle, pattern }
    }

    /// Returns the caller's search text.
    #[must_use]
    pub fn term(&self) -> &str {
        match self {
            Self::FullText(term) => term,
            Self::Contains { needle, .. } => needle,
        }
    }
}

/// Predicate over catalog records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerQuery {
    text: Option<TextMatch>,
    tool_names: BTreeSet<String>,
}

impl ServerQuery {
    /// Creates a query that matches every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a text predicate.
    #[must_use]
    pub fn with_text(mut self, text: TextMatch) -> Self {
        self.text = Some(text);
        self
    }

    /// Requires at least one tool whose name is in `names`.
    #[must_use]
    pub fn with_tool_names(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.tool_names = names.into_iter().collect();
        self
    }

    /// Returns the text predicate, if any.
    #[must_use]
    pub const fn text(&self) -> Option<&TextMatch> {
        self.text.as_ref()
    }

    /// Returns the tool-name filter. Empty means no filter.
    #[must_use]
    pub const fn tool_names(&self) -> &BTreeSet<String> {
        &self.tool_names
    }
}

/// Page window over a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    offset: u64,
}

impl PageRequest {
    /// Creates a page window, clamping the size into `1..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub fn new(limit: u32, offset: u64) -> Self {
        Self {
            limit: limit.clamp(1, MAX_PAGE_LIMIT),
            offset,
        }
    }

    /// Builds a page window from raw caller input.
    ///
    /// Missing values take their defaults. Negative offsets clamp to zero
    /// and page sizes clamp into `1..=MAX_PAGE_LIMIT`.
    #[must_use]
    pub fn from_raw(limit: Option<i64>, offset: Option<i64>) -> Self {
        let clamped_limit = limit.map_or(DEFAULT_PAGE_LIMIT, |raw| {
            u32::try_from(raw.clamp(1, i64::from(MAX_PAGE_LIMIT))).unwrap_or(DEFAULT_PAGE_LIMIT)
        });
        let clamped_offset = offset.map_or(0, |raw| u64::try_from(raw).unwrap_or(0));
        Self::new(clamped_limit, clamped_offset)
    }

    /// Returns the page size.
    #[must_use]
    pub const fn limit(self) -> u32 {
        self.limit
    }

    /// Returns the number of records skipped.
    #[must_use]
    pub const fn offset(self) -> u64 {
        self.offset
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT, 0)
    }
}

/// One page of search results and the total match count.
///
/// The count and the page come from separate store reads, so `total` can
/// drift from the page under concurrent writes.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Records in this page, in store order.
    pub records: Vec<ServerRecord>,
    /// Number of records matching the predicate.
    pub total: u64,
    /// Window used to produce this page.
    pub page: PageRequest,
}
