//! Client-side list filtering.
//!
//! Every list screen narrows the last fetched set with a case-insensitive
//! substring match over a fixed handful of fields per record. Filtering
//! borrows from the source list and never mutates it.

use std::borrow::Cow;

/// Text shown in place of an empty table body.
pub const NO_MATCHING_CONTENT: &str = "No Matching Content";

/// A record that can be matched against a search query.
pub trait Searchable {
    /// The fields the search box looks at.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;

    /// Case-insensitive substring match against any search field.
    ///
    /// The empty query matches everything.
    fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let needle = query.to_lowercase();
        self.search_fields()
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Return the records matching `query`, preserving their order.
#[must_use]
pub fn filter_records<'a, T: Searchable>(records: &'a [T], query: &str) -> Vec<&'a T> {
    records.iter().filter(|record| record.matches(query)).collect()
}

/// What a table body renders.
#[derive(Debug, PartialEq, Eq)]
pub enum Rows<'a, T> {
    /// At least one matching record.
    Records(Vec<&'a T>),
    /// Nothing matched; render [`NO_MATCHING_CONTENT`].
    NoMatchingContent,
}

impl<'a, T: Searchable> Rows<'a, T> {
    /// Filter `records` and decide what the table shows.
    #[must_use]
    pub fn build(records: &'a [T], query: &str) -> Self {
        let matched = filter_records(records, query);
        if matched.is_empty() {
            Self::NoMatchingContent
        } else {
            Self::Records(matched)
        }
    }

    /// Number of rendered rows (the placeholder counts as none).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::NoMatchingContent => 0,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::NoMatchingContent)
    }
}
