//! Text predicates evaluated against in-memory records.

use crate::registry::domain::ServerRecord;
use regex::Regex;
use std::collections::BTreeSet;

/// Splits text into lowercase alphanumeric tokens.
pub(super) fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|character: char| !character.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Returns whether every query token appears among the record's indexed
/// tokens. A query without tokens matches nothing.
pub(super) fn matches_all_tokens(record: &ServerRecord, query_tokens: &BTreeSet<String>) -> bool {
    if query_tokens.is_empty() {
        return false;
    }

    let mut indexed = BTreeSet::new();
    for field in searchable_fields(record) {
        indexed.extend(tokenize(field));
    }
    query_tokens.is_subset(&indexed)
}

/// Returns whether any indexed field matches `pattern`.
pub(super) fn any_field_matches(record: &ServerRecord, pattern: &Regex) -> bool {
    searchable_fields(record).any(|field| pattern.is_match(field))
}

fn searchable_fields(record: &ServerRecord) -> impl Iterator<Item = &str> {
    [record.name(), record.description()]
        .into_iter()
        .chain(record.tools().iter().map(|tool| tool.name()))
        .chain(record.tags().iter().map(String::as_str))
}
