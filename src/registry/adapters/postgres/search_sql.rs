//! SQL rendering of [`ServerQuery`] predicates.
//!
//! Diesel's boxed raw queries are used because the predicate shape depends
//! on the capability decision. Every caller value is bound, never
//! interpolated.

use crate::registry::domain::{PageRequest, ServerQuery, TextMatch};
use diesel::pg::Pg;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{Array, BigInt, Text};

/// Boxed raw query type used for catalog searches.
pub(super) type BoxedSearchQuery = BoxedSqlQuery<'static, Pg, SqlQuery>;

/// Native text predicate over the indexed search document.
pub(super) const FULL_TEXT_PREDICATE: &str =
    "to_tsvector('english', server_search_document(document)) @@ plainto_tsquery('english', $1)";

const SELECT_COLUMNS: &str = "SELECT server_id, document, created_at, updated_at FROM servers";
const SELECT_COUNT: &str = "SELECT COUNT(*) AS total FROM servers";

#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterBind {
    Text(String),
    TextArray(Vec<String>),
}

/// Rendered `WHERE` clause and its bound values in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct SearchFilter {
    clause: String,
    binds: Vec<FilterBind>,
}

impl SearchFilter {
    /// Renders the predicates of `query`.
    pub(super) fn from_query(query: &ServerQuery) -> Self {
        let mut conditions = Vec::new();
        let mut binds = Vec::new();

        match query.text() {
            None => {}
            Some(TextMatch::FullText(term)) => {
                binds.push(FilterBind::Text(term.clone()));
                conditions.push(FULL_TEXT_PREDICATE.replace("$1", &format!("${}", binds.len())));
            }
            Some(TextMatch::Contains { pattern, .. }) => {
                binds.push(FilterBind::Text(pattern.clone()));
                conditions.push(contains_predicate(binds.len()));
            }
        }

        if !query.tool_names().is_empty() {
            binds.push(FilterBind::TextArray(
                query.tool_names().iter().cloned().collect(),
            ));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM jsonb_array_elements(document->'tools') AS tool \
                 WHERE tool->>'name' = ANY(${}))",
                binds.len()
            ));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        Self { clause, binds }
    }

    /// Builds the count query.
    pub(super) fn count_query(&self) -> BoxedSearchQuery {
        self.bind_all(diesel::sql_query(format!("{SELECT_COUNT}{}", self.clause)).into_boxed())
    }

    /// Builds the page query ordered by insertion.
    pub(super) fn page_query(&self, page: PageRequest) -> BoxedSearchQuery {
        let limit_index = self.binds.len() + 1;
        let offset_index = self.binds.len() + 2;
        let sql = format!(
            "{SELECT_COLUMNS}{} ORDER BY row_id LIMIT ${limit_index} OFFSET ${offset_index}",
            self.clause
        );

        self.bind_all(diesel::sql_query(sql).into_boxed())
            .bind::<BigInt, _>(i64::from(page.limit()))
            .bind::<BigInt, _>(i64::try_from(page.offset()).unwrap_or(i64::MAX))
    }

    fn bind_all(&self, query: BoxedSearchQuery) -> BoxedSearchQuery {
        self.binds
            .iter()
            .cloned()
            .fold(query, |bound, bind| match bind {
                FilterBind::Text(value) => bound.bind::<Text, _>(value),
                FilterBind::TextArray(values) => bound.bind::<Array<Text>, _>(values),
            })
    }
}

fn contains_predicate(index: usize) -> String {
    format!(
        "(document->>'name' ~* ${index} \
         OR document->>'description' ~* ${index} \
         OR EXISTS (SELECT 1 FROM jsonb_array_elements(document->'tools') AS tool \
                    WHERE tool->>'name' ~* ${index}) \
         OR EXISTS (SELECT 1 \
                    FROM jsonb_array_elements_text(COALESCE(document->'tags', '[]'::jsonb)) AS tag \
                    WHERE tag ~* ${index}))"
    )
}
