//! Shared listing search filter.
//!
//! Every collection exposes the same `?q=` behavior: case-insensitive
//! substring match over that collection's text fields. All listing endpoints
//! go through this one filter so their matching semantics cannot drift apart.

use serde::Deserialize;

/// Query parameters accepted by listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Filter rows down to those where any searched field contains the query,
/// case-insensitively. An empty or absent query keeps every row.
pub fn filter_rows<T, F>(rows: Vec<T>, query: Option<&str>, fields: F) -> Vec<T>
where
    F: for<'a> Fn(&'a T) -> Vec<Option<&'a str>>,
{
    let query = match query {
        Some(q) if !q.is_empty() => q,
        _ => return rows,
    };
    let needle = query.to_lowercase();

    rows.into_iter()
        .filter(|row| {
            fields(row)
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        title: String,
        author: Option<String>,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                title: "Advanced Physics".to_string(),
                author: Some("R. Muncaster".to_string()),
            },
            Row {
                title: "Organic Chemistry".to_string(),
                author: None,
            },
        ]
    }

    fn fields(row: &Row) -> Vec<Option<&str>> {
        vec![Some(row.title.as_str()), row.author.as_deref()]
    }

    #[test]
    fn empty_query_is_the_identity() {
        assert_eq!(filter_rows(rows(), None, fields).len(), 2);
        assert_eq!(filter_rows(rows(), Some(""), fields).len(), 2);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let hits = filter_rows(rows(), Some("PHYSICS"), fields);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Advanced Physics");
    }

    #[test]
    fn substring_unique_to_one_row_returns_exactly_it() {
        let hits = filter_rows(rows(), Some("muncaster"), fields);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Advanced Physics");
    }

    #[test]
    fn null_fields_are_skipped_not_matched() {
        let hits = filter_rows(rows(), Some("none"), fields);
        assert!(hits.is_empty());
    }

    #[test]
    fn no_match_yields_empty() {
        assert!(filter_rows(rows(), Some("biology"), fields).is_empty());
    }
}
