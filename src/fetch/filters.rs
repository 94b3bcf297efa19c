//! Filter predicates, sort orders, and the paged-read selection
//!
//! Every cache table shares the queryable columns `id`, `owner`, `content`,
//! and `created_at` (RFC 3339 TEXT), so one SQL translation serves all paged
//! reads. Lists that are parsed out of record bodies rather than stored as
//! rows (follow/block lists) evaluate the same filters in memory instead.

use chrono::{Duration, Utc};
use rand::seq::SliceRandom;

use crate::models::Record;

/// A single inclusion predicate. A record is shown only if every active
/// filter matches (logical AND).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Only records owned by the given address
    Owner(String),
    /// Case-insensitive substring match against id and body
    Query(String),
    /// Exclude records owned by any of the given addresses (block list)
    Excluding(Vec<String>),
    /// Only records created within the trailing window
    Within(Duration),
}

impl Filter {
    /// Evaluate the predicate against a record in memory
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            Self::Owner(address) => record.owner() == address,
            Self::Query(query) => {
                let query = query.to_lowercase();
                record.record_id().to_lowercase().contains(&query)
                    || record.body().to_lowercase().contains(&query)
            }
            Self::Excluding(addresses) => !addresses.iter().any(|a| a == record.owner()),
            Self::Within(window) => record
                .created()
                .is_some_and(|stamp| stamp >= Utc::now() - *window),
        }
    }

    /// Append the predicate's WHERE fragment and its parameters
    fn push_sql(&self, clauses: &mut Vec<String>, params: &mut Vec<String>) {
        match self {
            Self::Owner(address) => {
                clauses.push(format!("owner = ?{}", params.len() + 1));
                params.push(address.clone());
            }
            Self::Query(query) => {
                let pattern = format!("%{query}%");
                clauses.push(format!(
                    "(id LIKE ?{n} OR content LIKE ?{n})",
                    n = params.len() + 1
                ));
                params.push(pattern);
            }
            Self::Excluding(addresses) => {
                if addresses.is_empty() {
                    return;
                }
                let placeholders: Vec<String> = (0..addresses.len())
                    .map(|i| format!("?{}", params.len() + i + 1))
                    .collect();
                clauses.push(format!("owner NOT IN ({})", placeholders.join(", ")));
                params.extend(addresses.iter().cloned());
            }
            Self::Within(window) => {
                let cutoff = (Utc::now() - *window).to_rfc3339();
                clauses.push(format!("created_at >= ?{}", params.len() + 1));
                params.push(cutoff);
            }
        }
    }
}

/// True when every filter matches; short-circuits on the first miss
pub fn all_match<R: Record>(filters: &[Filter], record: &R) -> bool {
    filters.iter().all(|filter| filter.matches(record))
}

/// Presentation order for list reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sort {
    /// Case-insensitive by id
    Alphabetical,
    /// Most recent first
    #[default]
    NewestFirst,
    /// Oldest first
    OldestFirst,
    /// Intentionally non-reproducible order; bypasses the stable-sort
    /// contract, so assertions may only compare element sets
    Shuffle,
}

impl Sort {
    /// SQL ORDER BY expression over the shared columns
    pub fn order_by(self) -> &'static str {
        match self {
            Self::Alphabetical => "id COLLATE NOCASE ASC",
            Self::NewestFirst => "created_at DESC",
            Self::OldestFirst => "created_at ASC",
            Self::Shuffle => "RANDOM()",
        }
    }

    /// Apply the order to an in-memory list
    pub fn apply<R: Record>(self, items: &mut [R]) {
        match self {
            Self::Alphabetical => {
                items.sort_by(|a, b| {
                    a.record_id()
                        .to_lowercase()
                        .cmp(&b.record_id().to_lowercase())
                });
            }
            Self::NewestFirst => items.sort_by(|a, b| b.created().cmp(&a.created())),
            Self::OldestFirst => items.sort_by(|a, b| a.created().cmp(&b.created())),
            Self::Shuffle => items.shuffle(&mut rand::rng()),
        }
    }
}

/// One paged, filtered, ordered read against the local store
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Active filters, all of which must match
    pub filters: Vec<Filter>,
    /// Presentation order
    pub sort: Sort,
    /// Page size; `None` reads everything that matches
    pub limit: Option<usize>,
    /// Row offset of the page
    pub offset: usize,
}

impl Selection {
    /// Selection matching everything, default order
    pub fn all() -> Self {
        Self::default()
    }

    /// Build the `WHERE .. ORDER BY .. LIMIT .. OFFSET ..` suffix and its
    /// positional parameters
    pub fn sql_suffix(&self) -> (String, Vec<String>) {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for filter in &self.filters {
            filter.push_sql(&mut clauses, &mut params);
        }

        let mut sql = String::new();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(self.sort.order_by());
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit} OFFSET {}", self.offset));
        }
        (sql, params)
    }

    /// Evaluate the selection against an in-memory list (used by list
    /// fetchers whose items are parsed from a record body, not stored rows)
    pub fn apply<R: Record + Clone>(&self, items: &[R]) -> Vec<R> {
        let mut matched: Vec<R> = items
            .iter()
            .filter(|item| all_match(&self.filters, *item))
            .cloned()
            .collect();
        self.sort.apply(&mut matched);

        let start = self.offset.min(matched.len());
        let end = match self.limit {
            Some(limit) => (start + limit).min(matched.len()),
            None => matched.len(),
        };
        matched[start..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;

    fn status(id: &str, address: &str, content: &str) -> Status {
        Status::new(id, address, content)
    }

    #[test]
    fn test_filters_are_and_semantics() {
        let record = status("1", "blocked-address", "matches x query");
        let query = Filter::Query("x".to_string());
        let not_blocked = Filter::Excluding(vec!["blocked-address".to_string()]);

        // Matches the query alone, but the blocked owner excludes it under
        // the combined set.
        assert!(query.matches(&record));
        assert!(!not_blocked.matches(&record));
        assert!(!all_match(&[not_blocked.clone(), query.clone()], &record));
        assert!(!all_match(&[query, not_blocked], &record));
    }

    #[test]
    fn test_query_filter_is_case_insensitive() {
        let record = status("1", "app", "Hello World");
        assert!(Filter::Query("hello".to_string()).matches(&record));
        assert!(Filter::Query("WORLD".to_string()).matches(&record));
        assert!(!Filter::Query("absent".to_string()).matches(&record));
    }

    #[test]
    fn test_within_filter() {
        let mut record = status("1", "app", "old");
        record.posted = Utc::now() - Duration::days(10);
        assert!(!Filter::Within(Duration::days(7)).matches(&record));
        assert!(Filter::Within(Duration::days(30)).matches(&record));
    }

    #[test]
    fn test_sql_suffix_joins_clauses_with_and() {
        let selection = Selection {
            filters: vec![
                Filter::Owner("app".to_string()),
                Filter::Query("x".to_string()),
            ],
            sort: Sort::NewestFirst,
            limit: Some(10),
            offset: 20,
        };
        let (sql, params) = selection.sql_suffix();
        assert_eq!(
            sql,
            " WHERE owner = ?1 AND (id LIKE ?2 OR content LIKE ?2) \
             ORDER BY created_at DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(params, vec!["app".to_string(), "%x%".to_string()]);
    }

    #[test]
    fn test_empty_excluding_list_adds_no_clause() {
        let selection = Selection {
            filters: vec![Filter::Excluding(Vec::new())],
            ..Selection::all()
        };
        let (sql, params) = selection.sql_suffix();
        assert_eq!(sql, " ORDER BY created_at DESC");
        assert!(params.is_empty());
    }

    #[test]
    fn test_in_memory_apply_filters_sorts_and_pages() {
        let items = vec![
            status("c", "app", "gamma"),
            status("a", "app", "alpha"),
            status("b", "other", "beta"),
        ];
        let selection = Selection {
            filters: vec![Filter::Owner("app".to_string())],
            sort: Sort::Alphabetical,
            limit: Some(1),
            offset: 1,
        };
        let page = selection.apply(&items);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "c");
    }

    #[test]
    fn test_shuffle_keeps_the_same_elements() {
        let mut items = vec![
            status("a", "app", ""),
            status("b", "app", ""),
            status("c", "app", ""),
        ];
        Sort::Shuffle.apply(&mut items);
        let mut ids: Vec<&str> = items.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
