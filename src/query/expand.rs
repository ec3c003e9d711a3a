//! Synonym-table query expansion.
//!
//! Appends domain synonyms for recognized terms so vector search can match
//! chunks using different but related vocabulary. Expansion is additive
//! only: the original query text is never removed or reordered, so its
//! semantics dominate the resulting embedding.

use std::collections::HashSet;

/// Ordered term -> synonym-set table.
pub struct SynonymTable {
    entries: Vec<(String, Vec<String>)>,
}

impl SynonymTable {
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(term, syns)| {
                    (
                        term.to_lowercase(),
                        syns.into_iter().map(|s| s.to_lowercase()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Built-in table for the documented codebase's domain vocabulary.
    pub fn default_table() -> Self {
        Self::new(vec![
            (
                "api".into(),
                vec![
                    "endpoint".into(),
                    "rest".into(),
                    "json".into(),
                    "request".into(),
                    "response".into(),
                ],
            ),
            (
                "auth".into(),
                vec![
                    "authentication".into(),
                    "login".into(),
                    "token".into(),
                    "jwt".into(),
                    "security".into(),
                ],
            ),
            (
                "user".into(),
                vec!["customer".into(), "account".into(), "profile".into()],
            ),
            (
                "order".into(),
                vec![
                    "purchase".into(),
                    "checkout".into(),
                    "cart".into(),
                    "payment".into(),
                ],
            ),
            (
                "product".into(),
                vec![
                    "item".into(),
                    "sku".into(),
                    "variant".into(),
                    "catalog".into(),
                ],
            ),
            (
                "subscription".into(),
                vec![
                    "recurring".into(),
                    "frequency".into(),
                    "delivery".into(),
                ],
            ),
            (
                "component".into(),
                vec![
                    "vue".into(),
                    "template".into(),
                    "ui".into(),
                    "widget".into(),
                ],
            ),
            (
                "composable".into(),
                vec!["hook".into(), "function".into(), "utility".into()],
            ),
            (
                "entity".into(),
                vec![
                    "model".into(),
                    "doctrine".into(),
                    "orm".into(),
                    "database".into(),
                ],
            ),
            (
                "controller".into(),
                vec!["action".into(), "route".into(), "endpoint".into()],
            ),
            (
                "repository".into(),
                vec!["dao".into(), "query".into()],
            ),
        ])
    }

    /// Expand a raw query by appending each matched term's synonyms once.
    ///
    /// Tokenizes on word boundaries, case-insensitive. Not strictly
    /// idempotent: re-expanding may also match previously appended words, so
    /// callers expand exactly once per raw query.
    pub fn expand(&self, query: &str) -> String {
        let tokens: HashSet<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
            .collect();

        let mut appended: Vec<&str> = Vec::new();
        for (term, synonyms) in &self.entries {
            if tokens.contains(term) {
                for syn in synonyms {
                    appended.push(syn);
                }
            }
        }

        if appended.is_empty() {
            query.to_string()
        } else {
            format!("{} {}", query, appended.join(" "))
        }
    }
}
