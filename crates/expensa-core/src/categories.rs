//! Category names: defaults, normalization, and the recently-used list

use tracing::debug;

/// Built-in categories offered to every user
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Food",
    "Groceries",
    "Transport",
    "Shopping",
    "Bills",
    "Entertainment",
    "Health",
    "Travel",
    "Education",
    "Gifts",
    "Other",
];

/// Maximum entries kept in the recently-used list
pub const MAX_RECENT_CATEGORIES: usize = 5;

/// Trim and collapse internal whitespace runs to a single space
pub fn normalize_category_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive comparison of two normalized names
pub fn same_category(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

pub fn is_default_category(name: &str) -> bool {
    let name = normalize_category_name(name);
    DEFAULT_CATEGORIES.iter().any(|d| same_category(d, &name))
}

/// Move `name` to the front, dropping case-insensitive duplicates and capping the length
pub fn push_recent(recent: &[String], name: &str) -> Vec<String> {
    let name = normalize_category_name(name);
    if name.is_empty() {
        return recent.to_vec();
    }
    let mut updated = Vec::with_capacity(MAX_RECENT_CATEGORIES);
    updated.push(name.clone());
    updated.extend(
        recent
            .iter()
            .filter(|existing| !same_category(existing, &name))
            .cloned(),
    );
    updated.truncate(MAX_RECENT_CATEGORIES);
    updated
}

/// Decode the stored recent list. Anything unreadable becomes an empty list.
pub fn parse_recent(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list
            .iter()
            .map(|n| normalize_category_name(n))
            .filter(|n| !n.is_empty())
            .take(MAX_RECENT_CATEGORIES)
            .collect(),
        Err(e) => {
            debug!("Ignoring unreadable recent categories: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_category_name("  My   Shop \t"), "My Shop");
        assert_eq!(normalize_category_name("\n"), "");
        assert_eq!(normalize_category_name("Coffee"), "Coffee");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["  a  b  ", "Eating   Out", "", "x", " Pet\tSupplies\n"] {
            let once = normalize_category_name(raw);
            assert_eq!(normalize_category_name(&once), once);
        }
    }

    #[test]
    fn test_default_match_is_case_insensitive() {
        assert!(is_default_category("groceries"));
        assert!(is_default_category("  GROCERIES "));
        assert!(!is_default_category("Gym"));
    }

    #[test]
    fn test_push_recent_keeps_five_most_recent() {
        let mut recent = Vec::new();
        for name in ["A", "B", "C", "D", "E", "F"] {
            recent = push_recent(&recent, name);
        }
        assert_eq!(recent, vec!["F", "E", "D", "C", "B"]);
    }

    #[test]
    fn test_push_recent_moves_duplicate_to_front() {
        let recent = vec!["Food".to_string(), "Travel".to_string(), "Bills".to_string()];
        let updated = push_recent(&recent, "travel");
        assert_eq!(updated, vec!["travel", "Food", "Bills"]);
    }

    #[test]
    fn test_push_recent_ignores_empty_name() {
        let recent = vec!["Food".to_string()];
        assert_eq!(push_recent(&recent, "   "), recent);
    }

    #[test]
    fn test_parse_recent_degrades_to_empty() {
        assert!(parse_recent(None).is_empty());
        assert!(parse_recent(Some("")).is_empty());
        assert!(parse_recent(Some("{not json")).is_empty());
        assert!(parse_recent(Some(r#"{"a": 1}"#)).is_empty());
        assert_eq!(
            parse_recent(Some(r#"["Food", "  Eating  Out "]"#)),
            vec!["Food", "Eating Out"]
        );
    }
}
