//! # Customer Resolution
//!
//! Finds the credit account a transaction belongs to.
//!
//! Customers have no strict key: the counter types a name and maybe a phone.
//! This module turns that soft identity into one deterministic answer plus a
//! flag saying whether the answer was contested.
//!
//! ## Rules
//! ```text
//! 1. phone non-empty and some account has exactly that phone
//!      → that account (first in list order)            matched_by = Phone
//! 2. otherwise trimmed, case-insensitive name match
//!      → the candidate with the latest history entry
//!        (ties: earliest in list order)                 matched_by = Name
//! 3. nothing → None
//!
//! ambiguous = a phone match exists AND a different account matches the name
//!          OR several accounts match by name
//! ```

use tracing::warn;

use crate::types::Credit;

/// How a customer was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    Phone,
    Name,
}

/// Result of [`resolve_customer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerMatch {
    /// Index into the credits slice
    pub index: usize,
    pub matched_by: MatchedBy,
    /// Another account could also have been meant.
    pub ambiguous: bool,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Resolves a customer by phone, then name.
pub fn resolve_customer(credits: &[Credit], name: &str, phone: &str) -> Option<CustomerMatch> {
    let phone = phone.trim();
    let wanted = normalize(name);

    let name_matches: Vec<usize> = if wanted.is_empty() {
        Vec::new()
    } else {
        credits
            .iter()
            .enumerate()
            .filter(|(_, c)| normalize(&c.customer_name) == wanted)
            .map(|(i, _)| i)
            .collect()
    };

    let phone_match = if phone.is_empty() {
        None
    } else {
        credits.iter().position(|c| c.customer_phone.trim() == phone)
    };

    let resolved = match phone_match {
        Some(index) => Some(CustomerMatch {
            index,
            matched_by: MatchedBy::Phone,
            ambiguous: name_matches.iter().any(|&i| i != index),
        }),
        None => most_recent(credits, &name_matches).map(|index| CustomerMatch {
            index,
            matched_by: MatchedBy::Name,
            ambiguous: name_matches.len() > 1,
        }),
    };

    if let Some(m) = resolved.filter(|m| m.ambiguous) {
        warn!(
            customer = %name,
            phone = %phone,
            chosen = %credits[m.index].id,
            matched_by = ?m.matched_by,
            candidates = name_matches.len(),
            "Ambiguous customer match"
        );
    }

    resolved
}

/// Picks the candidate with the newest history entry; `max_by_key` keeps the
/// last maximum, so iterate in reverse to prefer list order on ties.
fn most_recent(credits: &[Credit], candidates: &[usize]) -> Option<usize> {
    candidates
        .iter()
        .rev()
        .copied()
        .max_by_key(|&i| credits[i].last_activity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::{TimeZone, Utc};

    fn credit(id: &str, name: &str, phone: &str, last_ms: Option<i64>) -> Credit {
        let mut c = Credit {
            id: id.to_string(),
            customer_name: name.to_string(),
            customer_phone: phone.to_string(),
            total_due: Money::zero(),
            history: vec![],
        };
        if let Some(ms) = last_ms {
            let at = Utc.timestamp_millis_opt(ms).unwrap();
            c.post(Money::from_minor(1), at, "seed", None);
        }
        c
    }

    #[test]
    fn test_phone_match_wins() {
        let credits = vec![
            credit("a", "Rahim", "0171", None),
            credit("b", "Karim", "0188", None),
        ];
        let m = resolve_customer(&credits, "Rahim", "0188").unwrap();
        assert_eq!(m.index, 1);
        assert_eq!(m.matched_by, MatchedBy::Phone);
        assert!(m.ambiguous);
    }

    #[test]
    fn test_name_match_is_case_insensitive_and_trimmed() {
        let credits = vec![credit("a", "Rahim Uddin", "", None)];
        let m = resolve_customer(&credits, "  rahim uddin ", "").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.matched_by, MatchedBy::Name);
        assert!(!m.ambiguous);
    }

    #[test]
    fn test_unknown_phone_falls_back_to_name() {
        let credits = vec![credit("a", "Rahim", "0171", None)];
        let m = resolve_customer(&credits, "rahim", "0999").unwrap();
        assert_eq!(m.index, 0);
        assert_eq!(m.matched_by, MatchedBy::Name);
    }

    #[test]
    fn test_name_tie_prefers_most_recent_activity() {
        let credits = vec![
            credit("old", "Rahim", "", Some(100)),
            credit("new", "Rahim", "", Some(200)),
            credit("none", "Rahim", "", None),
        ];
        let m = resolve_customer(&credits, "RAHIM", "").unwrap();
        assert_eq!(credits[m.index].id, "new");
        assert!(m.ambiguous);
    }

    #[test]
    fn test_name_tie_without_activity_prefers_list_order() {
        let credits = vec![credit("first", "Rahim", "", None), credit("second", "Rahim", "", None)];
        let m = resolve_customer(&credits, "Rahim", "").unwrap();
        assert_eq!(credits[m.index].id, "first");
    }

    #[test]
    fn test_no_match() {
        let credits = vec![credit("a", "Rahim", "0171", None)];
        assert!(resolve_customer(&credits, "Karim", "").is_none());
        assert!(resolve_customer(&credits, "", "").is_none());
    }
}
