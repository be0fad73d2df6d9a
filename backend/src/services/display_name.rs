//! Display-name ("GUI name") selection for new blueprints.
//!
//! Mill operators pick masks by a short display name, so names must be unique
//! among live blueprints and fit the mill console.

use std::collections::HashSet;

/// Longest display name the mill console shows.
pub const MAX_DISPLAY_NAME_LEN: usize = 8;

/// Suffix characters tried in order when the requested name is unavailable.
pub const SUFFIX_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("display name is empty")]
    Empty,
    #[error("no free display name for prefix '{prefix}': all {tried} suffixes in use")]
    Exhausted { prefix: String, tried: usize },
}

/// Remove all whitespace from a submitted name.
pub fn collapse(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Prefix shared by every probe candidate for `collapsed`.
pub fn probe_prefix(collapsed: &str) -> String {
    collapsed.chars().take(MAX_DISPLAY_NAME_LEN - 1).collect()
}

/// Whether `collapsed` can be used verbatim given the names already taken.
pub fn fits_verbatim(collapsed: &str, taken: &HashSet<String>) -> bool {
    collapsed.chars().count() <= MAX_DISPLAY_NAME_LEN && !taken.contains(collapsed)
}

/// Choose the stored display name.
///
/// `taken` must contain every live name starting with [`probe_prefix`] of the
/// collapsed name; it may contain more. The submitted name is kept when it is
/// short enough and free. Otherwise the first free `prefix + suffix` wins.
pub fn choose_display_name(raw: &str, taken: &HashSet<String>) -> Result<String, ProbeError> {
    let collapsed = collapse(raw);
    if collapsed.is_empty() {
        return Err(ProbeError::Empty);
    }
    if fits_verbatim(&collapsed, taken) {
        return Ok(collapsed);
    }

    let prefix = probe_prefix(&collapsed);
    let mut candidate = String::with_capacity(prefix.len() + 1);
    for suffix in SUFFIX_ALPHABET.chars() {
        candidate.clear();
        candidate.push_str(&prefix);
        candidate.push(suffix);
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ProbeError::Exhausted {
        prefix,
        tried: SUFFIX_ALPHABET.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_short_free_name_is_kept() {
        assert_eq!(
            choose_display_name("NGC 1234", &taken(&[])).unwrap(),
            "NGC1234"
        );
        assert_eq!(
            choose_display_name(" ab\tcd ", &taken(&["other"])).unwrap(),
            "abcd"
        );
    }

    #[test]
    fn test_taken_short_name_gets_suffix() {
        assert_eq!(
            choose_display_name("NGC1234", &taken(&["NGC1234"])).unwrap(),
            "NGC1234A"
        );
        assert_eq!(
            choose_display_name("NGC1234", &taken(&["NGC1234", "NGC1234A", "NGC1234B"])).unwrap(),
            "NGC1234C"
        );
    }

    #[test]
    fn test_long_name_is_truncated_and_suffixed() {
        assert_eq!(
            choose_display_name("abell 2218 north", &taken(&[])).unwrap(),
            "abell22A"
        );
    }

    #[test]
    fn test_exact_eight_char_name_taken() {
        assert_eq!(
            choose_display_name("ABCDEFGH", &taken(&["ABCDEFGH"])).unwrap(),
            "ABCDEFGA"
        );
    }

    #[test]
    fn test_suffix_order_after_uppercase() {
        let mut names: HashSet<String> = ('A'..='Z').map(|c| format!("field01{}", c)).collect();
        names.insert("field01".to_string());
        assert_eq!(choose_display_name("field01", &names).unwrap(), "field01a");
    }

    #[test]
    fn test_exhausted() {
        let names: HashSet<String> = SUFFIX_ALPHABET
            .chars()
            .map(|c| format!("crowded{}", c))
            .chain(std::iter::once("crowded".to_string()))
            .collect();
        assert_eq!(
            choose_display_name("crowded", &names),
            Err(ProbeError::Exhausted {
                prefix: "crowded".to_string(),
                tried: 64
            })
        );
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(choose_display_name(" \t ", &taken(&[])), Err(ProbeError::Empty));
    }

    proptest! {
        #[test]
        fn prop_result_is_free_and_short(
            raw in "[A-Za-z0-9 ]{1,16}",
            taken_suffixes in proptest::collection::vec(0usize..64, 0..80),
        ) {
            let collapsed = collapse(&raw);
            prop_assume!(!collapsed.is_empty());
            let prefix = probe_prefix(&collapsed);
            let alphabet: Vec<char> = SUFFIX_ALPHABET.chars().collect();
            let mut names: HashSet<String> = taken_suffixes
                .iter()
                .map(|i| format!("{}{}", prefix, alphabet[*i]))
                .collect();
            names.insert(collapsed.clone());

            match choose_display_name(&raw, &names) {
                Ok(name) => {
                    prop_assert!(name.chars().count() <= MAX_DISPLAY_NAME_LEN);
                    prop_assert!(!names.contains(&name));
                    prop_assert!(name.starts_with(&prefix));
                }
                Err(ProbeError::Exhausted { tried, .. }) => {
                    prop_assert_eq!(tried, 64);
                    for c in &alphabet {
                        let candidate = format!("{}{}", prefix, c);
                        prop_assert!(names.contains(&candidate));
                    }
                }
                Err(ProbeError::Empty) => prop_assert!(false, "non-empty input"),
            }
        }
    }
}
