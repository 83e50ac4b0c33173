//! Column identifiers: arbitrary header text turned into unique, lowercase, length-bounded SQL names.

use regex::Regex;
use sha2::Digest;
use sha2::Sha256;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Longest identifier PostgreSQL keeps without truncation.
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Characters kept in front of the hash when a name is shortened.
const SHORTENED_PREFIX_LENGTH: usize = 50;

/// Hex digits of the content hash appended to shortened names.
const HASH_LENGTH: usize = 8;

/// Fallback for names without a single letter or digit.
const EMPTY_NAME: &str = "col";

static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("Hardcode regex pattern"));

/// Turns a raw header label into a column name that is unique within `used_names`.
///
/// The label is lowercased, every run of characters other than ASCII letters and digits becomes
/// one `_`, and leading or trailing `_` are dropped. Names longer than 63 characters are
/// shortened to their first 50 characters, `_` and 8 hex digits of a SHA-256 of the full name.
/// Collisions get `_2`, `_3`, ... appended to that name (each candidate shortened again) until
/// one is free.
///
/// The returned name is inserted into `used_names`.
pub fn finalize(raw: &str, used_names: &mut HashSet<String>) -> String {
    let base = shorten_with_hash(&sanitize(raw));
    let mut candidate = base.clone();
    let mut suffix = 2usize;
    while used_names.contains(&candidate) {
        candidate = shorten_with_hash(&format!("{base}_{suffix}"));
        suffix += 1;
    }
    used_names.insert(candidate.clone());
    candidate
}

/// Lowercases and collapses separators, never returning an empty name.
pub fn sanitize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let collapsed = SEPARATORS.replace_all(&lowered, "_");
    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        EMPTY_NAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Shortens a sanitized name above the identifier limit, keeping it recognizable and deterministic.
pub fn shorten_with_hash(name: &str) -> String {
    if name.len() <= MAX_IDENTIFIER_LENGTH {
        return name.to_owned();
    }
    let digest = hex::encode(Sha256::digest(name.as_bytes()));
    let mut shortened = format!("{}_{}", &name[..SHORTENED_PREFIX_LENGTH], &digest[..HASH_LENGTH]);
    shortened.truncate(MAX_IDENTIFIER_LENGTH);
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_valid(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_IDENTIFIER_LENGTH
            && name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
    }

    #[test]
    fn sanitizes_labels() {
        let mut used = HashSet::new();
        assert_eq!(finalize("Order ID", &mut used), "order_id");
        assert_eq!(finalize("  Unit Price (€) ", &mut used), "unit_price");
        assert_eq!(finalize("Qty - Boxes", &mut used), "qty_boxes");
        assert_eq!(finalize("__a__b__", &mut used), "a_b");
        assert_eq!(finalize("Größe", &mut used), "gr_e");
    }

    #[test]
    fn empty_labels_become_col() {
        let mut used = HashSet::new();
        assert_eq!(finalize("", &mut used), "col");
        assert_eq!(finalize("!!!", &mut used), "col_2");
        assert_eq!(finalize("日本", &mut used), "col_3");
    }

    #[test]
    fn repeated_names_get_increasing_suffixes() {
        let mut used = HashSet::new();
        let names: Vec<String> = (0..4).map(|_| finalize("Name", &mut used)).collect();
        assert_eq!(names, vec!["name", "name_2", "name_3", "name_4"]);
        assert_eq!(used.len(), 4);
    }

    #[test]
    fn suffix_skips_names_already_taken() {
        let mut used = HashSet::from(["x".to_owned(), "x_2".to_owned()]);
        assert_eq!(finalize("x", &mut used), "x_3");
    }

    #[test]
    fn long_names_are_shortened_deterministically() {
        let label = "a".repeat(40) + " " + &"b".repeat(40);
        let mut used = HashSet::new();
        let first = finalize(&label, &mut used);
        assert_eq!(first.len(), SHORTENED_PREFIX_LENGTH + 1 + HASH_LENGTH);
        assert!(first.starts_with(&"a".repeat(40)));
        assert!(is_valid(&first));

        let mut other = HashSet::new();
        assert_eq!(finalize(&label, &mut other), first);

        let second = finalize(&label, &mut used);
        assert_eq!(second, format!("{first}_2"));
        assert!(is_valid(&second));
        assert_eq!(finalize(&label, &mut used), format!("{first}_3"));
    }

    #[test]
    fn collisions_of_shortened_names_keep_the_hash() {
        let label = "a".repeat(80);
        let mut used = HashSet::new();
        let first = finalize(&label, &mut used);
        let second = finalize(&label, &mut used);
        assert_eq!(first.len(), 59);
        assert!(first.starts_with(&"a".repeat(50)));
        assert_eq!(second, format!("{first}_2"));
        assert_eq!(second.len(), 61);
    }

    #[test]
    fn names_at_the_limit_are_kept() {
        let label = "c".repeat(MAX_IDENTIFIER_LENGTH);
        assert_eq!(shorten_with_hash(&label), label);
        assert_eq!(shorten_with_hash(&"c".repeat(MAX_IDENTIFIER_LENGTH + 1)).len(), 59);
    }

    #[test]
    fn every_generated_name_is_valid_and_unique() {
        let long = "x".repeat(100);
        let labels = ["", " ", "A", "a", "A!", "1", "Été", long.as_str(), "col", "col_2"];
        let mut used = HashSet::new();
        let names: Vec<String> = labels.iter().map(|label| finalize(label, &mut used)).collect();
        assert!(names.iter().all(|name| is_valid(name)));
        assert_eq!(used.len(), names.len());
    }
}
