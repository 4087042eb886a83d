//! # Scenario Fingerprints
//!
//! Scenarios are write-once. A SHA-256 fingerprint is taken at registration
//! and stored beside the record; every lookup recomputes it, so a record
//! modified behind the store's back is reported instead of served.
//!
//! ## Encoding
//!
//! Each field is fed to the hasher as a little-endian `u64` length followed
//! by its bytes, with absent context encoded as a distinct tag byte. Length
//! prefixes keep field boundaries unambiguous: `("a|b", "c")` and
//! `("a", "b|c")` hash differently, which a delimiter-joined string cannot
//! guarantee.
//!
//! ## References
//!
//! - NIST FIPS 180-4 - Secure Hash Standard (SHA-256)

use crate::models::{Fingerprint, Scenario};
use sha2::{Digest, Sha256};

const CONTEXT_ABSENT: u8 = 0;
const CONTEXT_PRESENT: u8 = 1;

fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// Computes the fingerprint of a scenario.
///
/// # Example
///
/// ```rust
/// use appeal_registry::fingerprint::fingerprint_scenario;
/// use appeal_registry::Scenario;
///
/// let s = Scenario::new("s1", "Which is better?", "cats", "dogs", "Pets");
/// assert_eq!(fingerprint_scenario(&s), fingerprint_scenario(&s.clone()));
/// ```
pub fn fingerprint_scenario(scenario: &Scenario) -> Fingerprint {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, &scenario.id);
    update_field(&mut hasher, &scenario.question);
    update_field(&mut hasher, &scenario.option_a);
    update_field(&mut hasher, &scenario.option_b);
    update_field(&mut hasher, &scenario.category);

    match &scenario.context {
        Some(context) => {
            hasher.update([CONTEXT_PRESENT]);
            update_field(&mut hasher, context);
        }
        None => hasher.update([CONTEXT_ABSENT]),
    }

    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Scenario {
        Scenario::new("s1", "question", "alpha", "beta", "cat")
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(fingerprint_scenario(&base()), fingerprint_scenario(&base()));
    }

    #[test]
    fn test_fingerprint_changes_with_any_field() {
        let original = fingerprint_scenario(&base());

        let mut changed = base();
        changed.option_b = "gamma".to_string();
        assert_ne!(original, fingerprint_scenario(&changed));

        let with_context = base().with_context("background");
        assert_ne!(original, fingerprint_scenario(&with_context));
    }

    #[test]
    fn test_fingerprint_field_boundaries() {
        let left = Scenario::new("s1", "q", "a|b", "c", "x");
        let right = Scenario::new("s1", "q", "a", "b|c", "x");
        assert_ne!(fingerprint_scenario(&left), fingerprint_scenario(&right));
    }

    #[test]
    fn test_empty_context_vs_absent() {
        let mut empty = base();
        empty.context = Some(String::new());
        assert_ne!(fingerprint_scenario(&empty), fingerprint_scenario(&base()));
    }
}
