//! # Physical Id Generation
//!
//! Derives a stable identifier for a managed resource in the same shape
//! the control plane itself uses: `{stack token}-{logical id}-{random}`.
//! The random suffix makes the output non-reproducible for fixed inputs;
//! assert on structure, prefix and length, never on the exact value.

use crate::request::Request;
use rand::Rng;

/// Length of the random suffix, never truncated.
pub const RANDOM_SUFFIX_LEN: usize = 12;

const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Strategy for deriving the physical id on Create when the request did
/// not carry one. Defaulted to [`UniqueIdGenerator`].
pub trait IdGenerator: Send + Sync {
    fn generate(&self, request: &Request, max_len: Option<usize>) -> String;
}

/// The reference generator: stack token + logical id + random suffix,
/// optionally with a fixed prefix (e.g. when the physical id must be an
/// ARN) and a custom separator.
#[derive(Debug, Clone, Default)]
pub struct UniqueIdGenerator {
    prefix: String,
    separator: Option<String>,
}

impl UniqueIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }
}

impl IdGenerator for UniqueIdGenerator {
    fn generate(&self, request: &Request, max_len: Option<usize>) -> String {
        generate_unique_id(
            &request.stack_id,
            &request.logical_resource_id,
            &self.prefix,
            self.separator.as_deref().unwrap_or("-"),
            max_len,
        )
    }
}

/// Truncate to at most `len` characters, from the right.
fn truncate_chars(s: &mut String, len: usize) {
    if let Some((idx, _)) = s.char_indices().nth(len) {
        s.truncate(idx);
    }
}

/// Derives a short token from a stack identifier ARN: the substring after
/// the last `:`, then (if that contains `/`) the segment after the first
/// `/`, with `-` characters stripped.
fn stack_token(stack_id: &str) -> String {
    let tail = stack_id.rsplit(':').next().unwrap_or(stack_id);
    let segment = if tail.contains('/') {
        tail.split('/').nth(1).unwrap_or(tail)
    } else {
        tail
    };
    segment.replace('-', "")
}

/// Composes `prefix + stackToken + separator + logicalId + separator +
/// random`, where the random token is 12 uppercase letters and digits.
///
/// When `max_len` is given, only the stack token and the logical id are
/// shortened — the suffix, separators and prefix are preserved intact —
/// with the overflow split as evenly as possible between the two. When
/// the natural length exceeds `max_len`, the result's length is exactly
/// `max_len`.
pub fn generate_unique_id(
    stack_id: &str,
    logical_id: &str,
    prefix: &str,
    separator: &str,
    max_len: Option<usize>,
) -> String {
    let mut stack = stack_token(stack_id);
    let mut logical = logical_id.to_string();

    let mut rng = rand::thread_rng();
    let rand_token: String = (0..RANDOM_SUFFIX_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect();

    if let Some(max_len) = max_len {
        let budget = max_len.saturating_sub(prefix.chars().count());
        let len_of_parts = budget.saturating_sub(RANDOM_SUFFIX_LEN + 2 * separator.chars().count());
        let stack_len = stack.chars().count();
        let logical_len = logical.chars().count();
        let natural = stack_len + logical_len;
        if natural > len_of_parts {
            // Split the deficit as evenly as possible. A side that cannot
            // absorb its half passes the remainder on to the other, so the
            // kept lengths always sum to exactly len_of_parts.
            let deficit = natural - len_of_parts;
            let keep_stack = stack_len.saturating_sub(deficit / 2).min(len_of_parts);
            let keep_logical = len_of_parts - keep_stack;
            truncate_chars(&mut stack, keep_stack);
            truncate_chars(&mut logical, keep_logical);
        }
    }

    format!("{prefix}{stack}{separator}{logical}{separator}{rand_token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const STACK_ID: &str = "arn:aws:cloudformation:us-west-2:123:stack/my-stack/guid";

    fn assert_suffix_shape(id: &str) {
        let suffix = &id[id.len() - RANDOM_SUFFIX_LEN..];
        assert!(
            suffix.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()),
            "bad suffix in {id}"
        );
    }

    #[test]
    fn unconstrained_id_matches_expected_structure() {
        let id = generate_unique_id(STACK_ID, "MyResource", "", "-", None);
        assert!(id.starts_with("mystack-MyResource-"), "got {id}");
        assert_eq!(id.len(), "mystack-MyResource-".len() + RANDOM_SUFFIX_LEN);
        assert_suffix_shape(&id);
    }

    #[test]
    fn two_calls_differ_only_in_the_random_suffix() {
        let a = generate_unique_id(STACK_ID, "MyResource", "", "-", None);
        let b = generate_unique_id(STACK_ID, "MyResource", "", "-", None);
        let cut = a.len() - RANDOM_SUFFIX_LEN;
        assert_eq!(a[..cut], b[..cut]);
    }

    #[test]
    fn prefix_is_prepended_verbatim() {
        let id = generate_unique_id(STACK_ID, "MyResource", "arn:example:", "-", None);
        assert!(id.starts_with("arn:example:mystack-MyResource-"), "got {id}");
    }

    #[test]
    fn stack_token_without_slash_uses_last_colon_segment() {
        let id = generate_unique_id("some:plain-name", "Res", "", "-", None);
        assert!(id.starts_with("plainname-Res-"), "got {id}");
    }

    #[test]
    fn truncation_fits_exactly_and_preserves_suffix() {
        let natural = generate_unique_id(STACK_ID, "MyVeryLongLogicalResourceId", "", "-", None).len();
        for max_len in (RANDOM_SUFFIX_LEN + 2)..natural {
            let id = generate_unique_id(STACK_ID, "MyVeryLongLogicalResourceId", "", "-", Some(max_len));
            assert_eq!(id.len(), max_len, "max_len={max_len} got {id}");
            assert_suffix_shape(&id);
            assert_eq!(id.matches('-').count(), 2, "separators lost in {id}");
        }
    }

    #[test]
    fn truncation_with_a_prefix_keeps_it_intact_and_fits_exactly() {
        let prefix = "arn:example:";
        let logical = "MyVeryLongLogicalResourceId";
        let natural = generate_unique_id(STACK_ID, logical, prefix, "-", None).len();
        // Below prefix + separators + suffix the budget is exhausted by the
        // untouchable parts, so start the sweep where an exact fit is possible.
        for max_len in (prefix.len() + RANDOM_SUFFIX_LEN + 2)..natural {
            let id = generate_unique_id(STACK_ID, logical, prefix, "-", Some(max_len));
            assert_eq!(id.len(), max_len, "max_len={max_len} got {id}");
            assert!(id.starts_with(prefix), "prefix clipped in {id}");
            assert_suffix_shape(&id);
        }
    }

    #[test]
    fn truncation_shifts_deficit_when_stack_token_is_short() {
        // Stack token of one character: it cannot absorb half the deficit,
        // so the logical id takes the remainder and the total still fits.
        let logical = "AVeryLongLogicalResourceIdIndeedYesVeryLong";
        let id = generate_unique_id("arn:x:stack/s/guid", logical, "", "-", Some(34));
        assert_eq!(id.len(), 34, "got {id}");
        assert_suffix_shape(&id);
        assert!(id.starts_with("-AVeryLongLogicalRes"), "got {id}");
    }

    #[test]
    fn max_len_larger_than_natural_length_changes_nothing() {
        let id = generate_unique_id(STACK_ID, "MyResource", "", "-", Some(128));
        assert!(id.starts_with("mystack-MyResource-"), "got {id}");
    }
}
